//! Termination strategies for deliberations.
//!
//! A strategy is a predicate over [`DeliberationState`] producing a
//! [`TerminationDecision`]. Cheap bounded strategies live here; the
//! agent- and workflow-judge strategies live in the application layer
//! and implement the same trait. [`CompositeTermination`] combines
//! children under `Any` (short-circuit, insertion order) or `All`
//! semantics.

mod bounds;
mod composite;
mod convergence;
mod custom;

pub use bounds::{MaxRounds, MaxTime, MaxTokens};
pub use composite::{CompositeMode, CompositeTermination};
pub use convergence::ConvergenceTermination;
pub use custom::CustomTermination;

use crate::deliberation::DeliberationState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Why a deliberation terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    MaxRoundsReached,
    MaxTokensReached,
    MaxTimeReached,
    ConvergenceAchieved,
    CustomCondition,
    AgentDecision,
    WorkflowDecision,
    /// Composite `All` mode: every child fired
    AllConditionsMet,
    /// Caller-driven cancellation
    ManualStop,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::MaxRoundsReached => "max rounds reached",
            TerminationReason::MaxTokensReached => "max tokens reached",
            TerminationReason::MaxTimeReached => "max time reached",
            TerminationReason::ConvergenceAchieved => "convergence achieved",
            TerminationReason::CustomCondition => "custom condition",
            TerminationReason::AgentDecision => "agent decision",
            TerminationReason::WorkflowDecision => "workflow decision",
            TerminationReason::AllConditionsMet => "all conditions met",
            TerminationReason::ManualStop => "manual stop",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one termination check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationDecision {
    /// Whether the deliberation should stop now
    pub should_terminate: bool,
    /// Reason tag; present when terminating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<TerminationReason>,
    /// Human-readable explanation
    pub explanation: String,
    /// Confidence in [0, 1]; 1.0 for deterministic checks
    pub confidence: f64,
}

impl TerminationDecision {
    /// Keep deliberating
    pub fn proceed() -> Self {
        Self {
            should_terminate: false,
            reason: None,
            explanation: String::new(),
            confidence: 1.0,
        }
    }

    /// Stop with a deterministic reason (confidence 1.0)
    pub fn stop(reason: TerminationReason, explanation: impl Into<String>) -> Self {
        Self::stop_with_confidence(reason, explanation, 1.0)
    }

    /// Stop with an explicit confidence
    pub fn stop_with_confidence(
        reason: TerminationReason,
        explanation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            should_terminate: true,
            reason: Some(reason),
            explanation: explanation.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Predicate deciding whether a deliberation stops
#[async_trait]
pub trait TerminationStrategy: Send + Sync {
    /// Stable strategy name for logs and composite explanations
    fn name(&self) -> &'static str;

    /// Evaluate the predicate against the current state.
    ///
    /// Called at the top of the round loop, before the round counter
    /// advances, so bounded checks see the number of completed rounds.
    async fn check(&self, state: &DeliberationState) -> TerminationDecision;
}

#[cfg(test)]
pub(crate) fn test_state(rounds: u32) -> DeliberationState {
    use crate::deliberation::DeliberationMessage;

    let mut state = DeliberationState::new("task", vec!["a1".into()]);
    for round in 1..=rounds {
        state.advance_round();
        state.append(DeliberationMessage::new("a1", "A1", "position", round));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proceed_shape() {
        let d = TerminationDecision::proceed();
        assert!(!d.should_terminate);
        assert!(d.reason.is_none());
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_stop_confidence_clamped() {
        let d = TerminationDecision::stop_with_confidence(
            TerminationReason::AgentDecision,
            "judged done",
            1.3,
        );
        assert!(d.should_terminate);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            TerminationReason::MaxRoundsReached.to_string(),
            "max rounds reached"
        );
        assert_eq!(TerminationReason::ManualStop.to_string(), "manual stop");
    }
}
