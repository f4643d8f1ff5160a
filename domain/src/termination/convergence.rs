//! Convergence-based termination.

use super::{TerminationDecision, TerminationReason, TerminationStrategy};
use crate::deliberation::DeliberationState;
use async_trait::async_trait;

/// Terminate when the convergence score reaches a threshold.
///
/// Fires only when at least `min_rounds` rounds have completed AND the
/// most recent convergence evaluation reached the threshold. The score is
/// computed after each round, so the earliest possible stop is the check
/// following round `min_rounds`.
pub struct ConvergenceTermination {
    threshold: f64,
    min_rounds: u32,
}

impl ConvergenceTermination {
    /// Threshold with the default of two minimum rounds
    pub fn new(threshold: f64) -> Self {
        Self::with_min_rounds(threshold, 2)
    }

    pub fn with_min_rounds(threshold: f64, min_rounds: u32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            min_rounds,
        }
    }
}

#[async_trait]
impl TerminationStrategy for ConvergenceTermination {
    fn name(&self) -> &'static str {
        "convergence"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        if state.current_round < self.min_rounds {
            return TerminationDecision::proceed();
        }
        match state.convergence_score {
            Some(score) if score >= self.threshold => TerminationDecision::stop(
                TerminationReason::ConvergenceAchieved,
                format!(
                    "Convergence {:.3} reached threshold {:.3} after round {}",
                    score, self.threshold, state.current_round
                ),
            ),
            _ => TerminationDecision::proceed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_state;
    use super::*;

    #[tokio::test]
    async fn test_requires_min_rounds() {
        let mut state = test_state(1);
        state.convergence_score = Some(1.0);
        let decision = ConvergenceTermination::new(0.8).check(&state).await;
        assert!(!decision.should_terminate);
    }

    #[tokio::test]
    async fn test_fires_at_threshold() {
        let mut state = test_state(2);
        state.convergence_score = Some(0.85);
        let decision = ConvergenceTermination::new(0.8).check(&state).await;
        assert!(decision.should_terminate);
        assert_eq!(decision.reason, Some(TerminationReason::ConvergenceAchieved));
    }

    #[tokio::test]
    async fn test_no_score_means_proceed() {
        let state = test_state(5);
        let decision = ConvergenceTermination::new(0.8).check(&state).await;
        assert!(!decision.should_terminate);
    }

    #[tokio::test]
    async fn test_below_threshold_proceeds() {
        let mut state = test_state(4);
        state.convergence_score = Some(0.5);
        assert!(
            !ConvergenceTermination::new(0.8)
                .check(&state)
                .await
                .should_terminate
        );
    }
}
