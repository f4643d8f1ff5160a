//! LLM-judged termination strategies.
//!
//! These live in the application layer because they invoke an agent or a
//! whole workflow, but they implement the domain's
//! [`TerminationStrategy`] trait and compose into the same composite as
//! the bounded checks. Register them after the cheap bounds so an
//! over-budget deliberation is not asked another LLM whether to stop.

use crate::agent::{Agent, SchemaHint};
use crate::prompts::DeliberationPrompts;
use crate::workflow::WorkflowExecutor;
use async_trait::async_trait;
use conclave_domain::deliberation::{DeliberationMessage, DeliberationState};
use conclave_domain::termination::{TerminationDecision, TerminationReason, TerminationStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Structured verdict produced by a judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationJudgement {
    pub should_terminate: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub key_points_resolved: Vec<String>,
    #[serde(default)]
    pub outstanding_issues: Vec<String>,
}

fn judgement_schema() -> SchemaHint {
    SchemaHint::new()
        .field("should_terminate", "boolean")
        .field("confidence", "number")
        .field("reasoning", "string")
        .field("key_points_resolved", "array of strings")
        .field("outstanding_issues", "array of strings")
}

/// Last two rounds of the transcript, for the judge prompt.
fn recent_messages(state: &DeliberationState) -> Vec<DeliberationMessage> {
    let current = state.current_round;
    let from = current.saturating_sub(1).max(1);
    state
        .transcript
        .iter()
        .filter(|m| m.round >= from)
        .cloned()
        .collect()
}

fn decide(
    parsed: Option<TerminationJudgement>,
    threshold: f64,
    reason: TerminationReason,
) -> TerminationDecision {
    match parsed {
        Some(judgement) if judgement.should_terminate && judgement.confidence >= threshold => {
            TerminationDecision::stop_with_confidence(
                reason,
                judgement.reasoning,
                judgement.confidence,
            )
        }
        Some(judgement) => {
            debug!(
                should_terminate = judgement.should_terminate,
                confidence = judgement.confidence,
                "judge did not meet the bar"
            );
            TerminationDecision::proceed()
        }
        None => TerminationDecision::proceed(),
    }
}

/// Terminate when a judge agent says so with enough confidence.
pub struct AgentTermination {
    agent: Arc<Agent>,
    prompt: Option<String>,
    confidence_threshold: f64,
}

impl AgentTermination {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            prompt: None,
            confidence_threshold: 0.7,
        }
    }

    /// Replace the default judge prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
impl TerminationStrategy for AgentTermination {
    fn name(&self) -> &'static str {
        "agent-judge"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        let prompt = self.prompt.clone().unwrap_or_else(|| {
            DeliberationPrompts::termination_judgement(&state.task, &recent_messages(state))
        });
        let response = self
            .agent
            .process_structured(&prompt, &judgement_schema(), None, &CancellationToken::new())
            .await;
        let parsed = response
            .structured
            .and_then(|value| serde_json::from_value::<TerminationJudgement>(value).ok());
        decide(parsed, self.confidence_threshold, TerminationReason::AgentDecision)
    }
}

/// Terminate when an entire judging workflow says so.
pub struct WorkflowTermination {
    workflow: Arc<WorkflowExecutor>,
    confidence_threshold: f64,
}

impl WorkflowTermination {
    pub fn new(workflow: Arc<WorkflowExecutor>) -> Self {
        Self {
            workflow,
            confidence_threshold: 0.7,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
impl TerminationStrategy for WorkflowTermination {
    fn name(&self) -> &'static str {
        "workflow-judge"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        let prompt =
            DeliberationPrompts::termination_judgement(&state.task, &recent_messages(state));
        let result = self
            .workflow
            .execute_structured::<TerminationJudgement>(
                &prompt,
                &judgement_schema(),
                &CancellationToken::new(),
            )
            .await;
        decide(
            result.value,
            self.confidence_threshold,
            TerminationReason::WorkflowDecision,
        )
    }
}
