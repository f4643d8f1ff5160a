//! Arbiter-scored convergence.

use super::ConvergenceCalculator;
use crate::arbiter::{Arbiter, ArbiterRequest};
use crate::core::error::DomainError;
use crate::deliberation::DeliberationState;
use crate::voting::parsing::parse_unit_score;
use async_trait::async_trait;
use std::sync::Arc;

/// Convergence judged by an arbiter model.
///
/// Sends the last two rounds of the transcript plus the task at
/// temperature 0.1 with a 10-token cap and parses a single number,
/// clamped to `[0, 1]` (0.5 on parse failure). Returns 0.0 before
/// round 2.
pub struct LlmConvergence {
    arbiter: Arc<dyn Arbiter>,
}

const CONVERGENCE_SYSTEM_PROMPT: &str = "You judge how much a group's positions converged \
between two discussion rounds. Reply with a single number between 0.0 (completely \
different) and 1.0 (identical positions). No other text.";

impl LlmConvergence {
    pub fn new(arbiter: Arc<dyn Arbiter>) -> Self {
        Self { arbiter }
    }

    fn prompt(state: &DeliberationState) -> String {
        let current = state.current_round;
        let mut prompt = format!("Task: {}\n", state.task);
        for round in [current - 1, current] {
            prompt.push_str(&format!("\nRound {}:\n", round));
            for message in state.messages_in_round(round) {
                prompt.push_str(&format!("[{}] {}\n", message.agent_name, message.content));
            }
        }
        prompt.push_str("\nHow converged are the positions? One number, 0.0 to 1.0.");
        prompt
    }
}

#[async_trait]
impl ConvergenceCalculator for LlmConvergence {
    async fn calculate(&self, state: &DeliberationState) -> Result<f64, DomainError> {
        if state.current_round < 2 {
            return Ok(0.0);
        }
        let reply = self
            .arbiter
            .respond(
                ArbiterRequest::new(Self::prompt(state))
                    .with_system_prompt(CONVERGENCE_SYSTEM_PROMPT)
                    .with_temperature(0.1)
                    .with_max_tokens(10),
            )
            .await?;
        Ok(parse_unit_score(&reply))
    }
}
