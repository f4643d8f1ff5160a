//! Consensus voting: arbiter-synthesized unified answer plus a score.

use super::{CONSENSUS_AGENT_ID, VotingContext, VotingResult, VotingStrategy, numbered_responses, parsing};
use crate::arbiter::ArbiterRequest;
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Consensus reconciliation.
///
/// Two arbiter calls: the first synthesizes a unified response from the
/// numbered inputs (temperature 0.3), the second scores how well the
/// synthesis represents the originals on a 0.0-1.0 scale (temperature
/// 0.0; first parseable number, clamped, 0.5 on parse failure). The
/// winner carries the synthetic agent id `"consensus"`. Without an
/// arbiter, falls back to the first response with consensus `1/N`.
pub struct ConsensusVoting;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a consensus builder. Merge the candidate \
answers into one unified response that every contributor could endorse. Preserve points of \
agreement, resolve conflicts by the strength of the supporting reasoning, and do not \
introduce claims absent from the inputs.";

const SCORING_SYSTEM_PROMPT: &str = "You are scoring how faithfully a synthesis represents \
a set of source answers. Reply with a single number between 0.0 and 1.0.";

fn synthesis_prompt(task: &str, responses: &[AgentResponse]) -> String {
    format!(
        "Task:\n{}\n\nCandidate answers:\n{}Produce the unified consensus response.",
        task,
        numbered_responses(responses)
    )
}

fn scoring_prompt(synthesis: &str, responses: &[AgentResponse]) -> String {
    format!(
        "Source answers:\n{}Synthesis:\n{}\n\nHow well does the synthesis represent the \
         source answers? Reply with one number between 0.0 and 1.0.",
        numbered_responses(responses),
        synthesis
    )
}

#[async_trait]
impl VotingStrategy for ConsensusVoting {
    fn name(&self) -> &'static str {
        "consensus"
    }

    async fn vote(
        &self,
        task: &str,
        responses: &[AgentResponse],
        context: &VotingContext,
    ) -> Result<VotingResult, DomainError> {
        if responses.is_empty() {
            return Ok(VotingResult::empty(self.name()));
        }

        let Some(arbiter) = context.arbiter.as_ref() else {
            debug!("consensus without arbiter, falling back to first response");
            return Ok(VotingResult::from_winner(
                self.name(),
                &responses[0],
                1.0 / responses.len() as f64,
            ));
        };

        let synthesis = arbiter
            .respond(
                ArbiterRequest::new(synthesis_prompt(task, responses))
                    .with_system_prompt(SYNTHESIS_SYSTEM_PROMPT)
                    .with_temperature(0.3),
            )
            .await?;

        let score_reply = arbiter
            .respond(
                ArbiterRequest::new(scoring_prompt(&synthesis, responses))
                    .with_system_prompt(SCORING_SYSTEM_PROMPT)
                    .with_temperature(0.0),
            )
            .await?;
        let consensus = parsing::parse_unit_score(&score_reply);

        let tally: BTreeMap<String, f64> = responses
            .iter()
            .map(|r| (r.agent_id.clone(), 1.0))
            .collect();

        Ok(VotingResult {
            winning_content: synthesis,
            winning_structured: None,
            winning_agent_id: CONSENSUS_AGENT_ID.to_string(),
            strategy: self.name().to_string(),
            tally,
            consensus_score: consensus,
        })
    }
}
