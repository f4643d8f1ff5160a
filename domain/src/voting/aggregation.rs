//! Aggregation voting: combine every response into one answer.

use super::{AGGREGATION_AGENT_ID, VotingContext, VotingResult, VotingStrategy, numbered_responses};
use crate::arbiter::ArbiterRequest;
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Aggregation reconciliation.
///
/// With an arbiter: one call at temperature 0.3 combining all responses
/// into a single comprehensive answer (redundancy removed, nuance kept).
/// Without: a mechanical `[name]: response` concatenation separated by
/// `---`. Either way the winner carries the synthetic id `"aggregation"`
/// and consensus 1.0.
pub struct AggregationVoting;

const AGGREGATION_SYSTEM_PROMPT: &str = "You are combining several expert answers into one \
comprehensive response. Remove redundancy, keep every distinct point and nuance, and \
organize the result clearly.";

fn aggregation_prompt(task: &str, responses: &[AgentResponse]) -> String {
    format!(
        "Task:\n{}\n\nAnswers to combine:\n{}Produce the single combined answer.",
        task,
        numbered_responses(responses)
    )
}

fn mechanical_concat(responses: &[AgentResponse]) -> String {
    responses
        .iter()
        .map(|r| format!("[{}]: {}", r.agent_name, r.content))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl VotingStrategy for AggregationVoting {
    fn name(&self) -> &'static str {
        "aggregation"
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

        let content = match context.arbiter.as_ref() {
            Some(arbiter) => {
                arbiter
                    .respond(
                        ArbiterRequest::new(aggregation_prompt(task, responses))
                            .with_system_prompt(AGGREGATION_SYSTEM_PROMPT)
                            .with_temperature(0.3),
                    )
                    .await?
            }
            None => mechanical_concat(responses),
        };

        let tally: BTreeMap<String, f64> = responses
            .iter()
            .map(|r| (r.agent_id.clone(), 1.0))
            .collect();

        Ok(VotingResult {
            winning_content: content,
            winning_structured: None,
            winning_agent_id: AGGREGATION_AGENT_ID.to_string(),
            strategy: self.name().to_string(),
            tally,
            consensus_score: 1.0,
        })
    }
}
