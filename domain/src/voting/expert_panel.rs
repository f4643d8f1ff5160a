//! Expert-panel voting: five-axis arbiter scoring per response.

use super::weighted::{pick_winner, weighted_tally};
use super::{VotingContext, VotingResult, VotingStrategy, parsing};
use crate::arbiter::ArbiterRequest;
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Expert-panel reconciliation.
///
/// Each response is evaluated independently: the arbiter (temperature 0.1)
/// is asked for five numbers in `[0, 1]` covering accuracy, completeness,
/// clarity, relevance, and insight. An agent's score is the mean of the
/// parsed numbers, or 0.5 when none parse. The highest score wins and the
/// consensus equals the winner's raw mean. Tally values are
/// `round(100 x score / max_score)`.
///
/// Without an arbiter, falls back to a weighted tally at default
/// confidence 0.5.
pub struct ExpertPanelVoting;

const PANEL_SYSTEM_PROMPT: &str = "You are one evaluator on an expert panel. Score the \
answer on five criteria, each between 0.0 and 1.0: accuracy, completeness, clarity, \
relevance, insight. Reply with the five numbers only.";

fn evaluation_prompt(task: &str, response: &AgentResponse) -> String {
    format!(
        "Task:\n{}\n\nAnswer under evaluation:\n{}\n\nScore it: accuracy, completeness, \
         clarity, relevance, insight. Five numbers between 0.0 and 1.0.",
        task, response.content
    )
}

#[async_trait]
impl VotingStrategy for ExpertPanelVoting {
    fn name(&self) -> &'static str {
        "expert-panel"
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
            debug!("expert panel without arbiter, falling back to weighted tally");
            let (order, scores, representatives) = weighted_tally(responses, context, 0.5);
            let winner_key = pick_winner(&order, &scores);
            let winner = &responses[representatives[winner_key]];
            let total: f64 = scores.values().sum();
            let consensus = if total > 0.0 { scores[winner_key] / total } else { 0.0 };
            return Ok(
                VotingResult::from_winner(self.name(), winner, consensus).with_tally(scores)
            );
        };

        let mut panel_scores: Vec<f64> = Vec::with_capacity(responses.len());
        for response in responses {
            let reply = arbiter
                .respond(
                    ArbiterRequest::new(evaluation_prompt(task, response))
                        .with_system_prompt(PANEL_SYSTEM_PROMPT)
                        .with_temperature(0.1),
                )
                .await?;
            let parsed = parsing::parse_unit_scores(&reply);
            let score = if parsed.is_empty() {
                0.5
            } else {
                parsed.iter().sum::<f64>() / parsed.len() as f64
            };
            panel_scores.push(score);
        }

        let mut winner_idx = 0usize;
        for (idx, score) in panel_scores.iter().enumerate() {
            if *score > panel_scores[winner_idx] {
                winner_idx = idx;
            }
        }
        let max_score = panel_scores[winner_idx];

        let tally: BTreeMap<String, f64> = responses
            .iter()
            .zip(&panel_scores)
            .map(|(r, score)| {
                let scaled = if max_score > 0.0 {
                    (100.0 * score / max_score).round()
                } else {
                    0.0
                };
                (r.agent_id.clone(), scaled)
            })
            .collect();

        Ok(
            VotingResult::from_winner(self.name(), &responses[winner_idx], max_score)
                .with_tally(tally),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_response as response;
    use super::*;
    use crate::arbiter::testing::ScriptedArbiter;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_highest_mean_wins() {
        let responses = vec![response("a1", "weak"), response("a2", "strong")];
        // First evaluation averages 0.4, second averages 0.9
        let context = VotingContext::new().with_arbiter(Arc::new(ScriptedArbiter::new([
            "0.4 0.4 0.4 0.4 0.4",
            "0.9 0.9 0.9 0.9 0.9",
        ])));

        let result = ExpertPanelVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a2");
        assert!((result.consensus_score - 0.9).abs() < 1e-9);
        // Tally scaled to the winner's 100
        assert_eq!(result.tally["a2"], 100.0);
        assert_eq!(result.tally["a1"], 44.0);
    }

    #[tokio::test]
    async fn test_unparseable_evaluation_scores_half() {
        let responses = vec![response("a1", "x"), response("a2", "y")];
        let context = VotingContext::new().with_arbiter(Arc::new(ScriptedArbiter::new([
            "no numbers here",
            "0.6 0.6 0.6 0.6 0.6",
        ])));
        let result = ExpertPanelVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a2");
        assert!((result.consensus_score - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fallback_uses_weight_times_default_confidence() {
        let responses = vec![response("expert", "A"), response("novice", "B")];
        let context = VotingContext::new().with_weight("expert", 3.0);
        let result = ExpertPanelVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        // 3.0 x 0.5 beats 1.0 x 0.5
        assert_eq!(result.winning_agent_id, "expert");
        assert_eq!(result.strategy, "expert-panel");
    }
}
