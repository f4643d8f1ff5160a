//! Weighted voting: majority buckets scaled by agent weight and confidence.

use super::majority::bucket_key;
use super::{VotingContext, VotingResult, VotingStrategy};
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Weighted reconciliation.
///
/// Each response contributes `weight(agent) x confidence(agent)` to its
/// bucket (both defaulting to 1.0). The winner is the bucket with the
/// largest weighted score; consensus is `winner_score / sum_of_weights`.
/// With uniform weights and confidences this reduces to majority voting.
pub struct WeightedVoting;

/// Core of the weighted tally, parameterized on the confidence default so
/// the expert-panel fallback (default 0.5) can reuse it.
pub(crate) fn weighted_tally(
    responses: &[AgentResponse],
    context: &VotingContext,
    default_confidence: f64,
) -> (Vec<String>, BTreeMap<String, f64>, BTreeMap<String, usize>) {
    let mut order: Vec<String> = Vec::new();
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut representatives: BTreeMap<String, usize> = BTreeMap::new();

    for (idx, response) in responses.iter().enumerate() {
        let key = bucket_key(&response.content);
        let weight = context.weight_of(&response.agent_id);
        let confidence = response.confidence.unwrap_or(default_confidence);
        if !scores.contains_key(&key) {
            order.push(key.clone());
            representatives.insert(key.clone(), idx);
        }
        *scores.entry(key).or_insert(0.0) += weight * confidence;
    }

    (order, scores, representatives)
}

pub(crate) fn pick_winner<'a>(order: &'a [String], scores: &BTreeMap<String, f64>) -> &'a String {
    let mut winner = &order[0];
    for key in &order[1..] {
        if scores[key] > scores[winner] {
            winner = key;
        }
    }
    winner
}

#[async_trait]
impl VotingStrategy for WeightedVoting {
    fn name(&self) -> &'static str {
        "weighted"
    }

    async fn vote(
        &self,
        _task: &str,
        responses: &[AgentResponse],
        context: &VotingContext,
    ) -> Result<VotingResult, DomainError> {
        if responses.is_empty() {
            return Ok(VotingResult::empty(self.name()));
        }

        let (order, scores, representatives) = weighted_tally(responses, context, 1.0);
        let winner_key = pick_winner(&order, &scores);
        let winner = &responses[representatives[winner_key]];

        let total_weight: f64 = responses
            .iter()
            .map(|r| context.weight_of(&r.agent_id))
            .sum();
        let consensus = if total_weight > 0.0 {
            scores[winner_key] / total_weight
        } else {
            0.0
        };

        Ok(VotingResult::from_winner(self.name(), winner, consensus).with_tally(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_response as response;
    use super::*;

    #[tokio::test]
    async fn test_expert_weight_promotes_minority() {
        // Scenario E2: one heavily weighted expert beats two novices
        let responses = vec![
            response("expert", "A"),
            response("novice1", "B"),
            response("novice2", "B"),
        ];
        let context = VotingContext::new()
            .with_weight("expert", 3.0)
            .with_weight("novice1", 1.0)
            .with_weight("novice2", 1.0);

        let result = WeightedVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(result.winning_content, "A");
        assert_eq!(result.winning_agent_id, "expert");
        // 3 / (3 + 1 + 1)
        assert!((result.consensus_score - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_uniform_weights_match_majority() {
        let responses = vec![
            response("a1", "yes"),
            response("a2", "yes"),
            response("a3", "no"),
        ];
        let context = VotingContext::new();

        let weighted = WeightedVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        let majority = super::super::MajorityVoting
            .vote("t", &responses, &context)
            .await
            .unwrap();
        assert_eq!(weighted.winning_content, majority.winning_content);
        assert_eq!(weighted.winning_agent_id, majority.winning_agent_id);
    }

    #[tokio::test]
    async fn test_confidence_scales_contribution() {
        let mut confident = response("a1", "A");
        confident.confidence = Some(1.0);
        let mut hesitant1 = response("a2", "B");
        hesitant1.confidence = Some(0.3);
        let mut hesitant2 = response("a3", "B");
        hesitant2.confidence = Some(0.3);

        let result = WeightedVoting
            .vote("t", &[confident, hesitant1, hesitant2], &VotingContext::new())
            .await
            .unwrap();
        // 1.0 beats 0.6
        assert_eq!(result.winning_content, "A");
    }

    #[tokio::test]
    async fn test_empty() {
        let result = WeightedVoting
            .vote("t", &[], &VotingContext::new())
            .await
            .unwrap();
        assert_eq!(result.consensus_score, 0.0);
    }
}
