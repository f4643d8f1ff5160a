//! Majority voting: bucket identical answers, largest bucket wins.

use super::{VotingContext, VotingResult, VotingStrategy};
use crate::core::error::DomainError;
use crate::response::AgentResponse;
use crate::util::truncate_chars;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Majority reconciliation.
///
/// Responses are bucketed by a normalized key: lowercased, trimmed,
/// truncated to the first 100 characters, then hashed. The winner is the
/// bucket with the largest count; ties resolve to the bucket encountered
/// first. Consensus is `winner_count / N`.
pub struct MajorityVoting;

/// Normalized bucket key for a response text.
pub(crate) fn bucket_key(content: &str) -> String {
    let normalized = content.trim().to_lowercase();
    let truncated = truncate_chars(&normalized, 100);
    let mut hasher = DefaultHasher::new();
    truncated.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[async_trait]
impl VotingStrategy for MajorityVoting {
    fn name(&self) -> &'static str {
        "majority"
    }

    async fn vote(
        &self,
        _task: &str,
        responses: &[AgentResponse],
        _context: &VotingContext,
    ) -> Result<VotingResult, DomainError> {
        if responses.is_empty() {
            return Ok(VotingResult::empty(self.name()));
        }

        // Insertion-ordered buckets so ties resolve to first encountered
        let mut order: Vec<String> = Vec::new();
        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        let mut representatives: BTreeMap<String, &AgentResponse> = BTreeMap::new();

        for response in responses {
            let key = bucket_key(&response.content);
            if !counts.contains_key(&key) {
                order.push(key.clone());
                representatives.insert(key.clone(), response);
            }
            *counts.entry(key).or_insert(0.0) += 1.0;
        }

        // Strict > keeps the first-encountered bucket on ties
        let mut winner_key = &order[0];
        for key in &order[1..] {
            if counts[key] > counts[winner_key] {
                winner_key = key;
            }
        }

        let winner = representatives[winner_key];
        let consensus = counts[winner_key] / responses.len() as f64;

        Ok(VotingResult::from_winner(self.name(), winner, consensus).with_tally(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_response as response;
    use super::*;

    #[tokio::test]
    async fn test_empty_responses() {
        let result = MajorityVoting
            .vote("t", &[], &VotingContext::new())
            .await
            .unwrap();
        assert_eq!(result.consensus_score, 0.0);
        assert!(result.winning_content.is_empty());
    }

    #[tokio::test]
    async fn test_two_to_one() {
        // Scenario E1: two "yes", one "no"
        let responses = vec![
            response("a1", "yes"),
            response("a2", "yes"),
            response("a3", "no"),
        ];
        let result = MajorityVoting
            .vote("t", &responses, &VotingContext::new())
            .await
            .unwrap();

        assert_eq!(result.winning_content, "yes");
        assert_eq!(result.winning_agent_id, "a1");
        assert!((result.consensus_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.tally.len(), 2);
    }

    #[tokio::test]
    async fn test_consensus_times_n_is_winner_count() {
        let responses = vec![
            response("a1", "alpha"),
            response("a2", "alpha"),
            response("a3", "beta"),
            response("a4", "alpha"),
        ];
        let result = MajorityVoting
            .vote("t", &responses, &VotingContext::new())
            .await
            .unwrap();
        let count = result.consensus_score * responses.len() as f64;
        assert!((count - count.round()).abs() < 1e-9);
        assert_eq!(count.round() as usize, 3);
    }

    #[tokio::test]
    async fn test_tie_resolves_by_insertion_order() {
        let responses = vec![response("a1", "first"), response("a2", "second")];
        let result = MajorityVoting
            .vote("t", &responses, &VotingContext::new())
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a1");
    }

    #[tokio::test]
    async fn test_normalization_merges_case_and_whitespace() {
        let responses = vec![
            response("a1", "  Yes "),
            response("a2", "yes"),
            response("a3", "no"),
        ];
        let result = MajorityVoting
            .vote("t", &responses, &VotingContext::new())
            .await
            .unwrap();
        assert_eq!(result.winning_agent_id, "a1");
        assert_eq!(result.tally.len(), 2);
    }

    #[test]
    fn test_bucket_key_truncates_at_100_chars() {
        let base = "x".repeat(100);
        let longer = format!("{}{}", base, "different tail");
        assert_eq!(bucket_key(&base), bucket_key(&longer));
    }
}
