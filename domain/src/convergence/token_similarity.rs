//! Jaccard token-overlap convergence.

use super::ConvergenceCalculator;
use crate::core::error::DomainError;
use crate::deliberation::DeliberationState;
use async_trait::async_trait;
use std::collections::HashSet;

/// Convergence as mean per-agent Jaccard similarity.
///
/// For each agent that spoke in both the current and the previous round,
/// compare the two messages by Jaccard overlap of their lowercased tokens
/// longer than 2 characters (split on whitespace and punctuation). The
/// score is the mean across those agents, 0.0 when no agent spoke in both
/// rounds or before round 2.
#[derive(Default)]
pub struct TokenSimilarityConvergence;

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\''))
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        // Two empty positions are identical
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[async_trait]
impl ConvergenceCalculator for TokenSimilarityConvergence {
    async fn calculate(&self, state: &DeliberationState) -> Result<f64, DomainError> {
        if state.current_round < 2 {
            return Ok(0.0);
        }
        let current = state.current_round;
        let previous = current - 1;

        let mut scores = Vec::new();
        for agent_id in &state.agent_ids {
            let (Some(now), Some(before)) = (
                state.message_of_in_round(agent_id, current),
                state.message_of_in_round(agent_id, previous),
            ) else {
                continue;
            };
            scores.push(jaccard(&tokenize(&now.content), &tokenize(&before.content)));
        }

        if scores.is_empty() {
            return Ok(0.0);
        }
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
