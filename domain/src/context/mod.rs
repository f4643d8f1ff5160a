//! Context-window managers.
//!
//! A manager projects the full deliberation transcript down to a bounded
//! [`ContextWindow`] for one recipient agent in one round. Five policies
//! are provided:
//!
//! | Manager | Approach |
//! |---------|----------|
//! | [`SlidingWindowManager`] | keep first/latest rounds, greedy recency fill |
//! | [`RecursiveSummarizationManager`] | summarize old rounds incrementally |
//! | [`HierarchicalManager`] | phase summaries plus a global overview |
//! | [`ObservationMaskingManager`] | mask verbose or matching messages |
//! | [`HybridManager`] | auto-select a pipeline by compression factor |

mod hierarchical;
mod hybrid;
mod masking;
mod recursive;
mod sliding;

pub use hierarchical::{HierarchicalConfig, HierarchicalManager, PhaseNaming};
pub use hybrid::{HybridConfig, HybridManager};
pub use masking::{MaskingConfig, MaskingStrategy, ObservationMaskingManager};
pub use recursive::{RecursiveSummarizationConfig, RecursiveSummarizationManager};
pub use sliding::{SlidingWindowConfig, SlidingWindowManager};

use crate::core::error::DomainError;
use crate::core::tokens::estimate_tokens;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Bookkeeping about what a projection did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Messages dropped outright
    pub dropped: usize,
    /// Messages folded into summaries
    pub summarized: usize,
    /// Messages whose content was masked
    pub masked: usize,
    /// Rounds retained verbatim
    pub rounds_preserved: Vec<u32>,
}

/// A bounded projection of the transcript for one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    /// The projected messages, ascending (round, timestamp)
    pub messages: Vec<DeliberationMessage>,
    /// Summary of material not retained verbatim, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Estimated tokens of the projection (messages plus summary)
    pub estimated_tokens: u64,
    /// Transcript size the projection was computed from
    pub original_count: usize,
    /// Number of messages retained
    pub retained_count: usize,
    /// What the projection did
    pub metadata: ContextMetadata,
}

impl ContextWindow {
    /// Build a window from projected messages, computing token totals.
    pub fn new(
        messages: Vec<DeliberationMessage>,
        summary: Option<String>,
        original_count: usize,
        metadata: ContextMetadata,
    ) -> Self {
        let mut estimated_tokens: u64 = messages
            .iter()
            .map(|m| u64::from(m.effective_tokens()))
            .sum();
        if let Some(summary) = &summary {
            estimated_tokens += u64::from(estimate_tokens(summary));
        }
        let retained_count = messages.len();
        Self {
            messages,
            summary,
            estimated_tokens,
            original_count,
            retained_count,
            metadata,
        }
    }

    /// Fraction of the original transcript no longer retained verbatim
    pub fn compression_ratio(&self) -> f64 {
        if self.original_count == 0 {
            return 0.0;
        }
        1.0 - self.retained_count as f64 / self.original_count as f64
    }
}

/// Projects the transcript to a bounded window for one agent per round
#[async_trait]
pub trait ContextManager: Send + Sync {
    /// Stable manager name for logs
    fn name(&self) -> &'static str;

    /// Project the transcript for the given recipient agent
    async fn project(
        &self,
        state: &DeliberationState,
        agent_id: &str,
    ) -> Result<ContextWindow, DomainError>;
}

/// Latest round of the deliberation: the round counter or the newest
/// transcript round, whichever is ahead.
pub(crate) fn latest_round(state: &DeliberationState) -> u32 {
    state
        .transcript
        .iter()
        .map(|m| m.round)
        .max()
        .unwrap_or(0)
        .max(state.current_round)
        .max(1)
}

#[cfg(test)]
pub(crate) fn test_transcript(rounds: u32, agents: &[&str]) -> DeliberationState {
    let mut state =
        DeliberationState::new("task", agents.iter().map(|a| a.to_string()).collect());
    for round in 1..=rounds {
        state.advance_round();
        for agent in agents {
            state.append(DeliberationMessage::new(
                *agent,
                agent.to_uppercase(),
                format!("{} position in round {}", agent, round),
                round,
            ));
        }
    }
    state
}
