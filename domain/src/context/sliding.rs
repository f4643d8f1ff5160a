//! Sliding-window projection.

use super::{ContextManager, ContextMetadata, ContextWindow, latest_round};
use crate::core::error::DomainError;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Configuration for [`SlidingWindowManager`]
#[derive(Debug, Clone)]
pub struct SlidingWindowConfig {
    /// Token budget for the projection
    pub max_tokens: Option<u64>,
    /// Message-count budget for the projection
    pub max_messages: Option<usize>,
    /// Always include round 1
    pub preserve_first_round: bool,
    /// Always include the latest two rounds
    pub preserve_latest_round: bool,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            max_messages: None,
            preserve_first_round: true,
            preserve_latest_round: true,
        }
    }
}

/// Projection that keeps the anchor rounds and fills by recency.
///
/// Round 1 (when preserved) and the latest two rounds (when preserved)
/// are always included, deduplicated by `(agent, round, timestamp)`.
/// Remaining messages are added in reverse chronological order while the
/// token and message budgets hold. The final list is sorted ascending by
/// `(round, timestamp)`, which makes the projection idempotent.
pub struct SlidingWindowManager {
    config: SlidingWindowConfig,
}

impl SlidingWindowManager {
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self { config }
    }
}

impl Default for SlidingWindowManager {
    fn default() -> Self {
        Self::new(SlidingWindowConfig::default())
    }
}

fn identity(message: &DeliberationMessage) -> (String, u32, u64) {
    (message.agent_id.clone(), message.round, message.timestamp_ms)
}

#[async_trait]
impl ContextManager for SlidingWindowManager {
    fn name(&self) -> &'static str {
        "sliding-window"
    }

    async fn project(
        &self,
        state: &DeliberationState,
        _agent_id: &str,
    ) -> Result<ContextWindow, DomainError> {
        let transcript = &state.transcript;
        if transcript.is_empty() {
            return Ok(ContextWindow::new(
                Vec::new(),
                None,
                0,
                ContextMetadata::default(),
            ));
        }

        let current = latest_round(state);
        let mut preserved_rounds: BTreeSet<u32> = BTreeSet::new();
        if self.config.preserve_first_round {
            preserved_rounds.insert(1);
        }
        if self.config.preserve_latest_round {
            preserved_rounds.insert(current);
            if current > 1 {
                preserved_rounds.insert(current - 1);
            }
        }

        let mut seen: BTreeSet<(String, u32, u64)> = BTreeSet::new();
        let mut retained: Vec<DeliberationMessage> = Vec::new();
        let mut tokens: u64 = 0;

        for message in transcript {
            if preserved_rounds.contains(&message.round) && seen.insert(identity(message)) {
                tokens += u64::from(message.effective_tokens());
                retained.push(message.clone());
            }
        }

        // Fill remaining capacity newest-first
        for message in transcript.iter().rev() {
            if seen.contains(&identity(message)) {
                continue;
            }
            if let Some(max) = self.config.max_messages
                && retained.len() >= max
            {
                break;
            }
            let cost = u64::from(message.effective_tokens());
            if let Some(budget) = self.config.max_tokens
                && tokens + cost > budget
            {
                continue;
            }
            seen.insert(identity(message));
            tokens += cost;
            retained.push(message.clone());
        }

        retained.sort_by_key(|m| (m.round, m.timestamp_ms));

        let metadata = ContextMetadata {
            dropped: transcript.len() - retained.len(),
            summarized: 0,
            masked: 0,
            rounds_preserved: preserved_rounds.into_iter().collect(),
        };
        Ok(ContextWindow::new(
            retained,
            None,
            transcript.len(),
            metadata,
        ))
    }
}
