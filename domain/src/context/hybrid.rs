//! Hybrid auto-selecting projection.

use super::masking::{MaskingConfig, ObservationMaskingManager};
use super::recursive::{RecursiveSummarizationConfig, RecursiveSummarizationManager};
use super::sliding::{SlidingWindowConfig, SlidingWindowManager};
use super::{ContextManager, ContextWindow, latest_round};
use crate::arbiter::Arbiter;
use crate::core::error::DomainError;
use crate::deliberation::{DeliberationMessage, DeliberationState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Configuration for [`HybridManager`]
#[derive(Debug, Clone)]
pub struct HybridConfig {
    /// Token budget the projection must meet
    pub max_tokens: u64,
    /// Settings for the sliding stage
    pub sliding: SlidingWindowConfig,
    /// Settings for the masking stage
    pub masking: MaskingConfig,
    /// Settings for the summarization stage; `None` disables it
    pub recursive: Option<RecursiveSummarizationConfig>,
}

impl HybridConfig {
    pub fn new(max_tokens: u64) -> Self {
        Self {
            max_tokens,
            sliding: SlidingWindowConfig {
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
            masking: MaskingConfig::default(),
            recursive: Some(RecursiveSummarizationConfig {
                max_tokens: Some(max_tokens),
                ..Default::default()
            }),
        }
    }
}

/// Projection that composes sliding, masking, and summarization by need.
///
/// The compression factor is `transcript_tokens / budget`:
///
/// - factor <= 1.5: sliding only
/// - factor <= 2.5: masking, then sliding
/// - beyond that, when more than 5 rounds exist and summarization is
///   available: masking, then recursive summarization
/// - otherwise the full pipeline (masking, recursive, sliding),
///   short-circuiting as soon as an intermediate projection fits
pub struct HybridManager {
    budget: u64,
    sliding: SlidingWindowManager,
    masking: ObservationMaskingManager,
    recursive: Option<RecursiveSummarizationManager>,
}

impl HybridManager {
    pub fn new(arbiter: Option<Arc<dyn Arbiter>>, config: HybridConfig) -> Result<Self, DomainError> {
        let masking = ObservationMaskingManager::new(arbiter.clone(), config.masking)?;
        let recursive = config
            .recursive
            .map(|cfg| RecursiveSummarizationManager::new(arbiter, cfg));
        Ok(Self {
            budget: config.max_tokens.max(1),
            sliding: SlidingWindowManager::new(config.sliding),
            masking,
            recursive,
        })
    }

    /// Re-root a state on an intermediate projection so the next stage
    /// sees the previous stage's output as its transcript.
    fn restate(state: &DeliberationState, messages: &[DeliberationMessage]) -> DeliberationState {
        let mut intermediate = DeliberationState::new(state.task.clone(), state.agent_ids.clone());
        intermediate.current_round = state.current_round;
        for message in messages {
            intermediate.append(message.clone());
        }
        intermediate
    }

    /// Restore bookkeeping accumulated across chained stages.
    fn finalize(
        mut window: ContextWindow,
        original: usize,
        masked: usize,
        summarized: usize,
    ) -> ContextWindow {
        window.original_count = original;
        window.retained_count = window.messages.len();
        window.metadata.masked += masked;
        window.metadata.summarized += summarized;
        window.metadata.dropped = original.saturating_sub(window.messages.len());
        window
    }
}

#[async_trait]
impl ContextManager for HybridManager {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn project(
        &self,
        state: &DeliberationState,
        agent_id: &str,
    ) -> Result<ContextWindow, DomainError> {
        let original = state.transcript.len();
        let current_tokens: u64 = state
            .transcript
            .iter()
            .map(|m| u64::from(m.effective_tokens()))
            .sum();
        let factor = current_tokens as f64 / self.budget as f64;
        debug!(factor, tokens = current_tokens, budget = self.budget, "hybrid selection");

        if factor <= 1.5 {
            return self.sliding.project(state, agent_id).await;
        }

        // Every heavier pipeline starts by masking
        let masked_window = self.masking.project(state, agent_id).await?;
        let masked_count = masked_window.metadata.masked;
        let masked_state = Self::restate(state, &masked_window.messages);

        if factor <= 2.5 {
            let window = self.sliding.project(&masked_state, agent_id).await?;
            return Ok(Self::finalize(window, original, masked_count, 0));
        }

        if latest_round(state) > 5
            && let Some(recursive) = self.recursive.as_ref()
        {
            let window = recursive.project(&masked_state, agent_id).await?;
            return Ok(Self::finalize(window, original, masked_count, 0));
        }

        // Full pipeline with short-circuiting
        if masked_window.estimated_tokens <= self.budget {
            return Ok(masked_window);
        }
        let mut stage_state = masked_state;
        let mut summarized = 0usize;
        if let Some(recursive) = self.recursive.as_ref() {
            let window = recursive.project(&stage_state, agent_id).await?;
            summarized = window.metadata.summarized;
            if window.estimated_tokens <= self.budget {
                return Ok(Self::finalize(window, original, masked_count, 0));
            }
            stage_state = Self::restate(&stage_state, &window.messages);
        }
        let window = self.sliding.project(&stage_state, agent_id).await?;
        Ok(Self::finalize(window, original, masked_count, summarized))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_transcript;
    use super::*;

    fn manager(budget: u64) -> HybridManager {
        HybridManager::new(None, HybridConfig::new(budget)).unwrap()
    }

    fn transcript_tokens(state: &DeliberationState) -> u64 {
        state
            .transcript
            .iter()
            .map(|m| u64::from(m.effective_tokens()))
            .sum()
    }

    #[tokio::test]
    async fn test_light_load_uses_sliding_only() {
        let state = test_transcript(3, &["a1", "a2"]);
        let budget = transcript_tokens(&state); // factor 1.0
        let window = manager(budget).project(&state, "a1").await.unwrap();
        // Sliding keeps everything under budget, nothing masked
        assert_eq!(window.metadata.masked, 0);
        assert_eq!(window.retained_count, 6);
    }

    #[tokio::test]
    async fn test_moderate_load_masks_then_slides() {
        let mut state = test_transcript(2, &["a1", "a2"]);
        // An old verbose message pushes the factor past 1.5
        state.current_round = 5;
        let verbose = DeliberationMessage::new("a2", "A2", "words repeat. ".repeat(60), 1);
        state.append(verbose);
        let budget = transcript_tokens(&state) / 2; // factor 2.0

        let window = manager(budget).project(&state, "a1").await.unwrap();
        assert_eq!(window.metadata.masked, 1);
        assert!(
            window
                .messages
                .iter()
                .any(|m| m.content.ends_with(" [truncated]"))
        );
    }

    #[tokio::test]
    async fn test_heavy_load_many_rounds_summarizes() {
        let state = test_transcript(8, &["a1", "a2"]);
        let budget = transcript_tokens(&state) / 4; // factor 4.0, rounds > 5
        let window = manager(budget).project(&state, "a1").await.unwrap();
        // Recursive stage produced a summary of the old rounds
        assert!(window.summary.is_some());
    }

    #[tokio::test]
    async fn test_heavy_load_few_rounds_runs_full_pipeline() {
        let mut state = test_transcript(3, &["a1", "a2"]);
        state.current_round = 4;
        for _ in 0..4 {
            let verbose =
                DeliberationMessage::new("a2", "A2", "longwinded filler. ".repeat(50), 1);
            state.append(verbose);
        }
        let budget = transcript_tokens(&state) / 4; // factor 4.0, rounds <= 5

        let window = manager(budget).project(&state, "a1").await.unwrap();
        // Masking plus downstream stages engaged
        assert!(window.metadata.masked >= 4);
        assert!(window.original_count == state.transcript.len());
    }

    #[tokio::test]
    async fn test_without_recursive_falls_back_to_sliding() {
        let state = test_transcript(8, &["a1"]);
        let budget = transcript_tokens(&state) / 4;
        let mut config = HybridConfig::new(budget);
        config.recursive = None;
        let manager = HybridManager::new(None, config).unwrap();

        let window = manager.project(&state, "a1").await.unwrap();
        assert!(window.summary.is_none());
        assert!(window.estimated_tokens <= budget || window.retained_count <= 3);
    }
}
