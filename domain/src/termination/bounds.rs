//! Bounded termination: rounds, tokens, wall-clock time.

use super::{TerminationDecision, TerminationReason, TerminationStrategy};
use crate::deliberation::DeliberationState;
use async_trait::async_trait;
use std::time::Duration;

/// Terminate once `current_round >= n` completed rounds.
pub struct MaxRounds(pub u32);

#[async_trait]
impl TerminationStrategy for MaxRounds {
    fn name(&self) -> &'static str {
        "max-rounds"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        if state.current_round >= self.0 {
            TerminationDecision::stop(
                TerminationReason::MaxRoundsReached,
                format!("Completed {} of {} allowed rounds", state.current_round, self.0),
            )
        } else {
            TerminationDecision::proceed()
        }
    }
}

/// Terminate once `total_tokens_used >= n`.
pub struct MaxTokens(pub u64);

#[async_trait]
impl TerminationStrategy for MaxTokens {
    fn name(&self) -> &'static str {
        "max-tokens"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        if state.total_tokens_used >= self.0 {
            TerminationDecision::stop(
                TerminationReason::MaxTokensReached,
                format!(
                    "Used {} of {} budgeted tokens",
                    state.total_tokens_used, self.0
                ),
            )
        } else {
            TerminationDecision::proceed()
        }
    }
}

/// Terminate once elapsed wall-clock time reaches the budget.
///
/// A round in progress always completes; the predicate fires at the next
/// check.
pub struct MaxTime(pub Duration);

#[async_trait]
impl TerminationStrategy for MaxTime {
    fn name(&self) -> &'static str {
        "max-time"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        let elapsed = state.elapsed();
        if elapsed >= self.0 {
            TerminationDecision::stop(
                TerminationReason::MaxTimeReached,
                format!("Elapsed {:?} of {:?} budgeted", elapsed, self.0),
            )
        } else {
            TerminationDecision::proceed()
        }
    }
}
