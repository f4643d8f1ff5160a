//! Convergence calculators.
//!
//! Both implementations share one contract: score how similar this
//! round's agent positions are to the previous round's, in `[0, 1]`.
//! The executor only invokes a calculator after the current round has
//! been fully appended to the transcript.

mod llm;
mod token_similarity;

pub use llm::LlmConvergence;
pub use token_similarity::TokenSimilarityConvergence;

use crate::core::error::DomainError;
use crate::deliberation::DeliberationState;
use async_trait::async_trait;

/// Scores positional similarity between consecutive rounds
#[async_trait]
pub trait ConvergenceCalculator: Send + Sync {
    /// Score the current round against the previous one.
    ///
    /// Returns 0.0 before round 2 (there is nothing to compare).
    async fn calculate(&self, state: &DeliberationState) -> Result<f64, DomainError>;
}
