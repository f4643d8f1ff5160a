//! Composite termination over child strategies.

use super::{TerminationDecision, TerminationReason, TerminationStrategy};
use crate::deliberation::DeliberationState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Combination semantics for [`CompositeTermination`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// First terminating child wins; checked in insertion order and
    /// short-circuiting, so register cheap bounds before LLM judges
    #[default]
    Any,
    /// Terminate only when every child fires
    All,
}

/// A list of child strategies combined under a mode.
///
/// # Example
///
/// ```
/// use conclave_domain::termination::{
///     CompositeTermination, ConvergenceTermination, MaxRounds, MaxTokens,
/// };
///
/// let termination = CompositeTermination::any()
///     .with(MaxRounds(10))
///     .with(MaxTokens(100_000))
///     .with(ConvergenceTermination::new(0.85));
/// assert_eq!(termination.len(), 3);
/// ```
pub struct CompositeTermination {
    strategies: Vec<Arc<dyn TerminationStrategy>>,
    mode: CompositeMode,
}

impl CompositeTermination {
    pub fn new(mode: CompositeMode) -> Self {
        Self {
            strategies: Vec::new(),
            mode,
        }
    }

    /// Short-circuiting `Any` composite
    pub fn any() -> Self {
        Self::new(CompositeMode::Any)
    }

    /// `All` composite
    pub fn all() -> Self {
        Self::new(CompositeMode::All)
    }

    /// Append a child strategy; order matters in `Any` mode
    pub fn with(mut self, strategy: impl TerminationStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Append an already-shared child strategy
    pub fn with_shared(mut self, strategy: Arc<dyn TerminationStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }
}

#[async_trait]
impl TerminationStrategy for CompositeTermination {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        match self.mode {
            CompositeMode::Any => {
                for strategy in &self.strategies {
                    let decision = strategy.check(state).await;
                    if decision.should_terminate {
                        debug!(strategy = strategy.name(), "composite Any fired");
                        return decision;
                    }
                }
                TerminationDecision::proceed()
            }
            CompositeMode::All => {
                if self.strategies.is_empty() {
                    return TerminationDecision::proceed();
                }
                let mut fired = Vec::with_capacity(self.strategies.len());
                let mut min_confidence: f64 = 1.0;
                for strategy in &self.strategies {
                    let decision = strategy.check(state).await;
                    if !decision.should_terminate {
                        return TerminationDecision::proceed();
                    }
                    min_confidence = min_confidence.min(decision.confidence);
                    fired.push(format!(
                        "{}: {}",
                        strategy.name(),
                        decision
                            .reason
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "terminated".to_string())
                    ));
                }
                TerminationDecision::stop_with_confidence(
                    TerminationReason::AllConditionsMet,
                    format!("All conditions met ({})", fired.join("; ")),
                    min_confidence,
                )
            }
        }
    }
}
