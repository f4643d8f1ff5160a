//! Caller-supplied termination predicates.

use super::{TerminationDecision, TerminationReason, TerminationStrategy};
use crate::deliberation::DeliberationState;
use async_trait::async_trait;
use futures::future::BoxFuture;

type AsyncPredicate =
    Box<dyn for<'a> Fn(&'a DeliberationState) -> BoxFuture<'a, bool> + Send + Sync>;

/// Terminate when a caller-supplied predicate holds.
///
/// Accepts either a synchronous closure or an async one producing a boxed
/// future. The description appears in the decision explanation.
pub struct CustomTermination {
    predicate: AsyncPredicate,
    description: String,
}

impl CustomTermination {
    /// Synchronous predicate
    pub fn new<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: Fn(&DeliberationState) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(move |state| {
                let result = predicate(state);
                Box::pin(async move { result })
            }),
            description: description.into(),
        }
    }

    /// Async predicate
    pub fn new_async<F>(predicate: F, description: impl Into<String>) -> Self
    where
        F: for<'a> Fn(&'a DeliberationState) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            description: description.into(),
        }
    }
}

#[async_trait]
impl TerminationStrategy for CustomTermination {
    fn name(&self) -> &'static str {
        "custom"
    }

    async fn check(&self, state: &DeliberationState) -> TerminationDecision {
        if (self.predicate)(state).await {
            TerminationDecision::stop(
                TerminationReason::CustomCondition,
                format!("Custom condition met: {}", self.description),
            )
        } else {
            TerminationDecision::proceed()
        }
    }
}
