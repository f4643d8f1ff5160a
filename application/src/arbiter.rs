//! Adapter from the provider port to the domain arbiter capability.

use crate::ports::llm::{CompletionOptions, LlmProvider};
use async_trait::async_trait;
use conclave_domain::arbiter::{Arbiter, ArbiterRequest};
use conclave_domain::core::error::DomainError;
use conclave_domain::message::Message;
use std::sync::Arc;

/// Exposes an [`LlmProvider`] as the narrow [`Arbiter`] capability used
/// by voting strategies, convergence scoring, and summarization.
pub struct ProviderArbiter {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
}

impl ProviderArbiter {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: None,
        }
    }

    /// Pin the arbiter to a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl Arbiter for ProviderArbiter {
    async fn respond(&self, request: ArbiterRequest) -> Result<String, DomainError> {
        let options = CompletionOptions {
            model: self.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            system_prompt: request.system_prompt.clone(),
            ..Default::default()
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = request.system_prompt {
            messages.push(Message::system(system_prompt));
        }
        messages.push(Message::user(request.prompt));

        self.provider
            .complete(&messages, &options)
            .await
            .map(|response| response.content)
            .map_err(|e| DomainError::Arbiter(e.to_string()))
    }
}
