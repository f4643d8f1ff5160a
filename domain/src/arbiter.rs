//! Arbiter capability port.
//!
//! Several policies (arbiter-backed voting strategies, LLM convergence,
//! LLM summarization in context managers) need a narrow "ask a model one
//! question, get text back" capability, distinct from the participating
//! agents. The port is declared here in the domain layer; the application
//! layer adapts its full provider port onto it.

use crate::core::error::DomainError;
use async_trait::async_trait;

/// A single arbiter request
#[derive(Debug, Clone, Default)]
pub struct ArbiterRequest {
    /// Optional system prompt framing the judgement
    pub system_prompt: Option<String>,
    /// The user-level prompt
    pub prompt: String,
    /// Sampling temperature; provider default when absent
    pub temperature: Option<f64>,
    /// Completion cap; provider default when absent
    pub max_tokens: Option<u32>,
}

impl ArbiterRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Capability used by strategies that judge or synthesize
#[async_trait]
pub trait Arbiter: Send + Sync {
    /// Send one request and return the model's text reply
    async fn respond(&self, request: ArbiterRequest) -> Result<String, DomainError>;
}
