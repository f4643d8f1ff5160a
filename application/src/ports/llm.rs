//! LLM provider port.
//!
//! Defines the interface every vendor adapter implements. The engine
//! treats a provider as three operations over role-tagged messages:
//! plain completion, tool-capable completion, and streaming.

use async_trait::async_trait;
use conclave_domain::message::{Message, ToolCall};
use conclave_domain::response::TokenUsage;
use conclave_domain::tool::ToolSpec;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by provider adapters
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// HTTP status class (4 or 5) when the error carries one
    pub fn status_class(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(status / 100),
            _ => None,
        }
    }
}

/// Options for one completion request.
///
/// Every omitted field means "provider default".
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub stop_sequences: Vec<String>,
    pub system_prompt: Option<String>,
    pub response_format: Option<String>,
}

/// One completion reply.
///
/// `content` may be empty while `tool_calls` is populated.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub model_id: Option<String>,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Handle for consuming a streaming completion.
///
/// Wraps an `mpsc::Receiver` of text deltas and offers a convenience for
/// callers that only need the final text.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<String>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Drain the stream, concatenating all deltas.
    pub async fn collect_text(mut self) -> String {
        let mut full_text = String::new();
        while let Some(delta) = self.receiver.recv().await {
            full_text.push_str(&delta);
        }
        full_text
    }
}

/// Chat-completion capability of one LLM vendor
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Complete a conversation with tools available to the model
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Stream a completion as text deltas.
    ///
    /// Default implementation calls `complete()` and emits the result as
    /// a single delta, so non-streaming adapters work without changes.
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<StreamHandle, ProviderError> {
        let response = self.complete(messages, options).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is dropped, that's fine
        let _ = tx.send(response.content).await;
        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider doubles shared by the executor tests.

    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns canned replies in order; repeats the last when exhausted.
    pub struct ScriptedProvider {
        replies: Vec<CompletionResponse>,
        cursor: Mutex<usize>,
    }

    impl ScriptedProvider {
        pub fn text_replies<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: replies
                    .into_iter()
                    .map(|s| CompletionResponse::text(s))
                    .collect(),
                cursor: Mutex::new(0),
            }
        }

        fn next(&self) -> Result<CompletionResponse, ProviderError> {
            let mut cursor = self.cursor.lock().unwrap();
            let idx = (*cursor).min(self.replies.len().saturating_sub(1));
            *cursor += 1;
            self.replies
                .get(idx)
                .cloned()
                .ok_or_else(|| ProviderError::Other("no scripted reply".into()))
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            self.next()
        }

        async fn complete_with_tools(
            &self,
            _messages: &[Message],
            _tools: &[ToolSpec],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            self.next()
        }
    }

    /// Always answers with the same text.
    pub struct ConstantProvider(pub String);

    #[async_trait]
    impl LlmProvider for ConstantProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse::text(self.0.clone()))
        }

        async fn complete_with_tools(
            &self,
            _messages: &[Message],
            _tools: &[ToolSpec],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse::text(self.0.clone()))
        }
    }

    /// Sleeps before answering; for timeout tests.
    pub struct SlowProvider {
        pub delay: Duration,
        pub reply: String,
    }

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse::text(self.reply.clone()))
        }

        async fn complete_with_tools(
            &self,
            _messages: &[Message],
            _tools: &[ToolSpec],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse::text(self.reply.clone()))
        }
    }

    /// Always fails with an HTTP error.
    pub struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::Http {
                status: 503,
                body: "overloaded".into(),
            })
        }

        async fn complete_with_tools(
            &self,
            _messages: &[Message],
            _tools: &[ToolSpec],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::Http {
                status: 503,
                body: "overloaded".into(),
            })
        }
    }

    /// Echoes the last user message; for prompt-shape assertions.
    pub struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            let last_user = messages
                .iter()
                .rev()
                .find(|m| m.role == conclave_domain::message::Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse::text(last_user))
        }

        async fn complete_with_tools(
            &self,
            messages: &[Message],
            _tools: &[ToolSpec],
            options: &CompletionOptions,
        ) -> Result<CompletionResponse, ProviderError> {
            self.complete(messages, options).await
        }
    }
}
