//! Tool handler port.
//!
//! Handlers are opaque callbacks supplied by the embedding application.
//! They may suspend and must be cancellation-aware; failures never
//! propagate past the agent's tool loop, they are folded into the
//! tool-role message the model sees next.

use async_trait::async_trait;
use conclave_domain::tool::ToolSpec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text surfaced into the tool-role message
    pub fn into_message_text(self) -> String {
        if self.success {
            self.output
        } else {
            format!(
                "Tool error: {}",
                self.error.unwrap_or_else(|| "unknown failure".to_string())
            )
        }
    }
}

/// Executable side of a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with JSON-encoded arguments
    async fn invoke(&self, arguments: &str, cancel: &CancellationToken) -> ToolOutcome;
}

/// Adapter for plain closures
pub struct FnHandler {
    f: Box<dyn Fn(&str) -> ToolOutcome + Send + Sync>,
}

impl FnHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> ToolOutcome + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn invoke(&self, arguments: &str, _cancel: &CancellationToken) -> ToolOutcome {
        (self.f)(arguments)
    }
}

/// A tool: declarative spec plus an optional handler.
///
/// A definition without a handler is advertised to the model but fails
/// when invoked, which some callers use for dry runs.
#[derive(Clone)]
pub struct ToolDefinition {
    pub spec: ToolSpec,
    pub handler: Option<Arc<dyn ToolHandler>>,
}

impl ToolDefinition {
    pub fn new(spec: ToolSpec) -> Self {
        Self {
            spec,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("spec", &self.spec)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new(|args| ToolOutcome::success(format!("got {}", args)));
        let outcome = handler.invoke("{}", &CancellationToken::new()).await;
        assert!(outcome.success);
        assert_eq!(outcome.output, "got {}");
    }

    #[test]
    fn test_outcome_message_text() {
        assert_eq!(
            ToolOutcome::success("42").into_message_text(),
            "42"
        );
        assert_eq!(
            ToolOutcome::failure("boom").into_message_text(),
            "Tool error: boom"
        );
    }

    #[test]
    fn test_definition_name() {
        let def = ToolDefinition::new(ToolSpec::new("search", "Search", json!({})));
        assert_eq!(def.name(), "search");
        assert!(def.handler.is_none());
    }
}
