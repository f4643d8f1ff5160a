//! Application layer for conclave
//!
//! This crate contains the ports (LLM provider, tool handler, progress
//! notification), the agent runtime, the single-shot workflow executor,
//! the multi-round deliberation executor, the session facade, and the
//! fluent builders. It depends only on the domain layer.

pub mod agent;
pub mod arbiter;
pub mod builders;
pub mod deliberation;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod session;
pub mod workflow;

// Re-export commonly used types
pub use agent::{Agent, SchemaHint};
pub use arbiter::ProviderArbiter;
pub use builders::{AgentBuilder, DeliberationBuilder, WorkflowBuilder};
pub use deliberation::{
    AgentTermination, DeliberationExecutor, DeliberationOptions, DeliberationResult,
    TerminationJudgement, WorkflowTermination,
};
pub use error::ConfigurationError;
pub use ports::llm::{
    CompletionOptions, CompletionResponse, LlmProvider, ProviderError, StreamHandle,
};
pub use ports::progress::{
    DeliberationProgress, DeliberationProgressEvent, DeliberationStage, NoProgress,
    WorkflowProgress, WorkflowProgressEvent, WorkflowStage,
};
pub use ports::tool::{FnHandler, ToolDefinition, ToolHandler, ToolOutcome};
pub use session::Session;
pub use workflow::{WorkflowExecutor, WorkflowOptions, WorkflowResult};
