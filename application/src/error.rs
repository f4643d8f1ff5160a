//! Application error types.
//!
//! Runtime failures are folded into result structs by the executors;
//! configuration problems surface synchronously at build or execute
//! entry and are never silently converted.

use thiserror::Error;

/// Errors raised while assembling agents, workflows, or deliberations
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("No agents configured")]
    NoAgents,

    #[error("Agent {0} has no LLM provider")]
    MissingProvider(String),

    #[error("Duplicate tool name {name} on agent {agent}")]
    DuplicateTool { agent: String, name: String },

    #[error("Unknown voting strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
