//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No agents configured")]
    NoAgents,

    #[error("No agent responses received")]
    NoResponses,

    #[error("Arbiter call failed: {0}")]
    Arbiter(String),

    #[error("Context projection failed: {0}")]
    Projection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
