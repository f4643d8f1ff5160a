//! Deliberation entities: transcript messages, execution state, and the
//! turn-taking mode.

mod message;
mod mode;
mod state;

pub use message::DeliberationMessage;
pub use mode::DeliberationMode;
pub use state::DeliberationState;
