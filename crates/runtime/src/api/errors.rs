//! Error types surfaced by the runtime API.
//!
//! Task outcomes are reported as [`TaskFailure`](task_tree::TaskFailure);
//! [`RuntimeError`] covers misuse of the runtime itself, such as building a
//! context without its ports.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("task context requires a world snapshot")]
    MissingWorld,

    #[error("task context requires an action port")]
    MissingActions,

    #[error("task context requires a navigator")]
    MissingNavigator,
}
