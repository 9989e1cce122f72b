//! Public API surface of the runtime.
//!
//! Re-exports the ports and error types that embedders implement or handle.
mod actions;
mod errors;

pub use actions::{ActionError, ActionPort, ActionResult, Key};
pub use errors::{Result, RuntimeError};
