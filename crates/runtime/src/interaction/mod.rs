//! Interaction phase machine.
//!
//! [`InteractionMachine`] sequences one interaction across ticks:
//!
//! ```text
//! [SELECT_ITEM] -> FIND_TARGET -> [APPROACH] -> [ROTATE_CAMERA] -> [HANDLE_OBSTACLE]
//!     -> MOVE_POINTER -> HOVER_DELAY -> CHECK_MENU -> CLICK | SELECT_MENU -> WAIT_RESPONSE
//! ```
//!
//! The edges live in [`phase::transition`], a pure function. A
//! [`TargetSource`] supplies discovery and re-validation, so objects, NPCs
//! and inventory items share the same machine.
pub mod click_point;
pub mod machine;
pub mod phase;
mod ranking;
pub mod signals;
pub mod source;

pub use click_point::{ClickPoint, ClickPointResolver};
pub use machine::InteractionMachine;
pub use phase::{Phase, PhaseEvent, Step, transition};
pub use signals::{Baseline, SuccessSignals};
pub use source::{InventorySource, NpcSource, ObjectSource, Revalidation, TargetSource};
