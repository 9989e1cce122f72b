//! Concrete tasks built on the interaction machine.
//!
//! Interaction constructors return the unsupervised [`InteractionMachine`]
//! so callers can adjust signals or descriptions before calling
//! [`InteractionMachine::into_task`]. Walking and input tasks come
//! supervised.
//!
//! [`InteractionMachine`]: crate::interaction::InteractionMachine
//! [`InteractionMachine::into_task`]: crate::interaction::InteractionMachine::into_task
mod input;
mod interact;
mod use_item;
mod walk_to;

pub use input::{InputAction, press_key, type_text};
pub use interact::{InteractNpc, InteractObject, interact_npc, interact_object};
pub(crate) use interact::open_obstacle;
pub use use_item::{UseItemOnItem, use_item_on_item, use_item_on_npc, use_item_on_object};
pub use walk_to::{WalkTo, walk_to};
