//! Simulated environment for the interaction engine.
//!
//! [`SimWorld`] implements the world snapshot port over an in-memory map and
//! [`SimDevice`] implements the action port on top of it. [`scenario`] holds
//! ready-made maps, the demo task list and a lock-step [`Scenario`] harness
//! used by the end-to-end tests.
pub mod device;
pub mod scenario;
pub mod world;

pub use device::SimDevice;
pub use scenario::Scenario;
pub use world::{Recipe, Response, SimCollision, SimEntity, SimWorld, TICK};
