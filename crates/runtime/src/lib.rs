//! Interaction engine for a tick-driven game client.
//!
//! This crate turns the task primitives of `task-tree` into concrete, humanized
//! interactions with a live world that may change between observation and
//! action. Embedders implement the [`ActionPort`] and a
//! [`WorldSnapshot`](world_core::WorldSnapshot), build a [`TaskContext`], and
//! feed task trees to a [`TaskRunner`].
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the input port and error types embedders handle
//! - [`interaction`] hosts the phase machine every interaction shares
//! - [`tasks`] builds concrete interactions, walking and keyboard input
//! - [`runner`] queues task trees and drives them on the game tick
//! - [`slot`] keeps at most one in-flight action per task
//! - [`humanize`], [`clock`] and [`config`] are injected into [`TaskContext`]
pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod humanize;
pub mod interaction;
pub mod runner;
pub mod slot;
pub mod tasks;

mod requests;

#[cfg(test)]
mod fixtures;

pub use api::{ActionError, ActionPort, ActionResult, Key, Result, RuntimeError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClickPointConfig, EngineConfig, HumanizationProfile, RunnerConfig};
pub use context::{TaskContext, TaskContextBuilder};
pub use humanize::Humanizer;
pub use interaction::{InteractionMachine, Phase, SuccessSignals, TargetSource};
pub use runner::{TaskReport, TaskRunner};
pub use slot::{ActionKind, ActionPoll, ActionSlot};
