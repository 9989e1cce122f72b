//! Asynchronous input primitives.
//!
//! The engine never touches a mouse or keyboard itself. It issues requests
//! through an [`ActionPort`] implementation, which may drive a real device, a
//! simulation, or a recording fixture. Every call resolves on its own schedule,
//! independently of game ticks.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use world_core::{ScreenPoint, ScreenRect, Target, WorldPoint};

use crate::slot::ActionKind;

pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Keys the engine may press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum Key {
    Enter,
    Escape,
    Space,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

/// Why an input request did not go through.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("input device unavailable")]
    DeviceUnavailable,

    #[error("a {kind} action is already pending")]
    AlreadyPending { kind: ActionKind },

    #[error("menu entry '{action}' not found")]
    MenuEntryNotFound { action: String },

    #[error("point {0} is off screen")]
    OffScreen(ScreenPoint),

    #[error("{0}")]
    Failed(String),
}

/// Input device port consumed by the interaction engine.
///
/// Implementations are shared as `Arc<dyn ActionPort>`. One actor owns the
/// pointer and keyboard; callers must ensure only one task tree issues
/// actions at a time.
#[async_trait]
pub trait ActionPort: Send + Sync {
    /// Moves the pointer to a screen point.
    async fn move_to(&self, point: ScreenPoint) -> ActionResult<()>;

    /// Left-clicks at the current pointer position.
    async fn click(&self) -> ActionResult<()>;

    /// Clicks a target, verifying that `action` is what the click performs.
    ///
    /// Resolves to `false` when the click went through but did not perform
    /// the requested action (for example because something else was on top).
    async fn click_target(&self, target: &Target, action: Option<&str>) -> ActionResult<bool>;

    /// Right-clicks inside `clickbox` and picks the entry for `action`,
    /// optionally qualified by `target_name` when several entries share it.
    async fn select_menu_entry(
        &self,
        clickbox: ScreenRect,
        action: &str,
        target_name: Option<&str>,
    ) -> ActionResult<bool>;

    async fn press_key(&self, key: Key) -> ActionResult<()>;

    async fn type_text(&self, text: &str) -> ActionResult<()>;

    async fn sleep(&self, duration: Duration) -> ActionResult<()>;

    /// Starts turning the camera toward a tile.
    async fn rotate_camera(&self, toward: WorldPoint) -> ActionResult<()>;
}
