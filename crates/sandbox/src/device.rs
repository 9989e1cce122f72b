//! Simulated mouse and keyboard.
//!
//! Pointer moves and clicks land at once. Sleeps and camera turns resolve
//! once the world has advanced far enough, so the engine sees them complete
//! on a later tick just as it would with a real device.
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use runtime::{ActionError, ActionPort, ActionResult, Key};
use tracing::trace;
use world_core::{ScreenPoint, ScreenRect, Target, WorldPoint};

use crate::world::{SimWorld, TICK, VIEWPORT};

pub struct SimDevice {
    world: Arc<SimWorld>,
    pointer: Mutex<ScreenPoint>,
    typed: Mutex<String>,
}

impl SimDevice {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self {
            world,
            pointer: Mutex::new(VIEWPORT.center()),
            typed: Mutex::new(String::new()),
        }
    }

    pub fn pointer(&self) -> ScreenPoint {
        *self.pointer.lock()
    }

    /// Everything typed so far.
    pub fn typed(&self) -> String {
        self.typed.lock().clone()
    }

    async fn wait_ticks(&self, ticks: u64) {
        let until = self.world.tick_count() + ticks;
        futures::future::poll_fn(|_| {
            if self.world.tick_count() >= until {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}

#[async_trait]
impl ActionPort for SimDevice {
    async fn move_to(&self, point: ScreenPoint) -> ActionResult<()> {
        *self.pointer.lock() = point;
        Ok(())
    }

    async fn click(&self) -> ActionResult<()> {
        let point = self.pointer();
        if !self.world.click_minimap(point) {
            trace!(%point, "click on nothing");
        }
        Ok(())
    }

    async fn click_target(&self, target: &Target, action: Option<&str>) -> ActionResult<bool> {
        if let Some(clickbox) = target.clickbox {
            *self.pointer.lock() = clickbox.center();
        }
        Ok(self.world.click_entity(target.key, action))
    }

    async fn select_menu_entry(
        &self,
        clickbox: ScreenRect,
        action: &str,
        target_name: Option<&str>,
    ) -> ActionResult<bool> {
        *self.pointer.lock() = clickbox.center();
        if self.world.click_menu(clickbox, action, target_name) {
            Ok(true)
        } else {
            Err(ActionError::MenuEntryNotFound {
                action: action.to_string(),
            })
        }
    }

    async fn press_key(&self, key: Key) -> ActionResult<()> {
        match key {
            Key::Space | Key::Enter => {
                self.world.continue_dialogue();
            }
            Key::Escape => self.world.close_interfaces(),
            _ => trace!(%key, "key ignored"),
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> ActionResult<()> {
        self.typed.lock().push_str(text);
        Ok(())
    }

    async fn sleep(&self, duration: Duration) -> ActionResult<()> {
        let ticks = duration.as_millis().div_ceil(TICK.as_millis()).max(1);
        self.wait_ticks(u64::try_from(ticks).unwrap_or(u64::MAX)).await;
        Ok(())
    }

    async fn rotate_camera(&self, toward: WorldPoint) -> ActionResult<()> {
        trace!(%toward, "turning camera");
        self.wait_ticks(1).await;
        Ok(())
    }
}
