//! Owned action futures.
//!
//! [`ActionSlot`](crate::slot::ActionSlot) stores `'static` futures, so each
//! builder clones the port handle and moves its arguments in. Every builder
//! resolves to `bool` where the port's answer carries one, so a phase can use
//! a single slot type.
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use world_core::{ScreenPoint, ScreenRect, Target, WorldPoint};

use crate::api::{ActionPort, ActionResult, Key};

pub type BoolFuture = BoxFuture<'static, ActionResult<bool>>;

pub fn move_pointer(port: &Arc<dyn ActionPort>, point: ScreenPoint) -> BoolFuture {
    let port = Arc::clone(port);
    async move { port.move_to(point).await.map(|()| true) }.boxed()
}

pub fn click_target(port: &Arc<dyn ActionPort>, target: Target, action: Option<String>) -> BoolFuture {
    let port = Arc::clone(port);
    async move { port.click_target(&target, action.as_deref()).await }.boxed()
}

pub fn select_menu(
    port: &Arc<dyn ActionPort>,
    clickbox: ScreenRect,
    action: String,
    target_name: Option<String>,
) -> BoolFuture {
    let port = Arc::clone(port);
    async move {
        port.select_menu_entry(clickbox, &action, target_name.as_deref())
            .await
    }
    .boxed()
}

pub fn sleep(port: &Arc<dyn ActionPort>, duration: Duration) -> BoolFuture {
    let port = Arc::clone(port);
    async move { port.sleep(duration).await.map(|()| true) }.boxed()
}

pub fn press_key(port: &Arc<dyn ActionPort>, key: Key) -> BoolFuture {
    let port = Arc::clone(port);
    async move { port.press_key(key).await.map(|()| true) }.boxed()
}

pub fn type_text(port: &Arc<dyn ActionPort>, text: String) -> BoolFuture {
    let port = Arc::clone(port);
    async move { port.type_text(&text).await.map(|()| true) }.boxed()
}

/// Moves the pointer to `point` and clicks there.
pub fn walk_click(port: &Arc<dyn ActionPort>, point: ScreenPoint) -> BoolFuture {
    let port = Arc::clone(port);
    async move {
        port.move_to(point).await?;
        port.click().await?;
        Ok(true)
    }
    .boxed()
}

/// Camera rotation runs in its own slot and is never awaited by a phase.
pub fn rotate_camera(
    port: &Arc<dyn ActionPort>,
    toward: WorldPoint,
) -> BoxFuture<'static, ActionResult<()>> {
    let port = Arc::clone(port);
    async move { port.rotate_camera(toward).await }.boxed()
}
