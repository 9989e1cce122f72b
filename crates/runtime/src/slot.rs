//! The single pending asynchronous action of a task.
//!
//! A phase that needs input issues exactly one future into an [`ActionSlot`]
//! and returns. On later ticks the owner polls the slot; the phase advances
//! only when the future has resolved. Issuing while a future is in flight is
//! refused, so re-entrant ticks cannot double-issue.
//!
//! Futures are polled with a no-op waker: the tick loop is the only thing that
//! resumes a task, so there is nothing to wake.
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use tracing::{debug, trace};

use crate::api::{ActionError, ActionResult};

/// Kind of input request held by a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    MovePointer,
    Click,
    ClickTarget,
    SelectMenu,
    PressKey,
    TypeText,
    Sleep,
    RotateCamera,
    /// Pointer move followed by a click, used for minimap walking.
    Walk,
}

/// State of a slot after one poll.
#[derive(Debug, PartialEq, Eq)]
pub enum ActionPoll<T> {
    /// Nothing issued.
    Idle,
    /// Still in flight.
    Pending(ActionKind),
    /// Resolved this poll; the slot is empty again.
    Ready(ActionKind, ActionResult<T>),
}

/// Holds at most one in-flight action future.
pub struct ActionSlot<T> {
    pending: Option<(ActionKind, BoxFuture<'static, ActionResult<T>>)>,
}

impl<T> Default for ActionSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T: Send + 'static> ActionSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stores a future. Refused while another one is in flight.
    pub fn issue(
        &mut self,
        kind: ActionKind,
        future: BoxFuture<'static, ActionResult<T>>,
    ) -> ActionResult<()> {
        if let Some((active, _)) = &self.pending {
            return Err(ActionError::AlreadyPending { kind: *active });
        }
        trace!(%kind, "action issued");
        self.pending = Some((kind, future));
        Ok(())
    }

    /// Polls the in-flight future once.
    pub fn poll(&mut self) -> ActionPoll<T> {
        let Some((kind, future)) = self.pending.as_mut() else {
            return ActionPoll::Idle;
        };
        let kind = *kind;

        let mut cx = Context::from_waker(noop_waker_ref());
        match future.poll_unpin(&mut cx) {
            Poll::Pending => ActionPoll::Pending(kind),
            Poll::Ready(result) => {
                self.pending = None;
                trace!(%kind, ok = result.is_ok(), "action settled");
                ActionPoll::Ready(kind, result)
            }
        }
    }

    /// Stops waiting on the in-flight future without aborting it.
    ///
    /// Inside a tokio runtime the future is moved onto a background task so
    /// it can settle on its own; otherwise it is dropped.
    pub fn detach(&mut self) {
        let Some((kind, future)) = self.pending.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(%kind, "detaching in-flight action");
                handle.spawn(async move {
                    let _ = future.await;
                });
            }
            Err(_) => debug!(%kind, "dropping in-flight action outside a runtime"),
        }
    }
}
