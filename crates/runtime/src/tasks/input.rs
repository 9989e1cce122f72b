use task_tree::{Deadline, Progress, Supervised, TaskBody, TaskFailure};

use crate::api::Key;
use crate::context::TaskContext;
use crate::requests;
use crate::slot::{ActionKind, ActionPoll, ActionSlot};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Input {
    Key(Key),
    Text(String),
}

/// A single keyboard action.
pub struct InputAction {
    description: String,
    input: Input,
    slot: ActionSlot<bool>,
    issued: bool,
}

impl InputAction {
    fn new(input: Input, description: String) -> Self {
        Self {
            description,
            input,
            slot: ActionSlot::new(),
            issued: false,
        }
    }
}

pub fn press_key(key: Key) -> Supervised<InputAction> {
    Supervised::new(
        InputAction::new(Input::Key(key), format!("Press {key}")),
        Deadline::Inherit,
    )
}

pub fn type_text(text: impl Into<String>) -> Supervised<InputAction> {
    let text = text.into();
    let description = format!("Type {} characters", text.chars().count());
    Supervised::new(
        InputAction::new(Input::Text(text), description),
        Deadline::Inherit,
    )
}

impl TaskBody<TaskContext> for InputAction {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, ctx: &mut TaskContext) -> Progress {
        if !self.issued {
            let (kind, future) = match &self.input {
                Input::Key(key) => (ActionKind::PressKey, requests::press_key(ctx.actions(), *key)),
                Input::Text(text) => (
                    ActionKind::TypeText,
                    requests::type_text(ctx.actions(), text.clone()),
                ),
            };
            if let Err(err) = self.slot.issue(kind, future) {
                return Progress::Fail(TaskFailure::ActionRejected(err.to_string()));
            }
            self.issued = true;
        }

        match self.slot.poll() {
            ActionPoll::Pending(_) => Progress::Continue,
            ActionPoll::Ready(_, Ok(_)) | ActionPoll::Idle => Progress::Complete,
            ActionPoll::Ready(_, Err(err)) => {
                Progress::Fail(TaskFailure::ActionRejected(err.to_string()))
            }
        }
    }

    fn reset(&mut self) {
        self.slot.detach();
        self.issued = false;
    }

    fn abandon(&mut self) {
        self.slot.detach();
    }
}

#[cfg(test)]
mod tests {
    use task_tree::{Task, TaskState};
    use world_core::WorldPoint;

    use super::*;
    use crate::api::ActionError;
    use crate::fixtures::{Call, Harness};

    #[test]
    fn key_press_completes_once_settled() {
        let mut harness = Harness::new(WorldPoint::new(0, 0, 0));
        harness.actions.hold();
        let mut task = press_key(Key::Space);

        harness.tick(&mut task);
        harness.tick(&mut task);
        assert_eq!(task.state(), TaskState::Running);

        harness.actions.release();
        harness.tick(&mut task);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(harness.actions.calls(), vec![Call::PressKey(Key::Space)]);
    }

    #[test]
    fn typing_failure_is_rejection() {
        let mut harness = Harness::new(WorldPoint::new(0, 0, 0));
        harness
            .actions
            .fail_typing(ActionError::Failed("keyboard detached".into()));
        let mut task = type_text("bank pin");

        harness.tick(&mut task);
        assert_eq!(
            task.failure(),
            Some(&TaskFailure::ActionRejected("keyboard detached".into()))
        );
        assert_eq!(task.description(), "Type 8 characters");
    }
}
