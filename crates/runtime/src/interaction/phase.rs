//! Interaction phases and the transition table between them.
//!
//! Phase handlers observe the world and report a [`PhaseEvent`];
//! [`transition`] alone decides where that leads. Keeping the table pure
//! means every edge can be tested without a world.
use task_tree::TaskFailure;

/// One step of an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Select the inventory item used on the target (item-on-X only).
    SelectItem,
    FindTarget,
    /// Walk toward a target beyond local path range.
    Approach,
    RotateCamera,
    HandleObstacle,
    MovePointer,
    HoverDelay,
    CheckMenu,
    Click,
    SelectMenu,
    WaitResponse,
}

/// What a phase handler observed or finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    ItemSelected,
    TargetFound {
        /// Target is beyond local range and must be walked to first.
        approach: bool,
        rotate: bool,
        /// The cached path crosses a closed door or gate.
        obstacle: bool,
    },
    /// The approach walk ended, successfully or not.
    Approached { reselect: bool },
    CameraIssued { obstacle: bool },
    /// The obstacle sub-task ended, successfully or not.
    ObstacleSettled { reselect: bool },
    /// The click point resolver wants a different camera angle.
    RotationNeeded,
    PointerMoved,
    HoverElapsed,
    MenuChecked { default_click: bool },
    /// The click or menu selection went through.
    ActionAccepted,
    /// Re-validation found the target gone. `retries` already counts this one.
    TargetLost { retries: u32, max: u32 },
    /// Re-validation found the target too far from where it was found. Past
    /// the bound this fails like a despawn.
    TargetMoved { attempts: u32, max: u32 },
    ResponseObserved,
    /// Nothing to do this tick.
    Waiting,
    Failed(TaskFailure),
}

/// Result of applying an event to a phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Stay,
    Advance(Phase),
    Complete,
    Fail(TaskFailure),
}

pub fn transition(phase: Phase, event: &PhaseEvent) -> Step {
    use Phase::*;
    use PhaseEvent as E;

    match (phase, event) {
        (_, E::Waiting) => Step::Stay,
        (_, E::Failed(failure)) => Step::Fail(failure.clone()),

        (SelectItem, E::ItemSelected) => Step::Advance(FindTarget),

        (FindTarget, E::TargetFound { approach: true, .. }) => Step::Advance(Approach),
        (FindTarget, E::TargetFound { rotate: true, .. }) => Step::Advance(RotateCamera),
        (FindTarget, E::TargetFound { obstacle: true, .. }) => Step::Advance(HandleObstacle),
        (FindTarget, E::TargetFound { .. }) => Step::Advance(MovePointer),

        (Approach, E::Approached { reselect }) | (HandleObstacle, E::ObstacleSettled { reselect }) => {
            if *reselect {
                Step::Advance(SelectItem)
            } else {
                Step::Advance(FindTarget)
            }
        }

        (RotateCamera, E::CameraIssued { obstacle: true }) => Step::Advance(HandleObstacle),
        (RotateCamera, E::CameraIssued { obstacle: false }) => Step::Advance(MovePointer),

        (MovePointer, E::RotationNeeded) => Step::Advance(RotateCamera),
        (MovePointer, E::PointerMoved) => Step::Advance(HoverDelay),
        (HoverDelay, E::HoverElapsed) => Step::Advance(CheckMenu),
        (CheckMenu, E::MenuChecked { default_click: true }) => Step::Advance(Click),
        (CheckMenu, E::MenuChecked { default_click: false }) => Step::Advance(SelectMenu),
        (Click | SelectMenu, E::ActionAccepted) => Step::Advance(WaitResponse),

        (MovePointer | Click | SelectMenu, E::TargetLost { retries, max }) => {
            if retries > max {
                Step::Fail(TaskFailure::TargetDespawned { retries: *retries })
            } else {
                Step::Advance(FindTarget)
            }
        }
        (MovePointer | Click | SelectMenu, E::TargetMoved { attempts, max }) => {
            if attempts > max {
                Step::Fail(TaskFailure::TargetDespawned { retries: *attempts })
            } else {
                Step::Advance(FindTarget)
            }
        }

        (WaitResponse, E::ResponseObserved) => Step::Complete,

        (phase, event) => Step::Fail(TaskFailure::Other(format!(
            "unexpected {event:?} in phase {phase}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(approach: bool, rotate: bool, obstacle: bool) -> PhaseEvent {
        PhaseEvent::TargetFound {
            approach,
            rotate,
            obstacle,
        }
    }

    #[test]
    fn found_target_prefers_approach_then_camera_then_obstacle() {
        use Phase::*;
        assert_eq!(
            transition(FindTarget, &found(true, true, true)),
            Step::Advance(Approach)
        );
        assert_eq!(
            transition(FindTarget, &found(false, true, true)),
            Step::Advance(RotateCamera)
        );
        assert_eq!(
            transition(FindTarget, &found(false, false, true)),
            Step::Advance(HandleObstacle)
        );
        assert_eq!(
            transition(FindTarget, &found(false, false, false)),
            Step::Advance(MovePointer)
        );
    }

    #[test]
    fn camera_rotation_does_not_skip_obstacle() {
        assert_eq!(
            transition(Phase::RotateCamera, &PhaseEvent::CameraIssued { obstacle: true }),
            Step::Advance(Phase::HandleObstacle)
        );
    }

    #[test]
    fn obstacle_always_returns_to_discovery() {
        assert_eq!(
            transition(
                Phase::HandleObstacle,
                &PhaseEvent::ObstacleSettled { reselect: false }
            ),
            Step::Advance(Phase::FindTarget)
        );
        assert_eq!(
            transition(
                Phase::HandleObstacle,
                &PhaseEvent::ObstacleSettled { reselect: true }
            ),
            Step::Advance(Phase::SelectItem)
        );
    }

    #[test]
    fn despawn_fails_only_past_the_bound() {
        let lost = |retries| PhaseEvent::TargetLost { retries, max: 3 };
        for retries in 1..=3 {
            assert_eq!(
                transition(Phase::Click, &lost(retries)),
                Step::Advance(Phase::FindTarget)
            );
        }
        assert_eq!(
            transition(Phase::SelectMenu, &lost(4)),
            Step::Fail(TaskFailure::TargetDespawned { retries: 4 })
        );
    }

    #[test]
    fn retarget_exhaustion_is_reported_as_despawn() {
        let moved = |attempts| PhaseEvent::TargetMoved { attempts, max: 3 };
        for attempts in 1..=3 {
            assert_eq!(
                transition(Phase::MovePointer, &moved(attempts)),
                Step::Advance(Phase::FindTarget)
            );
        }
        assert_eq!(
            transition(Phase::Click, &moved(4)),
            Step::Fail(TaskFailure::TargetDespawned { retries: 4 })
        );
    }

    #[test]
    fn menu_check_routes_to_click_or_menu() {
        assert_eq!(
            transition(
                Phase::CheckMenu,
                &PhaseEvent::MenuChecked {
                    default_click: true
                }
            ),
            Step::Advance(Phase::Click)
        );
        assert_eq!(
            transition(
                Phase::CheckMenu,
                &PhaseEvent::MenuChecked {
                    default_click: false
                }
            ),
            Step::Advance(Phase::SelectMenu)
        );
    }

    #[test]
    fn failure_is_terminal_from_any_phase() {
        let failure = TaskFailure::ActionRejected("device gone".into());
        assert_eq!(
            transition(Phase::Click, &PhaseEvent::Failed(failure.clone())),
            Step::Fail(failure)
        );
    }

    #[test]
    fn waiting_never_moves() {
        assert_eq!(
            transition(Phase::WaitResponse, &PhaseEvent::Waiting),
            Step::Stay
        );
        assert_eq!(
            transition(Phase::WaitResponse, &PhaseEvent::ResponseObserved),
            Step::Complete
        );
    }

    #[test]
    fn unexpected_event_fails_loudly() {
        assert!(matches!(
            transition(Phase::HoverDelay, &PhaseEvent::ActionAccepted),
            Step::Fail(TaskFailure::Other(_))
        ));
    }
}
