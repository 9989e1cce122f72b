//! The phase machine shared by every concrete interaction.
//!
//! One [`InteractionMachine`] runs one interaction: find a target, get it on
//! screen, point at it, click it or pick its menu entry, then wait for the
//! game to react. A [`TargetSource`] decides what the target is; everything
//! else is common.
//!
//! Each tick the machine first forwards to an active sub-task (approach walk
//! or door handling), then polls its single pending action, and only then
//! runs phase logic. Phases that finish synchronously chain within the tick;
//! the tick ends as soon as a phase is waiting on an action, a sub-task or
//! the world. A camera rotation asked for by the pointer phase also ends the
//! tick, since the new angle only shows in the next snapshot.
use navigation::AdjacentPath;
use task_tree::{
    Deadline, Progress, SlotPoll, SubTaskOutcome, SubTaskSlot, Supervised, Task, TaskBody,
    TaskFailure, TimeoutPolicy,
};
use tracing::{debug, trace, warn};
use world_core::{EntityId, ScreenRect, Target, WorldPoint};

use super::click_point::{ClickPoint, ClickPointResolver};
use super::phase::{Phase, PhaseEvent, Step, transition};
use super::ranking;
use super::signals::{Baseline, SuccessSignals};
use super::source::{Revalidation, TargetSource};
use crate::api::ActionResult;
use crate::context::TaskContext;
use crate::requests::{self, BoolFuture};
use crate::slot::{ActionKind, ActionPoll, ActionSlot};
use crate::tasks;

/// Upper bound on phases run within one tick.
const MAX_CHAINED_PHASES: usize = 32;

pub struct InteractionMachine<S> {
    source: S,
    description: String,
    action: Option<String>,
    signals: SuccessSignals,
    select_item: Option<EntityId>,

    phase: Phase,
    target: Option<Target>,
    found_at: Option<WorldPoint>,
    path: Option<AdjacentPath>,
    baseline: Baseline,
    clickbox: Option<ScreenRect>,

    despawn_retries: u32,
    rediscovering: bool,
    retarget_attempts: u32,
    obstacle_attempts: u32,
    approach_attempts: u32,
    click_point: ClickPointResolver,
    /// A rotation was requested to get a better view of the target.
    awaiting_view: bool,
    waited: u32,
    ticks: u64,

    action_slot: ActionSlot<bool>,
    camera: ActionSlot<()>,
    sub_task: SubTaskSlot<TaskContext>,
}

impl<S: TargetSource> InteractionMachine<S> {
    pub fn new(source: S) -> Self {
        let description = format!("Interact with {}", source.describe());
        Self {
            source,
            description,
            action: None,
            signals: SuccessSignals::default(),
            select_item: None,
            phase: Phase::FindTarget,
            target: None,
            found_at: None,
            path: None,
            baseline: Baseline::default(),
            clickbox: None,
            despawn_retries: 0,
            rediscovering: false,
            retarget_attempts: 0,
            obstacle_attempts: 0,
            approach_attempts: 0,
            click_point: ClickPointResolver::new(),
            awaiting_view: false,
            waited: 0,
            ticks: 0,
            action_slot: ActionSlot::new(),
            camera: ActionSlot::new(),
            sub_task: SubTaskSlot::new(),
        }
    }

    /// Menu action to perform. Without one the target's default left-click
    /// action is used.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        self.description = format!("{action} {}", self.source.describe());
        self.action = Some(action);
        self
    }

    pub fn with_signals(mut self, signals: SuccessSignals) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Selects `item` in the inventory before finding the target.
    pub fn using_item(mut self, item: EntityId) -> Self {
        self.select_item = Some(item);
        self.phase = Phase::SelectItem;
        self
    }

    /// Wraps the machine in lifecycle supervision with the context's default
    /// timeout.
    pub fn into_task(self) -> Supervised<Self> {
        Supervised::new(self, Deadline::Inherit)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn despawn_retries(&self) -> u32 {
        self.despawn_retries
    }

    pub fn signals(&self) -> &SuccessSignals {
        &self.signals
    }

    fn initial_phase(&self) -> Phase {
        if self.select_item.is_some() {
            Phase::SelectItem
        } else {
            Phase::FindTarget
        }
    }

    fn run_phase(&mut self, ctx: &mut TaskContext) -> Option<PhaseEvent> {
        match self.phase {
            Phase::SelectItem => self.select_item(ctx),
            Phase::FindTarget => Some(self.find_target(ctx)),
            Phase::Approach => self.approach(),
            Phase::RotateCamera => Some(self.rotate_camera(ctx)),
            Phase::HandleObstacle => self.handle_obstacle(ctx),
            Phase::MovePointer => self.move_pointer(ctx),
            Phase::HoverDelay => self.hover(ctx),
            Phase::CheckMenu => Some(self.check_menu()),
            Phase::Click => self.click(ctx),
            Phase::SelectMenu => self.select_menu(ctx),
            Phase::WaitResponse => Some(self.wait_response(ctx)),
        }
    }

    fn select_item(&mut self, ctx: &mut TaskContext) -> Option<PhaseEvent> {
        let Some(item) = self.select_item else {
            return Some(PhaseEvent::ItemSelected);
        };
        let Some(slot) = ctx.world().inventory_item(item) else {
            return Some(PhaseEvent::Failed(TaskFailure::TargetNotFound(format!(
                "item {item} in inventory"
            ))));
        };
        let future = requests::click_target(ctx.actions(), slot, Some("Use".to_string()));
        self.issue(ActionKind::ClickTarget, future)
    }

    fn find_target(&mut self, ctx: &mut TaskContext) -> PhaseEvent {
        let Some(player) = ctx.world().player_position() else {
            return PhaseEvent::Failed(TaskFailure::Other(
                "player position unavailable".to_string(),
            ));
        };

        let describe = self.source.describe();
        let candidates = self.source.discover(ctx);
        let selection = if self.source.requires_adjacency() {
            ranking::select(ctx.navigator(), player, candidates, &describe)
        } else {
            ranking::first(candidates, &describe)
        };
        let selection = match selection {
            Ok(selection) => selection,
            Err(failure) => return PhaseEvent::Failed(failure),
        };

        if selection.approach && self.approach_attempts >= ctx.config().max_approach_attempts {
            return PhaseEvent::Failed(TaskFailure::TargetUnreachable(format!(
                "{} still out of range after {} walks",
                selection.target.name, self.approach_attempts
            )));
        }

        if !self.rediscovering {
            self.despawn_retries = 0;
            self.retarget_attempts = 0;
        }
        self.rediscovering = false;
        self.baseline = Baseline::capture(ctx.world(), &self.signals);
        self.click_point.reset();

        let chance = ctx.config().humanization.camera_rotation_chance;
        let rotate = !selection.approach
            && selection.target.position.is_some()
            && ctx.humanizer().chance(chance);
        let obstacle = selection
            .path
            .as_ref()
            .is_some_and(AdjacentPath::crosses_obstacle);

        debug!(
            task = %self.description,
            target = %selection.target.name,
            key = %selection.target.key,
            position = ?selection.target.position,
            cost = ?selection.path.as_ref().map(|path| path.cost),
            approach = selection.approach,
            rotate,
            obstacle,
            "target found"
        );

        self.found_at = selection.target.position;
        self.target = Some(selection.target);
        self.path = selection.path;
        PhaseEvent::TargetFound {
            approach: selection.approach,
            rotate,
            obstacle,
        }
    }

    fn approach(&mut self) -> Option<PhaseEvent> {
        let Some(destination) = self.target.as_ref().and_then(|target| target.position) else {
            return Some(self.missing_target());
        };
        self.approach_attempts += 1;
        debug!(
            task = %self.description,
            %destination,
            attempt = self.approach_attempts,
            "walking toward distant target"
        );
        self.start_sub_task(Box::new(tasks::walk_to(destination)))
    }

    fn rotate_camera(&mut self, ctx: &TaskContext) -> PhaseEvent {
        let obstacle = self
            .path
            .as_ref()
            .is_some_and(AdjacentPath::crosses_obstacle);

        if !self.camera.is_pending()
            && let Some(toward) = self.target.as_ref().and_then(|target| target.position)
        {
            let future = requests::rotate_camera(ctx.actions(), toward);
            if self.camera.issue(ActionKind::RotateCamera, future).is_ok() {
                debug!(task = %self.description, %toward, "camera rotation issued");
                self.poll_camera();
            }
        }
        PhaseEvent::CameraIssued { obstacle }
    }

    fn handle_obstacle(&mut self, ctx: &TaskContext) -> Option<PhaseEvent> {
        let Some(crossing) = self.path.as_ref().and_then(|path| path.obstacle.clone()) else {
            return Some(PhaseEvent::ObstacleSettled {
                reselect: self.select_item.is_some(),
            });
        };

        let max = ctx.config().max_obstacle_attempts;
        if self.obstacle_attempts >= max {
            return Some(PhaseEvent::Failed(TaskFailure::ObstacleUnresolved {
                name: crossing.name,
                attempts: self.obstacle_attempts,
            }));
        }
        self.obstacle_attempts += 1;

        let distance = ctx
            .world()
            .player_position()
            .map(|player| player.chebyshev_distance(crossing.object.tile))
            .unwrap_or(0);
        let radius = ctx.config().obstacle_search_radius.max(distance.saturating_add(1));
        debug!(
            task = %self.description,
            obstacle = %crossing.name,
            tile = %crossing.object.tile,
            attempt = self.obstacle_attempts,
            max,
            "path blocked, handling obstacle"
        );
        self.start_sub_task(Box::new(tasks::open_obstacle(&crossing, radius)))
    }

    fn move_pointer(&mut self, ctx: &mut TaskContext) -> Option<PhaseEvent> {
        if let Some(event) = self.revalidate(ctx) {
            return Some(event);
        }
        let Some(target) = self.target.as_ref() else {
            return Some(self.missing_target());
        };

        let viewport = ctx.world().viewport();
        let config = ctx.config().click_point.clone();
        let resolved =
            self.click_point
                .resolve(self.ticks, target, viewport, &config, ctx.humanizer());

        match resolved {
            ClickPoint::Ready(point) => {
                let future = requests::move_pointer(ctx.actions(), point);
                self.issue(ActionKind::MovePointer, future)
            }
            ClickPoint::Waiting => {
                trace!(task = %self.description, target = %target.name, "waiting for clickbox");
                Some(PhaseEvent::Waiting)
            }
            ClickPoint::NeedsRotation => {
                debug!(
                    task = %self.description,
                    target = %target.name,
                    rotation = self.click_point.rotations(),
                    max = config.max_camera_retries,
                    "clickbox not usable, rotating camera"
                );
                self.awaiting_view = true;
                Some(PhaseEvent::RotationNeeded)
            }
            ClickPoint::Unavailable(reason) => Some(PhaseEvent::Failed(
                TaskFailure::ClickPointUnavailable(reason),
            )),
        }
    }

    fn hover(&mut self, ctx: &mut TaskContext) -> Option<PhaseEvent> {
        let min = ctx.config().humanization.hover_delay_min;
        let max = ctx.config().humanization.hover_delay_max;
        let delay = ctx.humanizer().delay_between(min, max);

        if let Some(clickbox) = self.target.as_ref().and_then(|target| target.clickbox) {
            self.clickbox = Some(clickbox);
        }
        trace!(task = %self.description, delay_ms = delay.as_millis() as u64, "hovering");
        let future = requests::sleep(ctx.actions(), delay);
        self.issue(ActionKind::Sleep, future)
    }

    fn check_menu(&self) -> PhaseEvent {
        let default_click = match (&self.action, &self.target) {
            (None, _) => true,
            (Some(action), Some(target)) => target.is_default_action(action),
            (Some(_), None) => false,
        };
        PhaseEvent::MenuChecked { default_click }
    }

    fn click(&mut self, ctx: &TaskContext) -> Option<PhaseEvent> {
        if let Some(event) = self.revalidate(ctx) {
            return Some(event);
        }
        let Some(target) = self.target.clone() else {
            return Some(self.missing_target());
        };
        let future = requests::click_target(ctx.actions(), target, self.action.clone());
        self.issue(ActionKind::ClickTarget, future)
    }

    fn select_menu(&mut self, ctx: &TaskContext) -> Option<PhaseEvent> {
        if let Some(event) = self.revalidate(ctx) {
            return Some(event);
        }
        let Some(target) = self.target.as_ref() else {
            return Some(self.missing_target());
        };
        let Some(clickbox) = target.clickbox.or(self.clickbox) else {
            return Some(PhaseEvent::Failed(TaskFailure::ClickPointUnavailable(
                format!("{} has no clickbox to open a menu on", target.name),
            )));
        };
        let action = self.action.clone().unwrap_or_default();
        let future = requests::select_menu(
            ctx.actions(),
            clickbox,
            action,
            Some(target.name.clone()),
        );
        self.issue(ActionKind::SelectMenu, future)
    }

    fn wait_response(&mut self, ctx: &TaskContext) -> PhaseEvent {
        if let Some(signal) = self.signals.observe(ctx.world(), &self.baseline) {
            debug!(task = %self.description, signal, waited = self.waited, "response observed");
            return PhaseEvent::ResponseObserved;
        }

        self.waited += 1;
        let budget = ctx.config().interaction_timeout_ticks;
        if self.waited >= budget {
            return PhaseEvent::Failed(TaskFailure::ResponseTimeout { ticks: self.waited });
        }
        trace!(task = %self.description, waited = self.waited, budget, "waiting for response");
        PhaseEvent::Waiting
    }

    /// Re-checks the target before an action that depends on it.
    ///
    /// Returns `None` when the target is still usable; `self.target` then
    /// holds the fresh snapshot.
    fn revalidate(&mut self, ctx: &TaskContext) -> Option<PhaseEvent> {
        let Some(target) = self.target.as_ref() else {
            return Some(self.missing_target());
        };
        let name = target.name.clone();
        let outcome = self.source.revalidate(ctx, target, self.found_at);

        match outcome {
            Revalidation::Present(current) => {
                self.target = Some(current);
                None
            }
            Revalidation::Missing => {
                self.despawn_retries += 1;
                let max = ctx.config().max_despawn_retries;
                warn!(
                    task = %self.description,
                    target = %name,
                    phase = %self.phase,
                    attempt = self.despawn_retries,
                    max,
                    "target despawned, searching again"
                );
                self.forget_target();
                Some(PhaseEvent::TargetLost {
                    retries: self.despawn_retries,
                    max,
                })
            }
            Revalidation::Moved(current) => {
                self.retarget_attempts += 1;
                let max = ctx.config().max_retarget_attempts;
                warn!(
                    task = %self.description,
                    target = %name,
                    from = ?self.found_at,
                    to = ?current.position,
                    attempt = self.retarget_attempts,
                    max,
                    "target moved away, re-targeting"
                );
                self.forget_target();
                Some(PhaseEvent::TargetMoved {
                    attempts: self.retarget_attempts,
                    max,
                })
            }
        }
    }

    fn on_action(&mut self, kind: ActionKind, result: ActionResult<bool>) -> PhaseEvent {
        match (self.phase, result) {
            (Phase::HoverDelay, result) => {
                if let Err(err) = result {
                    debug!(task = %self.description, error = %err, "hover delay failed, continuing");
                }
                PhaseEvent::HoverElapsed
            }
            (Phase::MovePointer, Ok(_)) => PhaseEvent::PointerMoved,
            (Phase::SelectItem, Ok(true)) => PhaseEvent::ItemSelected,
            (Phase::Click | Phase::SelectMenu, Ok(true)) => PhaseEvent::ActionAccepted,
            (Phase::Click | Phase::SelectMenu, Ok(false)) => {
                let action = self.action.as_deref().unwrap_or("default action");
                let name = self
                    .target
                    .as_ref()
                    .map_or("target", |target| target.name.as_str());
                PhaseEvent::Failed(TaskFailure::ActionRejected(format!(
                    "{action} on {name} was not performed"
                )))
            }
            (phase, Ok(false)) => PhaseEvent::Failed(TaskFailure::ActionRejected(format!(
                "{kind} was not performed during {phase}"
            ))),
            (_, Err(err)) => PhaseEvent::Failed(TaskFailure::ActionRejected(err.to_string())),
            (phase, Ok(true)) => PhaseEvent::Failed(TaskFailure::Other(format!(
                "unexpected {kind} result during {phase}"
            ))),
        }
    }

    fn on_sub_task(&mut self, outcome: SubTaskOutcome) -> PhaseEvent {
        match &outcome {
            SubTaskOutcome::Completed => {
                debug!(task = %self.description, phase = %self.phase, "sub-task completed")
            }
            SubTaskOutcome::Failed(failure) => debug!(
                task = %self.description,
                phase = %self.phase,
                %failure,
                "sub-task failed"
            ),
            SubTaskOutcome::PreconditionUnmet => debug!(
                task = %self.description,
                phase = %self.phase,
                "sub-task precondition not met"
            ),
        }

        // The world changed under us; discover again from scratch.
        self.clear_target();
        let reselect = self.select_item.is_some();
        match self.phase {
            Phase::Approach => PhaseEvent::Approached { reselect },
            Phase::HandleObstacle => PhaseEvent::ObstacleSettled { reselect },
            phase => PhaseEvent::Failed(TaskFailure::Other(format!(
                "sub-task finished during {phase}"
            ))),
        }
    }

    fn issue(&mut self, kind: ActionKind, future: BoolFuture) -> Option<PhaseEvent> {
        match self.action_slot.issue(kind, future) {
            Ok(()) => None,
            Err(err) => Some(PhaseEvent::Failed(TaskFailure::ActionRejected(
                err.to_string(),
            ))),
        }
    }

    fn start_sub_task(&mut self, task: Box<dyn Task<TaskContext>>) -> Option<PhaseEvent> {
        match self.sub_task.start(task) {
            Ok(()) => None,
            Err(err) => Some(PhaseEvent::Failed(TaskFailure::Other(err.to_string()))),
        }
    }

    fn poll_camera(&mut self) {
        if let ActionPoll::Ready(_, Err(err)) = self.camera.poll() {
            debug!(task = %self.description, error = %err, "camera rotation failed");
        }
    }

    fn missing_target(&self) -> PhaseEvent {
        PhaseEvent::Failed(TaskFailure::Other(format!(
            "no target selected in phase {}",
            self.phase
        )))
    }

    fn clear_target(&mut self) {
        self.target = None;
        self.found_at = None;
        self.path = None;
        self.clickbox = None;
        self.click_point.reset();
        self.awaiting_view = false;
    }

    fn forget_target(&mut self) {
        self.clear_target();
        self.rediscovering = true;
    }

    fn release(&mut self) {
        self.action_slot.detach();
        self.camera.detach();
        self.sub_task.cancel();
    }
}

impl<S: TargetSource> TaskBody<TaskContext> for InteractionMachine<S> {
    fn description(&self) -> &str {
        &self.description
    }

    fn can_execute(&self, ctx: &TaskContext) -> bool {
        self.source.can_execute(ctx)
            && self
                .select_item
                .is_none_or(|item| ctx.world().inventory_has_item(item))
    }

    fn step(&mut self, ctx: &mut TaskContext) -> Progress {
        self.ticks += 1;
        self.poll_camera();

        for _ in 0..MAX_CHAINED_PHASES {
            let event = match self.sub_task.drive(ctx) {
                SlotPoll::Running => {
                    trace!(
                        task = %self.description,
                        phase = %self.phase,
                        sub_task = self.sub_task.active_description().unwrap_or_default(),
                        "sub-task running"
                    );
                    return Progress::Continue;
                }
                SlotPoll::Finished(outcome) => self.on_sub_task(outcome),
                SlotPoll::Idle => match self.action_slot.poll() {
                    ActionPoll::Pending(kind) => {
                        trace!(task = %self.description, phase = %self.phase, %kind, "action pending");
                        return Progress::Continue;
                    }
                    ActionPoll::Ready(kind, result) => self.on_action(kind, result),
                    // Something was issued or started; poll it once right away.
                    ActionPoll::Idle => match self.run_phase(ctx) {
                        Some(event) => event,
                        None => continue,
                    },
                },
            };

            match transition(self.phase, &event) {
                Step::Stay => return Progress::Continue,
                Step::Advance(next) => {
                    debug!(task = %self.description, from = %self.phase, to = %next, "phase transition");
                    let from = std::mem::replace(&mut self.phase, next);
                    if next == Phase::WaitResponse {
                        self.waited = 0;
                        return Progress::Continue;
                    }
                    if from == Phase::RotateCamera && std::mem::take(&mut self.awaiting_view) {
                        return Progress::Continue;
                    }
                }
                Step::Complete => {
                    self.camera.detach();
                    return Progress::Complete;
                }
                Step::Fail(failure) => {
                    self.release();
                    return Progress::Fail(failure);
                }
            }
        }
        Progress::Continue
    }

    fn timeout_policy(&self) -> TimeoutPolicy {
        if self.phase == Phase::WaitResponse && self.signals.best_effort {
            TimeoutPolicy::Succeed
        } else {
            TimeoutPolicy::Fail
        }
    }

    fn reset(&mut self) {
        self.release();
        self.phase = self.initial_phase();
        self.clear_target();
        self.baseline = Baseline::default();
        self.despawn_retries = 0;
        self.rediscovering = false;
        self.retarget_attempts = 0;
        self.obstacle_attempts = 0;
        self.approach_attempts = 0;
        self.waited = 0;
        self.ticks = 0;
    }

    fn abandon(&mut self) {
        self.release();
    }
}
