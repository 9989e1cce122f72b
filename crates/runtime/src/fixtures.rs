//! In-memory world, recording action port and tick harness for unit tests.
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use navigation::{
    GridCollision, LocalNavigator, LongRangeRouter, ObstacleDefinition, ObstacleRegistry,
};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use task_tree::Task;
use world_core::{
    AnimationId, BoundaryObject, CollisionFlags, CollisionSource, Direction, EntityId, EntityKey,
    ScreenPoint, ScreenRect, Target, TargetKind, WidgetGroupId, WorldPoint, WorldSnapshot,
};

use crate::api::{ActionError, ActionPort, ActionResult, Key};
use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::context::TaskContext;
use crate::humanize::Humanizer;

pub const DOOR_CLOSED: EntityId = EntityId(1530);
pub const DOOR_OPEN: EntityId = EntityId(1531);
const TREE: EntityId = EntityId(1276);
pub const GUIDE: EntityId = EntityId(3308);

const VIEWPORT: ScreenRect = ScreenRect::new(0, 0, 800, 600);
const MINIMAP_CENTER: ScreenPoint = ScreenPoint::new(680, 90);
const MINIMAP_PIXELS_PER_TILE: i32 = 4;
const MINIMAP_RADIUS: i32 = 18;

pub fn tree(key: u64, position: WorldPoint) -> Target {
    Target::new(EntityKey(key), TREE, TargetKind::Object, "Tree")
        .at(position)
        .with_clickbox(ScreenRect::new(380, 260, 40, 60))
        .with_actions(["Chop down", "Examine"])
}

pub fn guide(key: u64, position: WorldPoint) -> Target {
    Target::new(EntityKey(key), GUIDE, TargetKind::Npc, "Forester")
        .at(position)
        .with_clickbox(ScreenRect::new(300, 240, 30, 70))
        .with_actions(["Talk-to", "Examine"])
}

pub fn inventory_item(id: EntityId, slot: i32) -> Target {
    Target::new(
        EntityKey(u64::from(id.0)),
        id,
        TargetKind::InventoryItem,
        format!("Item {}", id.0),
    )
    .with_clickbox(ScreenRect::new(560 + (slot % 4) * 42, 210 + (slot / 4) * 36, 36, 32))
    .with_actions(["Use", "Drop"])
}

#[derive(Default)]
struct WorldState {
    player: Option<WorldPoint>,
    animation: Option<AnimationId>,
    interacting: bool,
    objects: HashMap<EntityKey, Target>,
    npcs: HashMap<EntityKey, Target>,
    inventory: HashMap<EntityId, (Option<Target>, u32)>,
    widgets: BTreeSet<WidgetGroupId>,
    missing_refreshes: u32,
    object_searches: u32,
    searches_by_id: HashMap<EntityId, u32>,
}

/// Mutable world snapshot.
#[derive(Default)]
pub struct FixtureWorld {
    state: Mutex<WorldState>,
}

impl FixtureWorld {
    pub fn new(player: WorldPoint) -> Self {
        let world = Self::default();
        world.set_player(player);
        world
    }

    pub fn set_player(&self, position: WorldPoint) {
        self.state.lock().player = Some(position);
    }

    pub fn set_animation(&self, animation: Option<AnimationId>) {
        self.state.lock().animation = animation;
    }

    pub fn set_interacting(&self, interacting: bool) {
        self.state.lock().interacting = interacting;
    }

    pub fn show_widget(&self, group: WidgetGroupId) {
        self.state.lock().widgets.insert(group);
    }

    pub fn add_object(&self, target: Target) {
        self.state.lock().objects.insert(target.key, target);
    }

    pub fn remove_object(&self, key: EntityKey) -> Option<Target> {
        self.state.lock().objects.remove(&key)
    }

    pub fn add_npc(&self, target: Target) {
        self.state.lock().npcs.insert(target.key, target);
    }

    pub fn move_npc(&self, key: EntityKey, to: WorldPoint) {
        if let Some(npc) = self.state.lock().npcs.get_mut(&key) {
            npc.position = Some(to);
        }
    }

    pub fn add_inventory_item(&self, target: Target, count: u32) {
        self.state
            .lock()
            .inventory
            .insert(target.id, (Some(target), count));
    }

    pub fn set_inventory(&self, id: EntityId, count: u32) {
        let mut state = self.state.lock();
        state.inventory.entry(id).or_insert((None, 0)).1 = count;
    }

    /// The next `count` refreshes report the target as gone.
    pub fn miss_refreshes(&self, count: u32) {
        self.state.lock().missing_refreshes = count;
    }

    pub fn object_searches(&self) -> u32 {
        self.state.lock().object_searches
    }

    pub fn object_searches_for(&self, id: EntityId) -> u32 {
        self.state
            .lock()
            .searches_by_id
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    /// Where `tile` currently sits on the minimap.
    pub fn minimap_for(&self, tile: WorldPoint) -> ScreenPoint {
        let player = self.state.lock().player.unwrap_or(tile);
        ScreenPoint::new(
            MINIMAP_CENTER.x + (tile.x - player.x) * MINIMAP_PIXELS_PER_TILE,
            MINIMAP_CENTER.y - (tile.y - player.y) * MINIMAP_PIXELS_PER_TILE,
        )
    }
}

fn near(targets: &HashMap<EntityKey, Target>, ids: &[EntityId], player: Option<WorldPoint>, radius: i32) -> Vec<Target> {
    let mut found: Vec<Target> = targets
        .values()
        .filter(|target| ids.contains(&target.id))
        .filter(|target| match (player, target.position) {
            (Some(player), Some(position)) => position.chebyshev_distance(player) <= radius,
            _ => false,
        })
        .cloned()
        .collect();
    found.sort_by_key(|target| target.key);
    found
}

impl WorldSnapshot for FixtureWorld {
    fn player_position(&self) -> Option<WorldPoint> {
        self.state.lock().player
    }

    fn player_animation(&self) -> Option<AnimationId> {
        self.state.lock().animation
    }

    fn player_interacting(&self) -> bool {
        self.state.lock().interacting
    }

    fn inventory_count(&self, id: EntityId) -> u32 {
        self.state
            .lock()
            .inventory
            .get(&id)
            .map_or(0, |(_, count)| *count)
    }

    fn inventory_is_full(&self) -> bool {
        let state = self.state.lock();
        state.inventory.values().filter(|(_, count)| *count > 0).count() >= 28
    }

    fn inventory_item(&self, id: EntityId) -> Option<Target> {
        match self.state.lock().inventory.get(&id) {
            Some((Some(target), count)) if *count > 0 => Some(target.clone()),
            _ => None,
        }
    }

    fn find_objects_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target> {
        let mut state = self.state.lock();
        state.object_searches += 1;
        for id in ids {
            *state.searches_by_id.entry(*id).or_default() += 1;
        }
        near(&state.objects, ids, state.player, radius)
    }

    fn find_npcs_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target> {
        let state = self.state.lock();
        near(&state.npcs, ids, state.player, radius)
    }

    fn refresh_target(&self, target: &Target) -> Option<Target> {
        let mut state = self.state.lock();
        if state.missing_refreshes > 0 {
            state.missing_refreshes -= 1;
            return None;
        }
        match target.kind {
            TargetKind::Object => state.objects.get(&target.key).cloned(),
            TargetKind::Npc => state.npcs.get(&target.key).cloned(),
            TargetKind::InventoryItem => match state.inventory.get(&target.id) {
                Some((Some(item), count)) if *count > 0 => Some(item.clone()),
                _ => None,
            },
            TargetKind::Widget => Some(target.clone()),
        }
    }

    fn widget_visible(&self, group: WidgetGroupId) -> bool {
        self.state.lock().widgets.contains(&group)
    }

    fn viewport(&self) -> ScreenRect {
        VIEWPORT
    }

    fn minimap_point(&self, tile: WorldPoint) -> Option<ScreenPoint> {
        let player = self.state.lock().player?;
        (tile.plane == player.plane && tile.chebyshev_distance(player) <= MINIMAP_RADIUS)
            .then(|| self.minimap_for(tile))
    }
}

/// Every request made through [`RecordingActions`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    MoveTo(ScreenPoint),
    Click,
    ClickTarget {
        key: EntityKey,
        action: Option<String>,
    },
    SelectMenu {
        action: String,
        target: Option<String>,
    },
    PressKey(Key),
    TypeText(String),
    Sleep(Duration),
    RotateCamera(WorldPoint),
}

type ClickHook = Arc<dyn Fn(&Target) + Send + Sync>;
type MoveHook = Arc<dyn Fn(ScreenPoint) + Send + Sync>;

/// Action port that records calls and resolves them immediately unless held.
pub struct RecordingActions {
    calls: Mutex<Vec<Call>>,
    held: AtomicBool,
    click_result: Mutex<ActionResult<bool>>,
    typing_error: Mutex<Option<ActionError>>,
    on_click: Mutex<Option<ClickHook>>,
    on_move: Mutex<Option<MoveHook>>,
}

impl Default for RecordingActions {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            held: AtomicBool::new(false),
            click_result: Mutex::new(Ok(true)),
            typing_error: Mutex::new(None),
            on_click: Mutex::new(None),
            on_move: Mutex::new(None),
        }
    }
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Leaves every new request pending until [`release`](Self::release).
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    pub fn reject_clicks(&self) {
        *self.click_result.lock() = Ok(false);
    }

    pub fn accept_clicks(&self) {
        *self.click_result.lock() = Ok(true);
    }

    pub fn fail_clicks(&self, error: ActionError) {
        *self.click_result.lock() = Err(error);
    }

    pub fn fail_typing(&self, error: ActionError) {
        *self.typing_error.lock() = Some(error);
    }

    /// Runs `hook` whenever a target is clicked, to script the world's answer.
    pub fn on_click(&self, hook: impl Fn(&Target) + Send + Sync + 'static) {
        *self.on_click.lock() = Some(Arc::new(hook));
    }

    /// Runs `hook` whenever the pointer lands somewhere.
    pub fn on_move(&self, hook: impl Fn(ScreenPoint) + Send + Sync + 'static) {
        *self.on_move.lock() = Some(Arc::new(hook));
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn gate(&self) -> impl Future<Output = ()> + Send + '_ {
        futures::future::poll_fn(move |_| {
            if self.held.load(Ordering::SeqCst) {
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
    }

    fn clicked(&self, target: Option<&Target>) -> ActionResult<bool> {
        let hook = self.on_click.lock().clone();
        if let (Some(hook), Some(target)) = (hook, target) {
            hook(target);
        }
        self.click_result.lock().clone()
    }
}

#[async_trait]
impl ActionPort for RecordingActions {
    async fn move_to(&self, point: ScreenPoint) -> ActionResult<()> {
        self.record(Call::MoveTo(point));
        self.gate().await;
        let hook = self.on_move.lock().clone();
        if let Some(hook) = hook {
            hook(point);
        }
        Ok(())
    }

    async fn click(&self) -> ActionResult<()> {
        self.record(Call::Click);
        self.gate().await;
        Ok(())
    }

    async fn click_target(&self, target: &Target, action: Option<&str>) -> ActionResult<bool> {
        self.record(Call::ClickTarget {
            key: target.key,
            action: action.map(str::to_string),
        });
        self.gate().await;
        self.clicked(Some(target))
    }

    async fn select_menu_entry(
        &self,
        _clickbox: ScreenRect,
        action: &str,
        target_name: Option<&str>,
    ) -> ActionResult<bool> {
        self.record(Call::SelectMenu {
            action: action.to_string(),
            target: target_name.map(str::to_string),
        });
        self.gate().await;
        self.clicked(None)
    }

    async fn press_key(&self, key: Key) -> ActionResult<()> {
        self.record(Call::PressKey(key));
        self.gate().await;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> ActionResult<()> {
        self.record(Call::TypeText(text.to_string()));
        self.gate().await;
        match self.typing_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn sleep(&self, duration: Duration) -> ActionResult<()> {
        self.record(Call::Sleep(duration));
        self.gate().await;
        Ok(())
    }

    async fn rotate_camera(&self, toward: WorldPoint) -> ActionResult<()> {
        self.record(Call::RotateCamera(toward));
        self.gate().await;
        Ok(())
    }
}

/// Collision grid that tests can edit while a navigator reads it.
#[derive(Default)]
pub struct SharedGrid {
    grid: RwLock<GridCollision>,
}

impl SharedGrid {
    pub fn new(grid: GridCollision) -> Self {
        Self {
            grid: RwLock::new(grid),
        }
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, GridCollision> {
        self.grid.write()
    }
}

impl CollisionSource for SharedGrid {
    fn flags(&self, tile: WorldPoint) -> Option<CollisionFlags> {
        self.grid.read().flags(tile)
    }

    fn boundary_objects(&self, tile: WorldPoint) -> Vec<BoundaryObject> {
        self.grid.read().boundary_objects(tile)
    }
}

const GRID_MAX: i32 = 40;

/// A task context over fixture ports plus handles to script them.
pub struct Harness {
    pub world: Arc<FixtureWorld>,
    pub actions: Arc<RecordingActions>,
    pub collision: Arc<SharedGrid>,
    pub clock: Arc<ManualClock>,
    pub ctx: TaskContext,
    next_door_key: u64,
}

impl Harness {
    pub fn new(player: WorldPoint) -> Self {
        let mut config = EngineConfig::default();
        config.humanization.camera_rotation_chance = 0.0;
        Self::with_navigation(player, config, None)
    }

    /// Harness whose navigator uses `config`'s local range and, beyond it,
    /// `router`.
    pub fn with_navigation(
        player: WorldPoint,
        config: EngineConfig,
        router: Option<Arc<dyn LongRangeRouter>>,
    ) -> Self {
        let world = Arc::new(FixtureWorld::new(player));
        let actions = Arc::new(RecordingActions::new());
        let collision = Arc::new(SharedGrid::new(GridCollision::bounded(
            WorldPoint::new(0, 0, player.plane),
            WorldPoint::new(GRID_MAX, GRID_MAX, player.plane),
        )));
        let clock = Arc::new(ManualClock::new());

        let obstacles = ObstacleRegistry::new().with(
            ObstacleDefinition::door("Door")
                .closed([DOOR_CLOSED])
                .open([DOOR_OPEN]),
        );
        let mut navigator = LocalNavigator::new(collision.clone())
            .with_obstacles(Arc::new(obstacles))
            .with_finder(config.path_finder());
        if let Some(router) = router {
            navigator = navigator.with_router(router);
        }

        let ctx = TaskContext::builder()
            .world(world.clone())
            .actions(actions.clone())
            .navigator(Arc::new(navigator))
            .clock(clock.clone())
            .humanizer(Humanizer::seeded(7))
            .config(config)
            .build()
            .expect("all ports provided");

        Self {
            world,
            actions,
            collision,
            clock,
            ctx,
            next_door_key: 1000,
        }
    }

    /// Executes one tick, then lets a game tick pass.
    pub fn tick<T: Task<TaskContext> + ?Sized>(&mut self, task: &mut T) {
        task.execute(&mut self.ctx);
        self.clock.advance(Duration::from_millis(600));
    }

    /// Places a closed door on the `side` edge of `tile`.
    pub fn add_door(&mut self, tile: WorldPoint, side: Direction) -> EntityKey {
        let key = EntityKey(self.next_door_key);
        self.next_door_key += 1;

        self.collision.write().add_boundary(BoundaryObject {
            key,
            id: DOOR_CLOSED,
            tile,
            side,
        });
        self.world.add_object(
            Target::new(key, DOOR_CLOSED, TargetKind::Object, "Door")
                .at(tile)
                .as_boundary()
                .with_clickbox(ScreenRect::new(420, 250, 24, 60))
                .with_actions(["Open", "Examine"]),
        );
        key
    }

    /// Walls off the east edge of column `x`, except where a door stands.
    pub fn wall_off_east(&mut self, x: i32) {
        let plane = self.world.player_position().map_or(0, |player| player.plane);
        let mut grid = self.collision.write();
        for y in 0..=GRID_MAX {
            let tile = WorldPoint::new(x, y, plane);
            if grid.boundary_objects(tile).is_empty() {
                grid.add_wall(tile, Direction::East);
            }
        }
    }
}
