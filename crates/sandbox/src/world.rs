//! Simulated game world.
//!
//! A small model of a tick-based client. The player walks one tile per tick.
//! Clicking a scene entity queues an interaction that starts once the player
//! stands next to it, and its [`Response`] plays out over the following
//! ticks. The camera always looks at the player from a fixed angle, so screen
//! positions are a plain projection of the tile offset.
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use navigation::{GridCollision, LocalNavigator, Navigator};
use parking_lot::RwLock;
use tracing::{debug, trace};
use world_core::{
    AnimationId, BoundaryObject, CollisionFlags, CollisionSource, Direction, EntityId, EntityKey,
    Footprint, ScreenPoint, ScreenRect, Target, TargetKind, WidgetGroupId, WorldPoint,
    WorldSnapshot,
};

/// Length of one game tick.
pub const TICK: Duration = Duration::from_millis(600);

pub const VIEWPORT: ScreenRect = ScreenRect::new(0, 0, 640, 480);
const VIEW_CENTER: ScreenPoint = ScreenPoint::new(320, 240);
const TILE_PIXELS: i32 = 32;
/// Entities are drawn taller than the tile they stand on.
const MODEL_HEIGHT: i32 = 16;

pub const MINIMAP_CENTER: ScreenPoint = ScreenPoint::new(720, 90);
const MINIMAP_PIXELS_PER_TILE: i32 = 4;
const MINIMAP_RADIUS: i32 = 17;

const INVENTORY_ORIGIN: ScreenPoint = ScreenPoint::new(650, 220);
const INVENTORY_COLUMNS: usize = 4;
const INVENTORY_SLOTS: usize = 28;
/// Inventory items get keys above every scene key.
const INVENTORY_KEY_BASE: u64 = 1 << 32;

/// Animation played while the player pushes a door open.
pub const DOOR_ANIMATION: AnimationId = AnimationId(832);

/// What the world does once an interaction starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Plays an animation for `ticks` ticks.
    Animate { animation: AnimationId, ticks: u32 },
    /// Plays an animation, then adds one `item` to the inventory.
    Gather {
        animation: AnimationId,
        ticks: u32,
        item: EntityId,
        name: String,
    },
    /// Opens a dialogue widget.
    Dialogue(WidgetGroupId),
    /// Frees the edge the door closes and turns it into `open_id`.
    OpenDoor { open_id: EntityId },
}

/// Scene object or NPC.
#[derive(Clone, Debug)]
pub struct SimEntity {
    pub id: EntityId,
    pub kind: TargetKind,
    pub name: String,
    pub position: WorldPoint,
    pub footprint: Footprint,
    pub actions: Vec<String>,
    responses: HashMap<String, Response>,
    boundary: bool,
    despawn_at: Option<u64>,
}

impl SimEntity {
    fn new(id: EntityId, kind: TargetKind, name: impl Into<String>, position: WorldPoint) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            position,
            footprint: Footprint::SINGLE,
            actions: Vec::new(),
            responses: HashMap::new(),
            boundary: false,
            despawn_at: None,
        }
    }

    pub fn object(id: EntityId, name: impl Into<String>, position: WorldPoint) -> Self {
        Self::new(id, TargetKind::Object, name, position)
    }

    pub fn npc(id: EntityId, name: impl Into<String>, position: WorldPoint) -> Self {
        Self::new(id, TargetKind::Npc, name, position)
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    /// Menu options, default first.
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Reaction to `action`. `"Use"` answers an item used on the entity.
    pub fn on(mut self, action: &str, response: Response) -> Self {
        self.responses.insert(action.to_ascii_lowercase(), response);
        self
    }

    /// Scene objects other than doors occupy their tiles.
    fn is_solid(&self) -> bool {
        self.kind == TargetKind::Object && !self.boundary
    }

    fn has_action(&self, action: &str) -> bool {
        self.actions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(action))
    }

    fn is_default_action(&self, action: &str) -> bool {
        self.actions
            .first()
            .is_some_and(|first| first.eq_ignore_ascii_case(action))
    }

    fn target(&self, key: EntityKey, player: WorldPoint) -> Target {
        let mut target = Target::new(key, self.id, self.kind, self.name.clone())
            .at(self.position)
            .with_footprint(self.footprint)
            .with_actions(self.actions.iter().cloned());
        if let Some(clickbox) = clickbox(player, self.position, self.footprint) {
            target = target.with_clickbox(clickbox);
        }
        if self.boundary {
            target = target.as_boundary();
        }
        target
    }
}

/// Item-on-item outcome: `other` is used up and `produce` appears.
#[derive(Clone, Debug)]
pub struct Recipe {
    pub produce: EntityId,
    pub name: String,
    pub animation: AnimationId,
}

/// Collision grid shared by the world and the engine's navigator.
#[derive(Default)]
pub struct SimCollision {
    grid: RwLock<GridCollision>,
}

impl SimCollision {
    pub fn new(grid: GridCollision) -> Self {
        Self {
            grid: RwLock::new(grid),
        }
    }

    pub fn edit<R>(&self, f: impl FnOnce(&mut GridCollision) -> R) -> R {
        f(&mut self.grid.write())
    }
}

impl CollisionSource for SimCollision {
    fn flags(&self, tile: WorldPoint) -> Option<CollisionFlags> {
        self.grid.read().flags(tile)
    }

    fn boundary_objects(&self, tile: WorldPoint) -> Vec<BoundaryObject> {
        self.grid.read().boundary_objects(tile)
    }
}

struct InventorySlot {
    id: EntityId,
    name: String,
    count: u32,
}

struct Pending {
    key: EntityKey,
    action: String,
    path: VecDeque<WorldPoint>,
}

struct SimState {
    tick: u64,
    player: WorldPoint,
    animation: Option<AnimationId>,
    animation_ticks: u32,
    /// Item granted when the current animation ends.
    reward: Option<(EntityId, String)>,
    interacting: Option<EntityKey>,
    walk: VecDeque<WorldPoint>,
    pending: Option<Pending>,
    entities: HashMap<EntityKey, SimEntity>,
    inventory: Vec<InventorySlot>,
    selected: Option<EntityId>,
    widgets: BTreeSet<WidgetGroupId>,
    recipes: HashMap<(EntityId, EntityId), Recipe>,
    next_key: u64,
}

impl SimState {
    fn add_item(&mut self, id: EntityId, name: &str, count: u32) {
        match self.inventory.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => slot.count += count,
            None => self.inventory.push(InventorySlot {
                id,
                name: name.to_string(),
                count,
            }),
        }
    }

    fn remove_item(&mut self, id: EntityId) -> bool {
        let Some(index) = self.inventory.iter().position(|slot| slot.id == id) else {
            return false;
        };
        self.inventory[index].count -= 1;
        if self.inventory[index].count == 0 {
            self.inventory.remove(index);
        }
        true
    }

    fn animate(&mut self, animation: AnimationId, ticks: u32) {
        self.animation = Some(animation);
        self.animation_ticks = ticks.max(1);
    }

    /// A new click interrupts whatever the player was doing.
    fn interrupt(&mut self) {
        self.walk.clear();
        self.pending = None;
        self.animation = None;
        self.animation_ticks = 0;
        self.reward = None;
        self.interacting = None;
    }
}

/// In-memory world implementing [`WorldSnapshot`].
pub struct SimWorld {
    state: RwLock<SimState>,
    collision: Arc<SimCollision>,
    navigator: LocalNavigator,
}

impl SimWorld {
    pub fn new(player: WorldPoint, grid: GridCollision) -> Self {
        let collision = Arc::new(SimCollision::new(grid));
        // No obstacle registry: closed doors are plain walls to the player
        let navigator = LocalNavigator::new(collision.clone());
        Self {
            state: RwLock::new(SimState {
                tick: 0,
                player,
                animation: None,
                animation_ticks: 0,
                reward: None,
                interacting: None,
                walk: VecDeque::new(),
                pending: None,
                entities: HashMap::new(),
                inventory: Vec::new(),
                selected: None,
                widgets: BTreeSet::new(),
                recipes: HashMap::new(),
                next_key: 1,
            }),
            collision,
            navigator,
        }
    }

    pub fn collision(&self) -> Arc<SimCollision> {
        Arc::clone(&self.collision)
    }

    pub fn tick_count(&self) -> u64 {
        self.state.read().tick
    }

    pub fn player(&self) -> WorldPoint {
        self.state.read().player
    }

    pub fn spawn(&self, entity: SimEntity) -> EntityKey {
        let mut state = self.state.write();
        let key = EntityKey(state.next_key);
        state.next_key += 1;
        debug!(%key, id = %entity.id, name = %entity.name, at = %entity.position, "spawned");
        if entity.is_solid() {
            self.collision.edit(|grid| {
                for tile in entity.footprint.tiles(entity.position) {
                    grid.block(tile);
                }
            });
        }
        state.entities.insert(key, entity);
        key
    }

    fn clear_tiles(&self, entity: &SimEntity) {
        if entity.is_solid() {
            self.collision.edit(|grid| {
                for tile in entity.footprint.tiles(entity.position) {
                    grid.remove_flags(tile, CollisionFlags::OBJECT);
                }
            });
        }
    }

    /// Places a closed door on the `side` edge of `tile`.
    pub fn add_door(
        &self,
        tile: WorldPoint,
        side: Direction,
        closed: EntityId,
        open: EntityId,
    ) -> EntityKey {
        let mut door = SimEntity::object(closed, "Door", tile)
            .with_actions(["Open", "Examine"])
            .on("Open", Response::OpenDoor { open_id: open });
        door.boundary = true;
        let key = self.spawn(door);
        self.collision.edit(|grid| {
            grid.add_boundary(BoundaryObject {
                key,
                id: closed,
                tile,
                side,
            })
        });
        key
    }

    pub fn despawn(&self, key: EntityKey) -> bool {
        let mut state = self.state.write();
        if state.pending.as_ref().is_some_and(|pending| pending.key == key) {
            state.pending = None;
        }
        match state.entities.remove(&key) {
            Some(entity) => {
                self.clear_tiles(&entity);
                true
            }
            None => false,
        }
    }

    /// Removes the entity `ticks` ticks from now.
    pub fn despawn_in(&self, key: EntityKey, ticks: u64) {
        let mut state = self.state.write();
        let at = state.tick + ticks;
        if let Some(entity) = state.entities.get_mut(&key) {
            entity.despawn_at = Some(at);
        }
    }

    pub fn move_entity(&self, key: EntityKey, to: WorldPoint) -> bool {
        let mut state = self.state.write();
        match state.entities.get_mut(&key) {
            Some(entity) => {
                entity.position = to;
                true
            }
            None => false,
        }
    }

    pub fn give_item(&self, id: EntityId, name: &str, count: u32) {
        self.state.write().add_item(id, name, count);
    }

    pub fn add_recipe(&self, item: EntityId, other: EntityId, recipe: Recipe) {
        self.state.write().recipes.insert((item, other), recipe);
    }

    /// Advances one game tick.
    pub fn advance(&self) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.tick += 1;
        let tick = state.tick;

        state.entities.retain(|key, entity| {
            let keep = entity.despawn_at.is_none_or(|at| at > tick);
            if !keep {
                debug!(%key, name = %entity.name, "despawned");
                self.clear_tiles(entity);
            }
            keep
        });
        if let Some(pending) = &state.pending
            && !state.entities.contains_key(&pending.key)
        {
            state.pending = None;
        }

        if state.animation_ticks > 0 {
            state.animation_ticks -= 1;
            if state.animation_ticks == 0 {
                state.animation = None;
                state.interacting = None;
                if let Some((item, name)) = state.reward.take() {
                    state.add_item(item, &name, 1);
                    debug!(%item, %name, "item received");
                }
            }
        }

        if let Some(next) = state.walk.pop_front() {
            state.player = next;
            trace!(player = %next, "walked");
        } else if let Some(pending) = state.pending.as_mut() {
            match pending.path.pop_front() {
                Some(next) => state.player = next,
                None => {
                    if let Some(pending) = state.pending.take() {
                        self.respond(state, pending);
                    }
                }
            }
        }
    }

    fn respond(&self, state: &mut SimState, pending: Pending) {
        let Some(entity) = state.entities.get_mut(&pending.key) else {
            return;
        };
        let Some(response) = entity.responses.get(&pending.action).cloned() else {
            trace!(action = %pending.action, name = %entity.name, "nothing interesting happens");
            return;
        };
        debug!(action = %pending.action, name = %entity.name, ?response, "interaction started");

        let is_npc = entity.kind == TargetKind::Npc;
        match response {
            Response::Animate { animation, ticks } => state.animate(animation, ticks),
            Response::Gather {
                animation,
                ticks,
                item,
                name,
            } => {
                state.animate(animation, ticks);
                state.reward = Some((item, name));
            }
            Response::Dialogue(group) => {
                state.widgets.insert(group);
            }
            Response::OpenDoor { open_id } => {
                entity.id = open_id;
                entity.actions = vec!["Close".to_string(), "Examine".to_string()];
                entity.responses.clear();
                self.collision.edit(|grid| grid.remove_boundary(pending.key));
                state.animate(DOOR_ANIMATION, 1);
            }
        }
        if is_npc {
            state.interacting = Some(pending.key);
        }
    }

    /// Left click on an entity. False when the click would not perform
    /// `action`.
    pub(crate) fn click_entity(&self, key: EntityKey, action: Option<&str>) -> bool {
        if key.0 >= INVENTORY_KEY_BASE {
            return self.click_item(key, action);
        }
        let mut state = self.state.write();
        let Some(entity) = state.entities.get(&key) else {
            return false;
        };
        let using = state.selected.is_some();
        if !using
            && let Some(action) = action
            && !entity.is_default_action(action)
        {
            return false;
        }
        let action = match (using, entity.actions.first()) {
            (true, _) => "use".to_string(),
            (false, Some(default)) => default.to_ascii_lowercase(),
            (false, None) => return false,
        };
        drop(state);
        self.interact(key, action)
    }

    /// Right click inside `clickbox` and pick `action`.
    pub(crate) fn click_menu(&self, area: ScreenRect, action: &str, name: Option<&str>) -> bool {
        let key = {
            let state = self.state.read();
            let player = state.player;
            state
                .entities
                .iter()
                .filter(|(_, entity)| entity.has_action(action))
                .filter(|(_, entity)| name.is_none_or(|name| entity.name.eq_ignore_ascii_case(name)))
                .find(|(_, entity)| {
                    clickbox(player, entity.position, entity.footprint)
                        .is_some_and(|rect| rect.intersection(&area).is_some())
                })
                .map(|(key, _)| *key)
        };
        match key {
            Some(key) => self.interact(key, action.to_ascii_lowercase()),
            None => false,
        }
    }

    fn interact(&self, key: EntityKey, action: String) -> bool {
        let mut state = self.state.write();
        state.selected = None;
        let Some(entity) = state.entities.get(&key) else {
            return false;
        };
        let target = entity.target(key, state.player);
        let path = self.navigator.find_reachable_adjacent(state.player, &target);
        state.interrupt();

        match path {
            Some(path) if path.obstacle.is_none() => {
                trace!(%key, %action, steps = path.steps(), "interaction queued");
                state.pending = Some(Pending {
                    key,
                    action,
                    path: path.tiles.into_iter().skip(1).collect(),
                });
            }
            _ => debug!(%key, %action, "cannot reach"),
        }
        true
    }

    fn click_item(&self, key: EntityKey, action: Option<&str>) -> bool {
        let Ok(raw) = u32::try_from(key.0 - INVENTORY_KEY_BASE) else {
            return false;
        };
        let id = EntityId(raw);
        let mut guard = self.state.write();
        let state = &mut *guard;
        if !state.inventory.iter().any(|slot| slot.id == id) {
            return false;
        }

        if action.is_some_and(|action| action.eq_ignore_ascii_case("use")) {
            state.selected = Some(id);
            return true;
        }
        let Some(item) = state.selected.take() else {
            return action.is_none();
        };

        let recipe = state
            .recipes
            .get(&(item, id))
            .or_else(|| state.recipes.get(&(id, item)))
            .cloned();
        match recipe {
            Some(recipe) => {
                state.interrupt();
                state.remove_item(id);
                state.animate(recipe.animation, 2);
                state.reward = Some((recipe.produce, recipe.name));
            }
            None => trace!(%item, other = %id, "nothing interesting happens"),
        }
        true
    }

    /// Walk order from a minimap click.
    pub(crate) fn click_minimap(&self, point: ScreenPoint) -> bool {
        let dx = point.x - MINIMAP_CENTER.x;
        let dy = MINIMAP_CENTER.y - point.y;
        let range = MINIMAP_RADIUS * MINIMAP_PIXELS_PER_TILE;
        if dx.abs() > range || dy.abs() > range {
            return false;
        }

        let mut state = self.state.write();
        let destination = state
            .player
            .offset(dx / MINIMAP_PIXELS_PER_TILE, dy / MINIMAP_PIXELS_PER_TILE);
        let path = self.navigator.find_path(state.player, destination, false);
        state.interrupt();
        match path {
            Some(path) => {
                trace!(%destination, steps = path.tiles.len(), "walking");
                state.walk = path.tiles.into_iter().skip(1).collect();
            }
            None => debug!(%destination, "no path"),
        }
        true
    }

    /// Advances an open dialogue; the conversations here are one line long.
    pub(crate) fn continue_dialogue(&self) -> bool {
        let mut state = self.state.write();
        let open = WidgetGroupId::DIALOGUE
            .iter()
            .any(|group| state.widgets.contains(group));
        if open {
            state.widgets.retain(|group| !WidgetGroupId::DIALOGUE.contains(group));
            state.interacting = None;
        }
        open
    }

    pub(crate) fn close_interfaces(&self) {
        let mut state = self.state.write();
        state.widgets.clear();
        state.selected = None;
    }
}

fn project(player: WorldPoint, tile: WorldPoint) -> ScreenPoint {
    ScreenPoint::new(
        VIEW_CENTER.x + (tile.x - player.x) * TILE_PIXELS,
        VIEW_CENTER.y - (tile.y - player.y) * TILE_PIXELS,
    )
}

/// Clickbox of an entity, when fully on screen.
fn clickbox(player: WorldPoint, position: WorldPoint, footprint: Footprint) -> Option<ScreenRect> {
    if position.plane != player.plane {
        return None;
    }
    // Anchor on the north-west tile so the box grows right and down
    let anchor = project(player, position.offset(0, footprint.height.max(1) - 1));
    let width = TILE_PIXELS * footprint.width.max(1);
    let height = TILE_PIXELS * footprint.height.max(1) + MODEL_HEIGHT;
    let rect = ScreenRect::new(
        anchor.x - TILE_PIXELS / 2,
        anchor.y - TILE_PIXELS / 2 - MODEL_HEIGHT,
        width,
        height,
    );
    VIEWPORT.contains_rect(&rect).then_some(rect)
}

fn inventory_clickbox(slot: usize) -> ScreenRect {
    let column = (slot % INVENTORY_COLUMNS) as i32;
    let row = (slot / INVENTORY_COLUMNS) as i32;
    ScreenRect::new(
        INVENTORY_ORIGIN.x + column * 36,
        INVENTORY_ORIGIN.y + row * 32,
        32,
        28,
    )
}

impl SimWorld {
    fn near(&self, kind: TargetKind, ids: &[EntityId], radius: i32) -> Vec<Target> {
        let state = self.state.read();
        let player = state.player;
        let mut found: Vec<Target> = state
            .entities
            .iter()
            .filter(|(_, entity)| entity.kind == kind && ids.contains(&entity.id))
            .filter(|(_, entity)| {
                entity.position.plane == player.plane
                    && entity
                        .footprint
                        .tiles(entity.position)
                        .any(|tile| tile.chebyshev_distance(player) <= radius)
            })
            .map(|(key, entity)| entity.target(*key, player))
            .collect();
        found.sort_by_key(|target| target.key);
        found
    }
}

impl WorldSnapshot for SimWorld {
    fn player_position(&self) -> Option<WorldPoint> {
        Some(self.state.read().player)
    }

    fn player_animation(&self) -> Option<AnimationId> {
        self.state.read().animation
    }

    fn player_interacting(&self) -> bool {
        self.state.read().interacting.is_some()
    }

    fn inventory_count(&self, id: EntityId) -> u32 {
        self.state
            .read()
            .inventory
            .iter()
            .filter(|slot| slot.id == id)
            .map(|slot| slot.count)
            .sum()
    }

    fn inventory_is_full(&self) -> bool {
        self.state.read().inventory.len() >= INVENTORY_SLOTS
    }

    fn inventory_item(&self, id: EntityId) -> Option<Target> {
        let state = self.state.read();
        let (slot, item) = state
            .inventory
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.id == id)?;
        Some(
            Target::new(
                EntityKey(INVENTORY_KEY_BASE + u64::from(id.0)),
                id,
                TargetKind::InventoryItem,
                item.name.clone(),
            )
            .with_clickbox(inventory_clickbox(slot))
            .with_actions(["Use", "Drop"]),
        )
    }

    fn find_objects_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target> {
        self.near(TargetKind::Object, ids, radius)
    }

    fn find_npcs_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target> {
        self.near(TargetKind::Npc, ids, radius)
    }

    fn refresh_target(&self, target: &Target) -> Option<Target> {
        if target.kind == TargetKind::InventoryItem {
            return self.inventory_item(target.id);
        }
        let state = self.state.read();
        state
            .entities
            .get(&target.key)
            .filter(|entity| entity.kind == target.kind)
            .map(|entity| entity.target(target.key, state.player))
    }

    fn widget_visible(&self, group: WidgetGroupId) -> bool {
        self.state.read().widgets.contains(&group)
    }

    fn viewport(&self) -> ScreenRect {
        VIEWPORT
    }

    fn minimap_point(&self, tile: WorldPoint) -> Option<ScreenPoint> {
        let player = self.state.read().player;
        if tile.plane != player.plane || tile.chebyshev_distance(player) > MINIMAP_RADIUS {
            return None;
        }
        Some(ScreenPoint::new(
            MINIMAP_CENTER.x + (tile.x - player.x) * MINIMAP_PIXELS_PER_TILE,
            MINIMAP_CENTER.y - (tile.y - player.y) * MINIMAP_PIXELS_PER_TILE,
        ))
    }
}
