//! Where an interaction's target comes from.
//!
//! The phase machine is the same for objects, NPCs and inventory items; a
//! [`TargetSource`] supplies the part that differs: how candidates are
//! discovered and how a chosen target is re-validated.
use world_core::{EntityId, EntityKey, Target, TargetQuery, WorldPoint};

use crate::context::TaskContext;

/// Outcome of re-validating a previously chosen target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Revalidation {
    /// Still there; carries the fresh snapshot.
    Present(Target),
    Missing,
    /// Still there but no longer where it was found.
    Moved(Target),
}

pub trait TargetSource: Send {
    /// Short noun phrase for descriptions and logs.
    fn describe(&self) -> String;

    fn discover(&self, ctx: &TaskContext) -> Vec<Target>;

    /// Looks the target up again before an irreversible action.
    ///
    /// `found_at` is where the target stood when it was discovered.
    fn revalidate(
        &self,
        ctx: &TaskContext,
        target: &Target,
        _found_at: Option<WorldPoint>,
    ) -> Revalidation {
        match ctx.world().refresh_target(target) {
            Some(current) => Revalidation::Present(current),
            None => Revalidation::Missing,
        }
    }

    /// Whether the player must stand next to the target to use it.
    fn requires_adjacency(&self) -> bool {
        true
    }

    fn can_execute(&self, _ctx: &TaskContext) -> bool {
        true
    }
}

/// Scene objects: trees, rocks, doors, banks.
#[derive(Clone, Debug)]
pub struct ObjectSource {
    query: TargetQuery,
    pinned: Option<EntityKey>,
}

impl ObjectSource {
    pub fn new(query: TargetQuery) -> Self {
        Self {
            query,
            pinned: None,
        }
    }

    /// Only accept the instance with this key.
    pub fn pinned(mut self, key: EntityKey) -> Self {
        self.pinned = Some(key);
        self
    }

    pub fn query(&self) -> &TargetQuery {
        &self.query
    }
}

impl TargetSource for ObjectSource {
    fn describe(&self) -> String {
        format!("object {}", self.query.primary_id)
    }

    fn discover(&self, ctx: &TaskContext) -> Vec<Target> {
        let radius = self.query.radius_or(ctx.config().search_radius);
        ctx.world()
            .find_objects_near(&self.query.ids(), radius)
            .into_iter()
            .filter(|target| self.query.matches(target.id))
            .filter(|target| self.pinned.is_none_or(|key| key == target.key))
            .collect()
    }
}

/// NPCs. They wander, so re-validation also checks how far they went.
#[derive(Clone, Debug)]
pub struct NpcSource {
    query: TargetQuery,
}

impl NpcSource {
    pub fn new(query: TargetQuery) -> Self {
        Self { query }
    }
}

impl TargetSource for NpcSource {
    fn describe(&self) -> String {
        format!("npc {}", self.query.primary_id)
    }

    fn discover(&self, ctx: &TaskContext) -> Vec<Target> {
        let radius = self.query.radius_or(ctx.config().search_radius);
        ctx.world()
            .find_npcs_near(&self.query.ids(), radius)
            .into_iter()
            .filter(|target| self.query.matches(target.id))
            .collect()
    }

    fn revalidate(
        &self,
        ctx: &TaskContext,
        target: &Target,
        found_at: Option<WorldPoint>,
    ) -> Revalidation {
        let Some(current) = ctx.world().refresh_target(target) else {
            return Revalidation::Missing;
        };
        let moved = match (found_at, current.position) {
            (Some(origin), Some(now)) => {
                origin.chebyshev_distance(now) > ctx.config().max_npc_movement
            }
            _ => false,
        };
        if moved {
            Revalidation::Moved(current)
        } else {
            Revalidation::Present(current)
        }
    }
}

/// An item in the player's inventory.
#[derive(Clone, Debug)]
pub struct InventorySource {
    item: EntityId,
}

impl InventorySource {
    pub fn new(item: EntityId) -> Self {
        Self { item }
    }
}

impl TargetSource for InventorySource {
    fn describe(&self) -> String {
        format!("item {}", self.item)
    }

    fn discover(&self, ctx: &TaskContext) -> Vec<Target> {
        ctx.world().inventory_item(self.item).into_iter().collect()
    }

    fn revalidate(
        &self,
        ctx: &TaskContext,
        _target: &Target,
        _found_at: Option<WorldPoint>,
    ) -> Revalidation {
        match ctx.world().inventory_item(self.item) {
            Some(current) => Revalidation::Present(current),
            None => Revalidation::Missing,
        }
    }

    fn requires_adjacency(&self) -> bool {
        false
    }

    fn can_execute(&self, ctx: &TaskContext) -> bool {
        ctx.world().inventory_has_item(self.item)
    }
}
