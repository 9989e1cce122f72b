//! Read-only view of the live game state.
//!
//! The snapshot is re-queried on every call and nothing it returns is
//! guaranteed to still hold on the next call: targets despawn, widgets close,
//! the player moves. Consumers must re-validate before acting.

use crate::{AnimationId, EntityId, ScreenPoint, ScreenRect, Target, WidgetGroupId, WorldPoint};

/// World snapshot port consumed by the interaction engine.
pub trait WorldSnapshot: Send + Sync {
    /// Current player tile, or `None` while the client is not logged in.
    fn player_position(&self) -> Option<WorldPoint>;

    /// Animation currently played by the player, `None` when idle.
    fn player_animation(&self) -> Option<AnimationId>;

    /// With `Some(id)`, whether the player is playing that animation;
    /// with `None`, whether the player is animating at all.
    fn player_animating(&self, animation: Option<AnimationId>) -> bool {
        match (self.player_animation(), animation) {
            (Some(current), Some(expected)) => current == expected,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Whether the player is interacting with (facing, talking to, fighting)
    /// another entity.
    fn player_interacting(&self) -> bool;

    fn inventory_count(&self, id: EntityId) -> u32;

    fn inventory_has_item(&self, id: EntityId) -> bool {
        self.inventory_count(id) > 0
    }

    fn inventory_is_full(&self) -> bool;

    /// First inventory slot holding `id`, as a clickable target.
    fn inventory_item(&self, id: EntityId) -> Option<Target>;

    /// Objects with any of `ids` within `radius` tiles of the player.
    fn find_objects_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target>;

    /// NPCs with any of `ids` within `radius` tiles of the player.
    fn find_npcs_near(&self, ids: &[EntityId], radius: i32) -> Vec<Target>;

    /// Looks up the current state of a previously discovered target by key.
    ///
    /// Returns `None` once the instance has despawned.
    fn refresh_target(&self, target: &Target) -> Option<Target>;

    fn widget_visible(&self, group: WidgetGroupId) -> bool;

    /// Canvas region where the 3D scene is drawn.
    fn viewport(&self) -> ScreenRect;

    /// Minimap pixel that walks to `tile` when clicked, if it is on the minimap.
    fn minimap_point(&self, tile: WorldPoint) -> Option<ScreenPoint>;
}
