//! Interactable entities and the queries used to find them.

use std::collections::BTreeSet;

use crate::{EntityId, EntityKey, ScreenRect, WorldPoint};

/// What kind of entity a [`Target`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetKind {
    Object,
    Npc,
    InventoryItem,
    Widget,
}

/// Tiles occupied by a target, measured from its south-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    pub width: i32,
    pub height: i32,
}

impl Footprint {
    pub const SINGLE: Self = Self {
        width: 1,
        height: 1,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Footprint of an object definition placed with the given orientation.
    ///
    /// Odd orientations rotate the object a quarter turn, swapping its axes.
    pub const fn oriented(width: i32, height: i32, orientation: u8) -> Self {
        if orientation % 2 == 1 {
            Self::new(height, width)
        } else {
            Self::new(width, height)
        }
    }

    pub fn tiles(self, origin: WorldPoint) -> impl Iterator<Item = WorldPoint> {
        let width = self.width.max(1);
        let height = self.height.max(1);
        (0..width).flat_map(move |dx| (0..height).map(move |dy| origin.offset(dx, dy)))
    }

    pub fn contains(self, origin: WorldPoint, tile: WorldPoint) -> bool {
        tile.plane == origin.plane
            && tile.x >= origin.x
            && tile.y >= origin.y
            && tile.x < origin.x + self.width.max(1)
            && tile.y < origin.y + self.height.max(1)
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// A snapshot of one interactable entity.
///
/// `position` is `None` for entities without a world tile (inventory items,
/// widgets). `clickbox` is `None` when the entity is not currently rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub key: EntityKey,
    pub id: EntityId,
    pub kind: TargetKind,
    pub name: String,
    pub position: Option<WorldPoint>,
    pub footprint: Footprint,
    pub clickbox: Option<ScreenRect>,
    /// Menu options in display order. The first entry is the left-click default.
    pub actions: Vec<String>,
    /// Walls, doors and other edge-aligned objects.
    pub boundary: bool,
}

impl Target {
    pub fn new(key: EntityKey, id: EntityId, kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            key,
            id,
            kind,
            name: name.into(),
            position: None,
            footprint: Footprint::SINGLE,
            clickbox: None,
            actions: Vec::new(),
            boundary: false,
        }
    }

    pub fn at(mut self, position: WorldPoint) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn with_clickbox(mut self, clickbox: ScreenRect) -> Self {
        self.clickbox = Some(clickbox);
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_boundary(mut self) -> Self {
        self.boundary = true;
        self
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.clickbox.is_some()
    }

    pub fn default_action(&self) -> Option<&str> {
        self.actions.first().map(String::as_str)
    }

    /// True when `action` is what a plain left click would perform.
    pub fn is_default_action(&self, action: &str) -> bool {
        self.default_action()
            .is_some_and(|default| default.eq_ignore_ascii_case(action))
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(action))
    }

    /// Tiles covered by this target. Empty when it has no world position.
    pub fn occupied_tiles(&self) -> Vec<WorldPoint> {
        match self.position {
            Some(origin) => self.footprint.tiles(origin).collect(),
            None => Vec::new(),
        }
    }
}

/// Describes which entities satisfy an interaction.
///
/// A candidate matches when its id is the primary id or any alternate id.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetQuery {
    pub primary_id: EntityId,
    pub alternate_ids: BTreeSet<EntityId>,
    /// Search radius in tiles. `None` uses the engine default.
    pub search_radius: Option<i32>,
}

impl TargetQuery {
    pub fn new(primary_id: EntityId) -> Self {
        Self {
            primary_id,
            alternate_ids: BTreeSet::new(),
            search_radius: None,
        }
    }

    pub fn with_alternates(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.alternate_ids.extend(ids);
        self.alternate_ids.remove(&self.primary_id);
        self
    }

    pub fn within(mut self, radius: i32) -> Self {
        self.search_radius = Some(radius);
        self
    }

    pub fn radius_or(&self, default: i32) -> i32 {
        self.search_radius.unwrap_or(default)
    }

    pub fn matches(&self, id: EntityId) -> bool {
        id == self.primary_id || self.alternate_ids.contains(&id)
    }

    /// Primary id first, then alternates in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        std::iter::once(self.primary_id)
            .chain(self.alternate_ids.iter().copied())
            .collect()
    }
}
