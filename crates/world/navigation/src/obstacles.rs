//! Registry of doors, gates and other openable boundaries.
//!
//! Only objects registered here may be crossed by obstacle-aware searches.
//! An unregistered wall is a wall.

use std::collections::{BTreeSet, HashMap};

use world_core::{BoundaryObject, Direction, EntityId, WorldPoint};

use crate::CollisionMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum ObstacleKind {
    Door,
    Gate,
    Other,
}

/// Describes one openable obstacle type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleDefinition {
    pub name: String,
    pub kind: ObstacleKind,
    /// Object ids of the obstacle while it blocks movement.
    pub closed_ids: BTreeSet<EntityId>,
    /// Object ids of the obstacle once opened.
    pub open_ids: BTreeSet<EntityId>,
    /// Menu action that opens it.
    pub action: String,
    /// Extra path cost in ticks for crossing while closed.
    pub traversal_cost: u32,
}

impl ObstacleDefinition {
    pub fn new(name: impl Into<String>, kind: ObstacleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            closed_ids: BTreeSet::new(),
            open_ids: BTreeSet::new(),
            action: "Open".to_string(),
            traversal_cost: 2,
        }
    }

    pub fn door(name: impl Into<String>) -> Self {
        Self::new(name, ObstacleKind::Door)
    }

    pub fn gate(name: impl Into<String>) -> Self {
        Self::new(name, ObstacleKind::Gate).with_traversal_cost(3)
    }

    pub fn closed(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.closed_ids.extend(ids);
        self
    }

    pub fn open(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.open_ids.extend(ids);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_traversal_cost(mut self, cost: u32) -> Self {
        self.traversal_cost = cost;
        self
    }
}

/// A closed obstacle found on a path edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleCrossing {
    pub object: BoundaryObject,
    pub name: String,
    pub kind: ObstacleKind,
    pub action: String,
    pub traversal_cost: u32,
    pub from: WorldPoint,
    pub to: WorldPoint,
}

#[derive(Clone, Debug, Default)]
pub struct ObstacleRegistry {
    definitions: Vec<ObstacleDefinition>,
    by_closed_id: HashMap<EntityId, usize>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ObstacleDefinition) {
        let index = self.definitions.len();
        for id in &definition.closed_ids {
            self.by_closed_id.insert(*id, index);
        }
        self.definitions.push(definition);
    }

    pub fn with(mut self, definition: ObstacleDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definition for an object id in its closed state.
    pub fn closed(&self, id: EntityId) -> Option<&ObstacleDefinition> {
        self.by_closed_id
            .get(&id)
            .and_then(|index| self.definitions.get(*index))
    }

    pub fn is_open(&self, id: EntityId) -> bool {
        self.definitions
            .iter()
            .any(|definition| definition.open_ids.contains(&id))
    }

    /// The closed, registered obstacle blocking a cardinal step, if any.
    ///
    /// Diagonal steps never cross obstacles.
    pub fn crossing(
        &self,
        map: &CollisionMap<'_>,
        from: WorldPoint,
        direction: Direction,
    ) -> Option<ObstacleCrossing> {
        if direction.is_diagonal() {
            return None;
        }
        let to = from.step(direction);
        map.boundaries_on_edge(from, direction)
            .into_iter()
            .find_map(|object| {
                let definition = self.closed(object.id)?;
                Some(ObstacleCrossing {
                    name: definition.name.clone(),
                    kind: definition.kind,
                    action: definition.action.clone(),
                    traversal_cost: definition.traversal_cost,
                    object,
                    from,
                    to,
                })
            })
    }
}
