//! Evidence that the game reacted to an interaction.
use world_core::{AnimationId, EntityId, WidgetGroupId, WorldPoint, WorldSnapshot};

/// Which observations count as a successful response.
///
/// Checked once per tick during WAIT_RESPONSE, in this order:
///
/// 1. an expected dialogue widget is visible
/// 2. the player plays one of the expected animations
/// 3. with neither dialogue nor animations expected, the player is playing
///    any animation
/// 4. the player left the tile it stood on when the target was found
/// 5. the player is interacting with an entity
/// 6. the count of a watched inventory item changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuccessSignals {
    pub dialogue: Vec<WidgetGroupId>,
    pub animations: Vec<AnimationId>,
    pub position_change: bool,
    pub interacting: bool,
    pub inventory_change: Option<EntityId>,
    /// Treat the global timeout during WAIT_RESPONSE as success.
    pub best_effort: bool,
}

impl Default for SuccessSignals {
    fn default() -> Self {
        Self {
            dialogue: Vec::new(),
            animations: Vec::new(),
            position_change: true,
            interacting: true,
            inventory_change: None,
            best_effort: false,
        }
    }
}

impl SuccessSignals {
    pub fn expect_dialogue(mut self) -> Self {
        self.dialogue = WidgetGroupId::DIALOGUE.to_vec();
        self
    }

    pub fn expect_widgets(mut self, groups: impl IntoIterator<Item = WidgetGroupId>) -> Self {
        self.dialogue.extend(groups);
        self
    }

    pub fn expect_animations(mut self, animations: impl IntoIterator<Item = AnimationId>) -> Self {
        self.animations.extend(animations);
        self
    }

    pub fn without_position_change(mut self) -> Self {
        self.position_change = false;
        self
    }

    pub fn without_interacting(mut self) -> Self {
        self.interacting = false;
        self
    }

    pub fn watch_inventory(mut self, item: EntityId) -> Self {
        self.inventory_change = Some(item);
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// The first satisfied signal, as a short reason.
    pub fn observe(&self, world: &dyn WorldSnapshot, baseline: &Baseline) -> Option<&'static str> {
        if self.dialogue.iter().any(|group| world.widget_visible(*group)) {
            return Some("dialogue opened");
        }

        if self
            .animations
            .iter()
            .any(|animation| world.player_animating(Some(*animation)))
        {
            return Some("playing expected animation");
        }

        if self.animations.is_empty()
            && self.dialogue.is_empty()
            && world.player_animating(None)
        {
            return Some("animating");
        }

        if self.position_change
            && let (Some(start), Some(current)) = (baseline.position, world.player_position())
            && start != current
        {
            return Some("position changed");
        }

        if self.interacting && world.player_interacting() {
            return Some("interacting with entity");
        }

        if let Some(item) = self.inventory_change
            && Some(world.inventory_count(item)) != baseline.inventory
        {
            return Some("inventory changed");
        }

        None
    }
}

/// Player state recorded when the target was found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Baseline {
    pub position: Option<WorldPoint>,
    pub animation: Option<AnimationId>,
    /// Count of the watched item, if any.
    pub inventory: Option<u32>,
}

impl Baseline {
    pub fn capture(world: &dyn WorldSnapshot, signals: &SuccessSignals) -> Self {
        Self {
            position: world.player_position(),
            animation: world.player_animation(),
            inventory: signals
                .inventory_change
                .map(|item| world.inventory_count(item)),
        }
    }
}
