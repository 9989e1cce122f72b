//! Item-on-X interactions.
//!
//! All three select the source item with "Use" first, then click the
//! target's default option.
use world_core::{EntityId, TargetQuery};

use super::{InteractNpc, InteractObject};
use crate::interaction::{InteractionMachine, InventorySource, NpcSource, ObjectSource, SuccessSignals};

pub type UseItemOnItem = InteractionMachine<InventorySource>;

pub fn use_item_on_object(item: EntityId, query: TargetQuery) -> InteractObject {
    let description = format!("Use item {item} on object {}", query.primary_id);
    InteractionMachine::new(ObjectSource::new(query))
        .using_item(item)
        .with_signals(SuccessSignals::default().watch_inventory(item))
        .with_description(description)
}

pub fn use_item_on_npc(item: EntityId, query: TargetQuery) -> InteractNpc {
    let description = format!("Use item {item} on npc {}", query.primary_id);
    InteractionMachine::new(NpcSource::new(query))
        .using_item(item)
        .with_signals(SuccessSignals::default().expect_dialogue())
        .with_description(description)
}

/// Uses `item` on `other`, both in the inventory.
///
/// The player does not move, so success is a new animation, a dialogue
/// (make-X prompts) or a change in the count of `other`.
pub fn use_item_on_item(item: EntityId, other: EntityId) -> UseItemOnItem {
    InteractionMachine::new(InventorySource::new(other))
        .using_item(item)
        .with_signals(
            SuccessSignals::default()
                .without_position_change()
                .without_interacting()
                .watch_inventory(other),
        )
        .with_description(format!("Use item {item} on item {other}"))
}

#[cfg(test)]
mod tests {
    use task_tree::{Task, TaskFailure, TaskState};
    use world_core::{AnimationId, EntityKey, WorldPoint};

    use super::*;
    use crate::fixtures::{Call, Harness, inventory_item};
    use crate::interaction::Phase;

    const KNIFE: EntityId = EntityId(946);
    const LOGS: EntityId = EntityId(1511);

    #[test]
    fn item_on_item_selects_source_then_clicks_other() {
        let mut harness = Harness::new(WorldPoint::new(10, 10, 0));
        harness.world.add_inventory_item(inventory_item(KNIFE, 0), 1);
        harness.world.add_inventory_item(inventory_item(LOGS, 1), 2);
        let mut task = use_item_on_item(KNIFE, LOGS).into_task();

        assert!(task.can_execute(&harness.ctx));
        harness.tick(&mut task);
        assert_eq!(task.body().phase(), Phase::WaitResponse);

        let clicked: Vec<Call> = harness.actions.calls();
        assert!(matches!(
            clicked.first(),
            Some(Call::ClickTarget { action: Some(action), .. }) if action == "Use"
        ));
        assert!(matches!(
            clicked.last(),
            Some(Call::ClickTarget { key, action: None }) if *key == EntityKey(u64::from(LOGS.0))
        ));

        harness.world.set_inventory(LOGS, 1);
        harness.tick(&mut task);
        assert_eq!(task.state(), TaskState::Completed);
    }

    #[test]
    fn missing_source_item_blocks_execution() {
        let mut harness = Harness::new(WorldPoint::new(10, 10, 0));
        harness.world.add_inventory_item(inventory_item(LOGS, 1), 2);
        let mut task = use_item_on_item(KNIFE, LOGS).into_task();

        assert!(!task.can_execute(&harness.ctx));
        // Driving it anyway fails at selection, not with a despawn
        harness.tick(&mut task);
        assert!(matches!(
            task.failure(),
            Some(TaskFailure::TargetNotFound(_))
        ));
    }

    #[test]
    fn item_on_object_animates() {
        let mut harness = Harness::new(WorldPoint::new(10, 10, 0));
        harness.world.add_inventory_item(inventory_item(KNIFE, 0), 1);
        harness
            .world
            .add_object(crate::fixtures::tree(5, WorldPoint::new(12, 10, 0)));
        let mut task = use_item_on_object(KNIFE, TargetQuery::new(EntityId(1276))).into_task();

        harness.tick(&mut task);
        assert_eq!(task.body().phase(), Phase::WaitResponse);
        harness.world.set_animation(Some(AnimationId(1248)));
        harness.tick(&mut task);
        assert_eq!(task.state(), TaskState::Completed);
    }
}
