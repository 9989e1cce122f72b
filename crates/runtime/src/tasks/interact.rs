use navigation::ObstacleCrossing;
use task_tree::Supervised;
use world_core::TargetQuery;

use crate::interaction::{InteractionMachine, NpcSource, ObjectSource, SuccessSignals};

pub type InteractObject = InteractionMachine<ObjectSource>;
pub type InteractNpc = InteractionMachine<NpcSource>;

/// Performs `action` on the best matching scene object.
pub fn interact_object(query: TargetQuery, action: impl Into<String>) -> InteractObject {
    InteractionMachine::new(ObjectSource::new(query)).with_action(action)
}

/// Performs `action` on the best matching NPC.
///
/// Talking usually opens a dialogue, so dialogue widgets count as a response
/// in addition to the defaults.
pub fn interact_npc(query: TargetQuery, action: impl Into<String>) -> InteractNpc {
    let action = action.into();
    let signals = if action.eq_ignore_ascii_case("talk-to") {
        SuccessSignals::default().expect_dialogue()
    } else {
        SuccessSignals::default()
    };
    InteractionMachine::new(NpcSource::new(query))
        .with_action(action)
        .with_signals(signals)
}

/// Opens the door or gate blocking a path.
pub(crate) fn open_obstacle(
    crossing: &ObstacleCrossing,
    radius: i32,
) -> Supervised<InteractObject> {
    let query = TargetQuery::new(crossing.object.id).within(radius);
    InteractionMachine::new(ObjectSource::new(query).pinned(crossing.object.key))
        .with_action(crossing.action.clone())
        .with_description(format!("{} {}", crossing.action, crossing.name))
        .into_task()
}

#[cfg(test)]
mod tests {
    use task_tree::TaskBody;
    use world_core::{BoundaryObject, Direction, EntityId, EntityKey, WorldPoint};

    use super::*;
    use crate::interaction::Phase;

    #[test]
    fn talking_expects_dialogue() {
        let task = interact_npc(TargetQuery::new(EntityId(3080)), "Talk-to");
        assert!(!task.signals().dialogue.is_empty());
        assert_eq!(task.description(), "Talk-to npc #3080");

        let attack = interact_npc(TargetQuery::new(EntityId(3080)), "Attack");
        assert!(attack.signals().dialogue.is_empty());
    }

    #[test]
    fn obstacle_task_targets_the_exact_door() {
        let crossing = ObstacleCrossing {
            object: BoundaryObject {
                key: EntityKey(77),
                id: EntityId(1530),
                tile: WorldPoint::new(3200, 3200, 0),
                side: Direction::East,
            },
            name: "Door".into(),
            kind: navigation::ObstacleKind::Door,
            action: "Open".into(),
            traversal_cost: 2,
            from: WorldPoint::new(3200, 3200, 0),
            to: WorldPoint::new(3201, 3200, 0),
        };

        let task = open_obstacle(&crossing, 5);
        assert_eq!(task.body().description(), "Open Door");
        assert_eq!(task.body().phase(), Phase::FindTarget);
    }
}
