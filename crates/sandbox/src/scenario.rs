//! Ready-made worlds and a lock-step harness for driving them.
use std::sync::Arc;

use navigation::{GridCollision, LocalNavigator, ObstacleDefinition, ObstacleRegistry};
use runtime::tasks::{interact_npc, interact_object, press_key, use_item_on_item, walk_to};
use runtime::{
    Clock, EngineConfig, Key, ManualClock, SuccessSignals, TaskContext, TaskReport, TaskRunner,
};
use task_tree::Task;
use task_tree::builder::{repeat_until, wait_until};
use world_core::{
    AnimationId, Direction, EntityId, TargetQuery, WidgetGroupId, WorldPoint, WorldSnapshot,
};

use crate::device::SimDevice;
use crate::world::{Recipe, Response, SimEntity, SimWorld, TICK};

pub const TREE: EntityId = EntityId(1276);
pub const LOGS: EntityId = EntityId(1511);
pub const KNIFE: EntityId = EntityId(946);
pub const ARROW_SHAFTS: EntityId = EntityId(52);
pub const DOOR_CLOSED: EntityId = EntityId(1530);
pub const DOOR_OPEN: EntityId = EntityId(1531);
pub const GUIDE: EntityId = EntityId(3308);

pub const CHOP: AnimationId = AnimationId(879);
pub const FLETCH: AnimationId = AnimationId(1248);

const MAP_SIZE: i32 = 48;

fn p(x: i32, y: i32) -> WorldPoint {
    WorldPoint::new(x, y, 0)
}

/// Doors the engine knows how to open.
pub fn obstacles() -> ObstacleRegistry {
    ObstacleRegistry::new().with(
        ObstacleDefinition::door("Door")
            .closed([DOOR_CLOSED])
            .open([DOOR_OPEN]),
    )
}

/// Builds an engine context over `world`, driving it with `device`.
pub fn context(
    world: Arc<SimWorld>,
    device: Arc<SimDevice>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
) -> runtime::Result<TaskContext> {
    let navigator = LocalNavigator::new(world.collision())
        .with_obstacles(Arc::new(obstacles()))
        .with_finder(config.path_finder());
    TaskContext::builder()
        .world(world)
        .actions(device)
        .navigator(Arc::new(navigator))
        .clock(clock)
        .config(config)
        .build()
}

pub fn tree(at: WorldPoint) -> SimEntity {
    SimEntity::object(TREE, "Tree", at)
        .with_actions(["Chop down", "Examine"])
        .on(
            "Chop down",
            Response::Gather {
                animation: CHOP,
                ticks: 4,
                item: LOGS,
                name: "Logs".into(),
            },
        )
}

pub fn guide(at: WorldPoint) -> SimEntity {
    SimEntity::npc(GUIDE, "Forester", at)
        .with_actions(["Talk-to", "Examine"])
        .on("Talk-to", Response::Dialogue(WidgetGroupId::NPC_DIALOGUE))
}

/// An empty, open map with the player at `player`.
pub fn meadow(player: WorldPoint) -> SimWorld {
    SimWorld::new(player, GridCollision::bounded(p(0, 0), p(MAP_SIZE, MAP_SIZE)))
}

/// A walled cabin with a closed door on its east side, trees and a forester
/// outside, and a knife in the inventory.
///
/// The cabin spans x 8..=12, y 8..=12. The player starts inside at (10, 10)
/// and the door sits on the east edge of (12, 10).
pub fn forest() -> SimWorld {
    let mut grid = GridCollision::bounded(p(0, 0), p(MAP_SIZE, MAP_SIZE));
    for y in 8..=12 {
        grid.add_wall(p(8, y), Direction::West);
        if y != 10 {
            grid.add_wall(p(12, y), Direction::East);
        }
    }
    for x in 8..=12 {
        grid.add_wall(p(x, 12), Direction::North);
        grid.add_wall(p(x, 8), Direction::South);
    }

    let world = SimWorld::new(p(10, 10), grid);
    world.add_door(p(12, 10), Direction::East, DOOR_CLOSED, DOOR_OPEN);
    world.spawn(tree(p(16, 10)));
    world.spawn(tree(p(17, 13)));
    world.spawn(tree(p(15, 6)));
    world.spawn(guide(p(18, 9)));

    world.give_item(KNIFE, "Knife", 1);
    world.add_recipe(
        KNIFE,
        LOGS,
        Recipe {
            produce: ARROW_SHAFTS,
            name: "Arrow shafts".into(),
            animation: FLETCH,
        },
    );
    world
}

/// Signals for gathering: the player must start chopping, walking is not
/// enough.
pub fn chopping() -> SuccessSignals {
    SuccessSignals::default()
        .without_position_change()
        .expect_animations([CHOP])
}

/// Chops until `logs` are in the inventory, waiting out each swing.
pub fn chop_logs(logs: u32) -> Box<dyn Task<TaskContext>> {
    repeat_until(
        format!("Chop {logs} logs"),
        vec![
            Box::new(
                interact_object(TargetQuery::new(TREE), "Chop down")
                    .with_signals(chopping())
                    .into_task(),
            ) as Box<dyn Task<TaskContext>>,
            wait_until(
                "Wait until idle",
                |ctx: &TaskContext| ctx.world().player_animation().is_none(),
                12,
            ),
        ],
        logs * 2,
        move |ctx: &TaskContext| ctx.world().inventory_count(LOGS) >= logs,
    )
}

/// Talks to the forester and clicks through the reply.
pub fn talk_to_guide() -> Vec<Box<dyn Task<TaskContext>>> {
    vec![
        Box::new(
            interact_npc(TargetQuery::new(GUIDE), "Talk-to")
                .with_signals(
                    SuccessSignals::default()
                        .without_position_change()
                        .expect_dialogue(),
                )
                .into_task(),
        ) as Box<dyn Task<TaskContext>>,
        Box::new(press_key(Key::Space)),
    ]
}

/// The demo run: leave the cabin for logs, fletch one, chat, then walk off.
pub fn demo_tasks() -> Vec<Box<dyn Task<TaskContext>>> {
    let mut tasks = vec![
        chop_logs(3),
        Box::new(use_item_on_item(KNIFE, LOGS).into_task()) as Box<dyn Task<TaskContext>>,
        wait_until(
            "Wait for fletching",
            |ctx: &TaskContext| ctx.world().player_animation().is_none(),
            6,
        ),
    ];
    tasks.extend(talk_to_guide());
    tasks.push(Box::new(walk_to(p(30, 24))));
    tasks
}

/// Engine and world advanced in lock step, one game tick per [`step`].
///
/// [`step`]: Scenario::step
pub struct Scenario {
    pub world: Arc<SimWorld>,
    pub device: Arc<SimDevice>,
    pub clock: Arc<ManualClock>,
    pub ctx: TaskContext,
    pub runner: TaskRunner<TaskContext>,
}

impl Scenario {
    /// Seeded humanization, so runs repeat exactly.
    pub fn new(world: SimWorld) -> runtime::Result<Self> {
        let mut config = EngineConfig::default();
        config.humanization.seed = Some(7);
        Self::with_config(world, config)
    }

    pub fn with_config(world: SimWorld, config: EngineConfig) -> runtime::Result<Self> {
        let world = Arc::new(world);
        let device = Arc::new(SimDevice::new(world.clone()));
        let clock = Arc::new(ManualClock::new());
        let ctx = context(world.clone(), device.clone(), clock.clone(), config)?;
        Ok(Self {
            world,
            device,
            clock,
            ctx,
            runner: TaskRunner::new(64),
        })
    }

    pub fn push(&mut self, task: Box<dyn Task<TaskContext>>) {
        self.runner.push(task);
    }

    /// One game tick: the world moves first, then the engine reacts.
    pub fn step(&mut self) -> Option<TaskReport> {
        self.world.advance();
        let report = self.runner.tick(&mut self.ctx);
        self.clock.advance(TICK);
        report
    }

    /// Steps until the queue drains or `max_ticks` have passed.
    pub fn run(&mut self, max_ticks: u32) -> Vec<TaskReport> {
        let mut reports = Vec::new();
        for _ in 0..max_ticks {
            if self.runner.is_empty() {
                break;
            }
            reports.extend(self.step());
        }
        reports
    }
}
