//! Sandbox binary.
//!
//! Runs the demo task list against the simulated forest on a real-time tick.
//! The world advances on its own timer, like a game server, while the runner
//! ticks the engine.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p sandbox
//! ```
use std::sync::Arc;

use anyhow::Result;
use runtime::{EngineConfig, RunnerConfig, SystemClock, TaskRunner};
use sandbox::SimDevice;
use sandbox::scenario::{self, ARROW_SHAFTS, LOGS};
use tokio::time::{self, MissedTickBehavior};
use tracing::info;
use world_core::WorldSnapshot;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env();
    let runner_config = RunnerConfig::from_env();

    let world = Arc::new(scenario::forest());
    let device = Arc::new(SimDevice::new(world.clone()));
    let mut ctx = scenario::context(
        world.clone(),
        device,
        Arc::new(SystemClock::new()),
        config,
    )?;

    let mut runner = TaskRunner::new(runner_config.report_capacity);
    for task in scenario::demo_tasks() {
        runner.push(task);
    }

    let ticker = {
        let world = world.clone();
        let period = runner_config.tick_interval;
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                world.advance();
            }
        })
    };

    info!(player = %world.player(), tasks = runner.len(), "sandbox started");
    let reports = runner
        .run(&mut ctx, &runner_config, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    ticker.abort();

    let failed = reports
        .iter()
        .filter(|report| report.failure.is_some())
        .count();
    info!(
        finished = reports.len(),
        failed,
        logs = world.inventory_count(LOGS),
        arrow_shafts = world.inventory_count(ARROW_SHAFTS),
        player = %world.player(),
        "sandbox finished"
    );

    Ok(())
}
