//! Session runner binary for the Hourglass simulation.
//!
//! Loads configuration, seeds a world from YAML, and runs a fixed number of
//! time-passage steps against in-memory collaborators, logging each step
//! report as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hourglass-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Seed the session world from `engine.world_file`
//! 4. Run the session loop
//! 5. Log the result

mod error;
mod runner;
mod seed;

use std::path::Path;

use anyhow::Context as _;
use hourglass_core::config::SimulationConfig;
use hourglass_core::passage::TimePassage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::runner::{LogSink, SessionRunner};
use crate::seed::WorldSeed;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, seeding, or any step fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging is not up yet, so failures surface
    //    through the returned error only.
    let config = load_config().context("loading hourglass-config.yaml")?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(
        turns = config.engine.turns,
        hours_per_turn = config.engine.hours_per_turn,
        world_file = config.engine.world_file,
        seed = ?config.pursuit.seed,
        "hourglass-engine starting"
    );

    // 3. Seed the world.
    let world_file = config.engine.world_file.clone();
    let session = WorldSeed::from_file(Path::new(&world_file))
        .and_then(|seed| seed.into_session(&config.clock))
        .with_context(|| format!("seeding world from {world_file}"))?;

    // 4. Run the session.
    let mut session_runner = SessionRunner::new(TimePassage::new(config), session);
    let summary = session_runner.run(&mut LogSink).await?;

    // 5. Log results.
    runner::log_run_end(&summary);
    info!(
        commits = session_runner.commits(),
        actors = session_runner.world().actors.len(),
        "hourglass-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `hourglass-config.yaml` in the working directory.
///
/// A missing file is not an error; defaults are used instead.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new("hourglass-config.yaml");
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.logging.apply_env_overrides();
        Ok(config)
    }
}
