//! Session loop: runs a seeded session for a fixed number of turns.
//!
//! Each turn is one time-passage step of `engine.hours_per_turn` hours, or
//! a player trip when the itinerary names that turn. Steps are paced by
//! `engine.turn_interval_ms` of real time. When `pursuit.seed` is set, every
//! turn rolls goal steps from its own RNG seeded with `seed ^ turn`, so a
//! run can be replayed exactly.

use hourglass_core::passage::{LocationChange, StepRequest, TimePassage};
use hourglass_core::stub::{CommitCounter, CountingRelationships, FixedTemporal, InMemoryGoalStore};
use hourglass_core::{SessionWorld, Services};
use hourglass_types::{ActivityKind, StepReport};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::seed::SeededSession;

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Turns that completed.
    pub turns: u32,
    /// Location changes across all turns.
    pub movements: usize,
    /// Goals spawned.
    pub goals_created: usize,
    /// Goals completed.
    pub goals_completed: usize,
    /// Goals blocked.
    pub goals_failed: usize,
    /// Clock reading after the last turn.
    pub final_clock: Option<String>,
}

/// Receives every step report as it is produced.
pub trait ReportSink: Send {
    /// Called after a turn completes successfully.
    fn on_step(&mut self, turn: u32, report: &StepReport, world: &SessionWorld);
}

/// Sink that logs each report as one JSON line.
pub struct LogSink;

impl ReportSink for LogSink {
    fn on_step(&mut self, turn: u32, report: &StepReport, world: &SessionWorld) {
        let clock = world.clock.as_ref().map(|c| c.time_string());
        match serde_json::to_string(report) {
            Ok(json) => info!(turn, clock = ?clock, report = %json, "Step report"),
            Err(e) => warn!(turn, error = %e, "failed to serialize step report"),
        }
    }
}

/// A seeded session plus the in-memory collaborators it runs against.
pub struct SessionRunner {
    passage: TimePassage,
    session: SeededSession,
    relationships: CountingRelationships,
    temporal: FixedTemporal,
    goals: InMemoryGoalStore,
    persistence: CommitCounter,
}

impl SessionRunner {
    /// Wrap a seeded session.
    pub fn new(passage: TimePassage, session: SeededSession) -> Self {
        Self {
            passage,
            session,
            relationships: CountingRelationships::default(),
            temporal: FixedTemporal::default(),
            goals: InMemoryGoalStore::new(),
            persistence: CommitCounter::default(),
        }
    }

    /// The session world in its current state.
    pub const fn world(&self) -> &SessionWorld {
        &self.session.world
    }

    /// Number of committed steps.
    pub const fn commits(&self) -> u32 {
        self.persistence.commits
    }

    /// Run every configured turn, handing each report to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Step`] for the first step that fails. Turns
    /// before it stay applied.
    pub async fn run(&mut self, sink: &mut dyn ReportSink) -> Result<RunSummary, EngineError> {
        let engine = self.passage.config().engine.clone();
        let seed = self.passage.config().pursuit.seed;
        let mut summary = RunSummary::default();

        info!(
            turns = engine.turns,
            hours_per_turn = engine.hours_per_turn,
            turn_interval_ms = engine.turn_interval_ms,
            seeded = seed.is_some(),
            "Session starting"
        );

        for turn in 1..=engine.turns {
            let report = self.step(turn, engine.hours_per_turn, seed)?;

            summary.turns = turn;
            summary.movements = summary.movements.saturating_add(report.movements.len());
            summary.goals_created = summary
                .goals_created
                .saturating_add(report.goals_created.len());
            summary.goals_completed = summary
                .goals_completed
                .saturating_add(report.goals_completed.len());
            summary.goals_failed = summary
                .goals_failed
                .saturating_add(report.goals_failed.len());
            sink.on_step(turn, &report, &self.session.world);

            if engine.turn_interval_ms > 0 && turn < engine.turns {
                tokio::time::sleep(tokio::time::Duration::from_millis(engine.turn_interval_ms))
                    .await;
            }
        }

        summary.final_clock = self.session.world.clock.as_ref().map(|c| c.time_string());
        Ok(summary)
    }

    /// Run one turn: a trip if the itinerary has one, otherwise a regular step.
    fn step(&mut self, turn: u32, hours: f64, seed: Option<u64>) -> Result<StepReport, EngineError> {
        let mut rng = seed.map_or_else(
            || SmallRng::from_rng(&mut rand::rng()),
            |seed| SmallRng::seed_from_u64(seed ^ u64::from(turn)),
        );
        let player_id = self.session.player_id;
        let world = &mut self.session.world;
        let player_location = world.actor(player_id).and_then(|a| a.location.clone());

        let mut services = Services {
            needs: &mut self.session.needs,
            relationships: &mut self.relationships,
            temporal: &mut self.temporal,
            goals: &mut self.goals,
            persistence: &mut self.persistence,
        };

        let result = if let Some(trip) = self.session.itinerary.get(&turn) {
            let change = LocationChange {
                player_id,
                from: player_location,
                to: trip.to.clone(),
                travel_hours: trip.hours,
                player_alone: world.would_be_alone_at(player_id, &trip.to),
            };
            self.passage
                .on_location_change(world, &mut services, &change, &mut rng)
        } else {
            let request = StepRequest {
                hours,
                player_id,
                player_activity: ActivityKind::Active,
                player_alone: world.is_alone(player_id),
                player_location,
            };
            self.passage
                .simulate_step(world, &mut services, &request, &mut rng)
        };
        result.map_err(|source| EngineError::Step { turn, source })
    }
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        turns = summary.turns,
        movements = summary.movements,
        goals_created = summary.goals_created,
        goals_completed = summary.goals_completed,
        goals_failed = summary.goals_failed,
        final_clock = ?summary.final_clock,
        "Session ended"
    );
    if summary.turns == 0 {
        warn!("Session ended with no turns executed");
    }
}
