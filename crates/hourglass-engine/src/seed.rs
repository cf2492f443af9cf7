//! World seeding from a YAML file.
//!
//! The seed file lists the player, the NPCs, each NPC's starting needs and
//! routine, and an optional player itinerary. Loading it produces a ready
//! [`SessionWorld`] plus the need table that backs the in-memory need
//! service.

use std::collections::BTreeMap;
use std::path::Path;

use hourglass_core::config::ClockConfig;
use hourglass_core::schedule::validate_routine;
use hourglass_core::stub::TableNeedService;
use hourglass_core::SessionWorld;
use hourglass_types::{Actor, ActorId, DayPattern, RoutineEntry};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

/// The YAML world seed file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldSeed {
    /// The player character.
    pub player: SeedActor,

    /// NPCs to simulate.
    #[serde(default)]
    pub npcs: Vec<SeedNpc>,

    /// Urgency rise per in-game hour for every tracked need.
    #[serde(default = "default_need_rise_per_hour")]
    pub need_rise_per_hour: f64,

    /// Turns at which the player travels somewhere else.
    #[serde(default)]
    pub itinerary: Vec<SeedTrip>,
}

/// An actor's identity and starting location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedActor {
    /// Short slug, e.g. `bob`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Starting location key.
    #[serde(default)]
    pub location: Option<String>,
}

/// An NPC with starting needs and a routine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedNpc {
    /// Identity and starting location.
    #[serde(flatten)]
    pub actor: SeedActor,
    /// Starting urgency per need name.
    #[serde(default)]
    pub needs: BTreeMap<String, f64>,
    /// Routine entries in authoring order.
    #[serde(default)]
    pub routine: Vec<SeedRoutine>,
}

/// One routine entry as authored in the seed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedRoutine {
    /// Days on which the entry applies.
    pub days: DayPattern,
    /// Window start, `"HH:MM"`.
    pub start: String,
    /// Window end, `"HH:MM"`.
    pub end: String,
    /// Activity label.
    pub activity: String,
    /// Location key.
    #[serde(default)]
    pub location: Option<String>,
    /// Higher wins on overlap.
    #[serde(default)]
    pub priority: i32,
}

/// A planned player trip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedTrip {
    /// Turn number (starting at 1) on which the trip replaces the regular step.
    pub turn: u32,
    /// Destination location key.
    pub to: String,
    /// Travel time in hours; zero or absent charges the minimum.
    #[serde(default)]
    pub hours: f64,
}

/// A seeded session, ready to run.
#[derive(Debug)]
pub struct SeededSession {
    /// The session world.
    pub world: SessionWorld,
    /// The player's ID.
    pub player_id: ActorId,
    /// Starting needs of every NPC.
    pub needs: TableNeedService,
    /// Planned player trips keyed by turn.
    pub itinerary: BTreeMap<u32, SeedTrip>,
}

impl WorldSeed {
    /// Read a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Seed`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Seed {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parse a seed from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Seed`] if the YAML does not describe a seed.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        serde_yml::from_str(yaml).map_err(|e| EngineError::Seed {
            message: format!("failed to parse world seed: {e}"),
        })
    }

    /// Build the session world, starting the clock from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Clock`] if the clock config is invalid and
    /// [`EngineError::Schedule`] if a routine entry has a malformed time.
    pub fn into_session(self, clock: &ClockConfig) -> Result<SeededSession, EngineError> {
        let mut world = SessionWorld::new();
        world.clock_or_seed(clock)?;
        let mut needs = TableNeedService::new(self.need_rise_per_hour);

        let mut player = Actor::player(&self.player.key, &self.player.name);
        player.location = self.player.location;
        let player_id = world.add_actor(player);

        for npc in self.npcs {
            let mut actor = Actor::npc(&npc.actor.key, &npc.actor.name);
            actor.location = npc.actor.location;
            let actor_id = world.add_actor(actor);

            for (need, urgency) in &npc.needs {
                needs.set_urgency(actor_id, need, *urgency);
            }
            for slot in npc.routine {
                let entry = RoutineEntry {
                    actor_id,
                    day_pattern: slot.days,
                    start: slot.start,
                    end: slot.end,
                    activity: slot.activity,
                    location: slot.location,
                    priority: slot.priority,
                };
                validate_routine(&entry)?;
                world.add_routine(entry);
            }
        }

        let itinerary = self
            .itinerary
            .into_iter()
            .map(|trip| (trip.turn, trip))
            .collect();

        info!(
            actors = world.actors.len(),
            scheduled = world.routines.actors().count(),
            "World seeded"
        );
        Ok(SeededSession {
            world,
            player_id,
            needs,
            itinerary,
        })
    }
}

const fn default_need_rise_per_hour() -> f64 {
    4.0
}
