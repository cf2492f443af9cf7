//! The session world: actors, their routines, and the clock.
//!
//! This is the state the core mutates in place during a step. Everything
//! else (needs, goals, mood modifiers) lives behind collaborator traits.
//! Actors are kept in a `BTreeMap` keyed by time-ordered IDs, so iteration
//! follows creation order and every phase visits actors deterministically.

use std::collections::BTreeMap;

use hourglass_types::{Actor, ActorId, Movement, RoutineEntry, UrgentNeed};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockError, GameClock};
use crate::config::ClockConfig;
use crate::schedule::RoutineBook;

/// Each simulated NPC's most urgent need, fetched once per step.
pub type UrgencySnapshot = BTreeMap<ActorId, UrgentNeed>;

/// Mutable world state of one play session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWorld {
    /// The session clock; `None` until the session has been started.
    pub clock: Option<GameClock>,
    /// Every actor, player included.
    pub actors: BTreeMap<ActorId, Actor>,
    /// Routine entries of every actor.
    pub routines: RoutineBook,
}

impl SessionWorld {
    /// Create an empty world with no clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world with the given clock.
    pub fn with_clock(clock: GameClock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    /// The session clock, creating one from `config` if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the configured start is invalid.
    pub fn clock_or_seed(&mut self, config: &ClockConfig) -> Result<&GameClock, ClockError> {
        if self.clock.is_none() {
            self.clock = Some(GameClock::from_config(config)?);
        }
        self.clock.as_ref().ok_or_else(|| ClockError::InvalidClock {
            reason: "clock missing after seeding".to_owned(),
        })
    }

    /// Add an actor and return its ID.
    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let id = actor.id;
        self.actors.insert(id, actor);
        id
    }

    /// Add a routine entry to its actor's schedule.
    pub fn add_routine(&mut self, entry: RoutineEntry) {
        self.routines.insert(entry);
    }

    /// Look up an actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Look up an actor for mutation.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// IDs of living, active NPCs, in creation order.
    pub fn simulated_npcs(&self) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|actor| actor.is_simulated_npc())
            .map(|actor| actor.id)
            .collect()
    }

    /// Whether no other living, active actor shares this actor's location.
    ///
    /// An actor without a location is alone.
    pub fn is_alone(&self, id: ActorId) -> bool {
        self.actor(id)
            .and_then(|a| a.location.as_deref())
            .is_none_or(|location| self.would_be_alone_at(id, location))
    }

    /// Whether no other living, active actor is at `location`.
    pub fn would_be_alone_at(&self, id: ActorId, location: &str) -> bool {
        !self.actors.values().any(|other| {
            other.id != id
                && other.alive
                && other.active
                && other.location.as_deref() == Some(location)
        })
    }

    /// Move an actor to `to`, optionally replacing its activity.
    ///
    /// Returns the movement record, or `None` if the actor is unknown or
    /// already there. The activity is updated either way.
    pub fn relocate(
        &mut self,
        id: ActorId,
        to: &str,
        activity: Option<&str>,
        reason: String,
    ) -> Option<Movement> {
        let actor = self.actors.get_mut(&id)?;
        if let Some(activity) = activity {
            actor.activity = Some(activity.to_owned());
        }
        if actor.location.as_deref() == Some(to) {
            return None;
        }
        let from = actor.location.replace(to.to_owned());
        Some(Movement {
            actor_id: id,
            actor_name: actor.name.clone(),
            from,
            to: to.to_owned(),
            reason,
        })
    }
}
