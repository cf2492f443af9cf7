//! Core entity structs: actors, routine entries, goals, and the answers
//! returned by external collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ActorKind, DayPattern, GoalStatus, GoalType, PriorityTier};
use crate::ids::{ActorId, GoalId};

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A simulated character: the player or an NPC.
///
/// Owned by the session world. The position updater and the goal pursuit
/// engine rewrite `location` and `activity` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// Short slug (e.g. `"bob"`), used to build keys such as `home_bob`.
    pub key: String,
    /// Player or NPC.
    pub kind: ActorKind,
    /// Dead actors are never simulated.
    pub alive: bool,
    /// Inactive actors (written out of the story) are never simulated.
    pub active: bool,
    /// Display name.
    pub name: String,
    /// Current location key, if the actor is anywhere in particular.
    pub location: Option<String>,
    /// Current free-text activity label.
    pub activity: Option<String>,
}

impl Actor {
    /// Create a living, active NPC with no location.
    pub fn npc(key: &str, name: &str) -> Self {
        Self {
            id: ActorId::new(),
            key: key.to_owned(),
            kind: ActorKind::Npc,
            alive: true,
            active: true,
            name: name.to_owned(),
            location: None,
            activity: None,
        }
    }

    /// Create the player character with no location.
    pub fn player(key: &str, name: &str) -> Self {
        Self {
            kind: ActorKind::Player,
            ..Self::npc(key, name)
        }
    }

    /// Whether the actor is an NPC that takes part in simulation.
    pub const fn is_simulated_npc(&self) -> bool {
        matches!(self.kind, ActorKind::Npc) && self.alive && self.active
    }
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// One recurring slot in an actor's daily routine.
///
/// Times are kept as the `"HH:MM"` strings authored upstream and parsed on
/// use, so corrupt data surfaces as an error at resolution time. When
/// `end < start` the window crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineEntry {
    /// The actor this entry belongs to.
    pub actor_id: ActorId,
    /// Days on which this entry applies.
    pub day_pattern: DayPattern,
    /// Window start, inclusive, `"HH:MM"`.
    pub start: String,
    /// Window end, exclusive, `"HH:MM"`.
    pub end: String,
    /// Free-text activity label, e.g. `"selling bread"`.
    pub activity: String,
    /// Where the activity happens, if anywhere specific.
    pub location: Option<String>,
    /// Higher wins when several entries overlap.
    pub priority: i32,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// A multi-step autonomous objective pursued by one actor.
///
/// `current_step` never exceeds `strategies.len()`; once it equals the
/// length the goal is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier.
    pub id: GoalId,
    /// The actor pursuing the goal.
    pub actor_id: ActorId,
    /// Broad kind of objective.
    pub goal_type: GoalType,
    /// What the goal is about, e.g. `"food"`.
    pub target: String,
    /// Human-readable description.
    pub description: String,
    /// Condition under which the goal counts as satisfied.
    pub success_condition: String,
    /// Need names that motivated the goal.
    pub motivation: Vec<String>,
    /// What created the goal, e.g. `need_urgency_82`.
    pub triggered_by: String,
    /// Scheduling tier.
    pub priority: PriorityTier,
    /// Ordered step descriptions.
    pub strategies: Vec<String>,
    /// Index of the next step to attempt.
    pub current_step: usize,
    /// Lifecycle status.
    pub status: GoalStatus,
    /// When the goal was created.
    pub created_at: DateTime<Utc>,
    /// Note recorded when the goal was completed or blocked.
    pub closing_note: Option<String>,
}

impl Goal {
    /// The step to attempt next, or `None` once every step is done.
    pub fn next_step(&self) -> Option<&str> {
        self.strategies.get(self.current_step).map(String::as_str)
    }

    /// Whether the step index has reached the end of the step list.
    pub fn is_exhausted(&self) -> bool {
        self.current_step >= self.strategies.len()
    }
}

/// The fields needed to create a goal; the store assigns ID, status, step
/// index, and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    /// The actor pursuing the goal.
    pub actor_id: ActorId,
    /// Broad kind of objective.
    pub goal_type: GoalType,
    /// What the goal is about.
    pub target: String,
    /// Human-readable description.
    pub description: String,
    /// Condition under which the goal counts as satisfied.
    pub success_condition: String,
    /// Need names that motivated the goal.
    pub motivation: Vec<String>,
    /// What created the goal.
    pub triggered_by: String,
    /// Scheduling tier.
    pub priority: PriorityTier,
    /// Ordered step descriptions.
    pub strategies: Vec<String>,
}

// ---------------------------------------------------------------------------
// Collaborator answers
// ---------------------------------------------------------------------------

/// An actor's single most urgent need, as reported by the need service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgentNeed {
    /// Need name, e.g. `"hunger"` or `"social_connection"`.
    pub need: String,
    /// Urgency from 0 (satisfied) to 100 (desperate).
    pub urgency: u32,
}

impl UrgentNeed {
    /// Build an urgent-need answer.
    pub fn new(need: &str, urgency: u32) -> Self {
        Self {
            need: need.to_owned(),
            urgency,
        }
    }
}

/// Environmental side effects reported by the temporal-consistency service.
///
/// Passed through to the step report without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalEffects {
    /// Lighting transition, e.g. `"dusk falls"`.
    pub lighting_change: Option<String>,
    /// Crowd transition, e.g. `"the market empties"`.
    pub crowd_change: Option<String>,
    /// Items that spoiled during the elapsed time.
    pub items_spoiled: Vec<String>,
    /// Items that were cleaned away during the elapsed time.
    pub items_cleaned: Vec<String>,
}
