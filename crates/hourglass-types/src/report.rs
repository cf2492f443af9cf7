//! The per-step report returned by the time-passage orchestrator.
//!
//! A report is built fresh for every step and never persisted by the core.
//! Callers turn it into narrative, telemetry, or nothing at all.

use serde::{Deserialize, Serialize};

use crate::enums::{GoalType, PriorityTier};
use crate::ids::{ActorId, GoalId};
use crate::structs::TemporalEffects;

/// An actor changing location during a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// The actor that moved.
    pub actor_id: ActorId,
    /// The actor's display name.
    pub actor_name: String,
    /// Previous location, if any.
    pub from: Option<String>,
    /// New location.
    pub to: String,
    /// Why the actor moved: `goal: ...` or `schedule: ...`.
    pub reason: String,
}

/// A goal spawned by an unmet need during a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalCreated {
    /// The new goal.
    pub goal_id: GoalId,
    /// The actor that will pursue it.
    pub actor_id: ActorId,
    /// The actor's display name.
    pub actor_name: String,
    /// Kind of goal.
    pub goal_type: GoalType,
    /// What the goal is about.
    pub target: String,
    /// Scheduling tier.
    pub priority: PriorityTier,
    /// The need that triggered it.
    pub need: String,
    /// The need's urgency at creation time.
    pub urgency: u32,
}

/// The outcome of attempting one goal step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStepRecord {
    /// The goal that was pursued.
    pub goal_id: GoalId,
    /// The actor pursuing it.
    pub actor_id: ActorId,
    /// The step text that was attempted.
    pub step: String,
    /// Whether the step succeeded.
    pub success: bool,
    /// Whether the goal completed with this step.
    pub completed: bool,
    /// Whether the goal was blocked by this step.
    pub blocked: bool,
}

/// Everything that happened during one simulation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// In-game hours simulated.
    pub hours: f64,
    /// Location changes, goal-driven first, then schedule-driven.
    pub movements: Vec<Movement>,
    /// Actors whose needs decayed this step.
    pub needs_updated: Vec<ActorId>,
    /// Mood modifiers that expired this step.
    pub expired_modifiers: u32,
    /// Environmental effects at the player's location, when one was given.
    pub temporal: Option<TemporalEffects>,
    /// Goals created from unmet needs.
    pub goals_created: Vec<GoalCreated>,
    /// One record per actor whose goal was pursued.
    pub goal_steps: Vec<GoalStepRecord>,
    /// Goals completed this step.
    pub goals_completed: Vec<GoalId>,
    /// Goals blocked this step.
    pub goals_failed: Vec<GoalId>,
}

impl StepReport {
    /// Start an empty report for a step of `hours`.
    pub fn new(hours: f64) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    /// Movement records for one actor, in the order they happened.
    pub fn movements_of(&self, actor_id: ActorId) -> impl Iterator<Item = &Movement> {
        self.movements.iter().filter(move |m| m.actor_id == actor_id)
    }
}
