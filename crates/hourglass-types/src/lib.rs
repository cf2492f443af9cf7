//! Shared type definitions for the Hourglass simulation.
//!
//! This crate is the single source of truth for the data model that flows
//! between the simulation core and its callers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actors and goals
//! - [`enums`] -- Day patterns, goal types, priority tiers, activity kinds
//! - [`structs`] -- Actors, routine entries, goals, collaborator answers
//! - [`report`] -- The per-step report and its records

pub mod enums;
pub mod ids;
pub mod report;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use chrono::Weekday;
pub use enums::{
    ActivityKind, ActorKind, DayPattern, GoalStatus, GoalType, PriorityTier, UnknownDayPattern,
    UnknownPriorityTier,
};
pub use ids::{ActorId, GoalId};
pub use report::{GoalCreated, GoalStepRecord, Movement, StepReport};
pub use structs::{Actor, Goal, NewGoal, RoutineEntry, TemporalEffects, UrgentNeed};
