//! Game clock, schedules, goals, and time passage for the Hourglass
//! simulation.
//!
//! This crate owns the step sequence that advances a play session by some
//! in-game hours: needs decay, goals are spawned and pursued, NPCs follow
//! their routines, and the clock moves on.
//!
//! # Modules
//!
//! - [`clock`] -- Session clock with day counter, time of day, weekday
//!   rollover, and day periods.
//! - [`config`] -- Configuration loading from `hourglass-config.yaml` into
//!   strongly-typed structs.
//! - [`goals`] -- Need-driven goal generation.
//! - [`passage`] -- The time-passage orchestrator, [`TimePassage`].
//! - [`positions`] -- Routine-driven NPC repositioning.
//! - [`pursuit`] -- Goal step attempts, success rolls, and movement cues.
//! - [`rules`] -- Keyword tables for classifying free text.
//! - [`schedule`] -- Routine storage and resolution.
//! - [`services`] -- Collaborator traits the orchestrator calls out to.
//! - [`stub`] -- In-memory collaborators for the engine and tests.
//! - [`world`] -- The mutable session world.
//!
//! [`TimePassage`]: passage::TimePassage

pub mod clock;
pub mod config;
pub mod goals;
pub mod passage;
pub mod positions;
pub mod pursuit;
pub mod rules;
pub mod schedule;
pub mod services;
pub mod stub;
pub mod world;

pub use clock::GameClock;
pub use config::SimulationConfig;
pub use passage::{LocationChange, PassageError, StepRequest, TimePassage};
pub use services::{ServiceError, Services};
pub use world::SessionWorld;
