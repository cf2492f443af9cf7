//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of seeding and running a
//! session so that `main` can propagate it with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hourglass_core::config::ConfigError,
    },

    /// The session clock could not be created.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: hourglass_core::clock::ClockError,
    },

    /// A seeded routine entry is malformed.
    #[error("schedule error: {source}")]
    Schedule {
        /// The underlying schedule error.
        #[from]
        source: hourglass_core::schedule::ScheduleError,
    },

    /// The world seed file could not be read or parsed.
    #[error("seed error: {message}")]
    Seed {
        /// Description of the seed failure.
        message: String,
    },

    /// A simulation step failed.
    #[error("step {turn} failed: {source}")]
    Step {
        /// The turn that failed.
        turn: u32,
        /// The underlying passage error.
        source: hourglass_core::PassageError,
    },
}
