//! External collaborator traits.
//!
//! The simulation core decides what happens as time passes, but it does not
//! own need decay, mood modifiers, environmental consistency, or goal
//! persistence. Each of those lives behind a trait so the orchestrator can
//! be driven by a database-backed session, an in-memory harness, or a test
//! stub alike. See [`crate::stub`] for in-memory implementations.
//!
//! Every call is synchronous. Errors are never retried or swallowed here:
//! they propagate and the caller rolls back the whole step.

use hourglass_types::{
    ActivityKind, ActorId, Goal, GoalId, GoalType, NewGoal, TemporalEffects, UrgentNeed,
};

/// Errors reported by external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator could not be reached or failed internally.
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{service}: {what} not found")]
    NotFound {
        /// Which collaborator reported it.
        service: &'static str,
        /// What was missing.
        what: String,
    },

    /// The collaborator refused the request.
    #[error("{service} rejected request: {reason}")]
    Rejected {
        /// Which collaborator refused.
        service: &'static str,
        /// Why it refused.
        reason: String,
    },
}

/// Need tracking and decay.
pub trait NeedService {
    /// Decay an actor's needs for `hours` spent doing `activity`.
    fn apply_time_decay(
        &mut self,
        actor_id: ActorId,
        hours: f64,
        activity: ActivityKind,
        is_alone: bool,
    ) -> Result<(), ServiceError>;

    /// The actor's single most urgent need, if it tracks any.
    fn most_urgent_need(&self, actor_id: ActorId) -> Result<Option<UrgentNeed>, ServiceError>;
}

/// Relationship and mood-modifier bookkeeping.
pub trait RelationshipService {
    /// Expire mood modifiers whose time is up. Returns how many expired.
    fn expire_mood_modifiers(&mut self) -> Result<u32, ServiceError>;
}

/// Environmental and temporal consistency (lighting, crowds, spoilage).
pub trait TemporalService {
    /// Effects of `hours` passing at `location`.
    fn calculate_temporal_effects(
        &mut self,
        hours: f64,
        location: &str,
    ) -> Result<TemporalEffects, ServiceError>;
}

/// Long-term goal persistence.
pub trait GoalStore {
    /// Active goals, optionally filtered by actor and type, in storage order.
    fn active_goals(
        &self,
        actor_id: Option<ActorId>,
        goal_type: Option<GoalType>,
    ) -> Result<Vec<Goal>, ServiceError>;

    /// Persist a new goal and return it with ID, status, and timestamp set.
    fn create_goal(&mut self, goal: NewGoal) -> Result<Goal, ServiceError>;

    /// Persist a goal's advanced step index.
    fn record_progress(&mut self, goal_id: GoalId, step_index: usize) -> Result<(), ServiceError>;

    /// Mark a goal completed.
    fn complete_goal(&mut self, goal_id: GoalId, note: &str) -> Result<(), ServiceError>;

    /// Mark a goal blocked.
    fn block_goal(&mut self, goal_id: GoalId, note: &str) -> Result<(), ServiceError>;
}

/// The caller's persistence boundary.
pub trait Persistence {
    /// Flush everything the step changed. Called once, after the last phase.
    fn commit(&mut self) -> Result<(), ServiceError>;
}

/// The collaborators one simulation step talks to.
pub struct Services<'a> {
    /// Need tracking and decay.
    pub needs: &'a mut dyn NeedService,
    /// Mood-modifier expiry.
    pub relationships: &'a mut dyn RelationshipService,
    /// Environmental consistency.
    pub temporal: &'a mut dyn TemporalService,
    /// Goal persistence.
    pub goals: &'a mut dyn GoalStore,
    /// Commit boundary.
    pub persistence: &'a mut dyn Persistence,
}
