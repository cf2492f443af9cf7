//! Goal pursuit: each actor attempts one step of its primary goal.
//!
//! A step succeeds with a probability derived from its text and the goal's
//! priority. Success advances the goal and may move the actor; failure
//! blocks the goal outright. Blocked goals are never retried here.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use hourglass_types::{ActorId, Goal, GoalId, GoalStepRecord, Movement, PriorityTier};
use rand::Rng;
use tracing::{debug, info};

use crate::config::PursuitConfig;
use crate::rules::{MOVEMENT_RULES, first_match, step_base_rate, upcoming_venue};
use crate::services::{GoalStore, ServiceError};
use crate::world::SessionWorld;

/// Lowest success probability any step can have.
pub const MIN_STEP_PROBABILITY: f64 = 0.10;

/// Highest success probability any step can have.
pub const MAX_STEP_PROBABILITY: f64 = 0.95;

/// What one pursuit phase did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PursuitOutcome {
    /// One record per actor whose goal was attempted.
    pub steps: Vec<GoalStepRecord>,
    /// Goals finished this phase.
    pub completed: Vec<GoalId>,
    /// Goals blocked this phase.
    pub blocked: Vec<GoalId>,
    /// Goal-driven location changes.
    pub movements: Vec<Movement>,
    /// Actors whose location a goal decided this phase.
    pub moved: BTreeSet<ActorId>,
}

/// Success probability before clamping: base rate plus priority modifier.
pub fn raw_step_probability(step: &str, priority: PriorityTier) -> f64 {
    step_base_rate(step) + priority.success_modifier()
}

/// Success probability of a step, clamped to `[0.10, 0.95]`.
pub fn step_success_probability(step: &str, priority: PriorityTier) -> f64 {
    raw_step_probability(step, priority).clamp(MIN_STEP_PROBABILITY, MAX_STEP_PROBABILITY)
}

/// Order goals so the primary one sorts first.
///
/// Higher priority first, then the older goal, then the lower ID.
pub fn primary_order(a: &Goal, b: &Goal) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// The goal an actor works on when it has several active ones.
pub fn select_primary_goal(goals: &[Goal]) -> Option<&Goal> {
    goals.iter().min_by(|a, b| primary_order(a, b))
}

/// Where a successful step sends the actor, if anywhere.
///
/// The step just completed is checked for a place keyword first; failing
/// that, the upcoming step is checked for an `"at the <venue>"` phrase.
pub fn movement_destination(
    actor_key: &str,
    completed_step: &str,
    upcoming_step: Option<&str>,
) -> Option<String> {
    first_match(MOVEMENT_RULES, completed_step)
        .or_else(|| upcoming_step.and_then(upcoming_venue))
        .map(|destination| destination.location_key(actor_key))
}

/// Attempt one step of every simulated actor's primary goal.
///
/// Steps shorter than `config.min_hours` do nothing. Goals whose actor is
/// unknown, dead, or inactive are left untouched, as are goals with no
/// steps left.
///
/// # Errors
///
/// Returns [`ServiceError`] if the goal store fails.
pub fn pursue_goals(
    hours: f64,
    world: &mut SessionWorld,
    store: &mut dyn GoalStore,
    config: &PursuitConfig,
    rng: &mut impl Rng,
) -> Result<PursuitOutcome, ServiceError> {
    let mut outcome = PursuitOutcome::default();
    if hours < config.min_hours {
        debug!(hours, min_hours = config.min_hours, "Step too short for goal pursuit");
        return Ok(outcome);
    }

    let mut by_actor: BTreeMap<ActorId, Vec<Goal>> = BTreeMap::new();
    for goal in store.active_goals(None, None)? {
        by_actor.entry(goal.actor_id).or_default().push(goal);
    }

    for (actor_id, goals) in &by_actor {
        let Some(actor) = world.actor(*actor_id).filter(|a| a.alive && a.active) else {
            continue;
        };
        let actor_key = actor.key.clone();
        let actor_name = actor.name.clone();

        let Some(goal) = select_primary_goal(goals) else {
            continue;
        };
        let Some(step) = goal.next_step().map(str::to_owned) else {
            debug!(goal_id = %goal.id, "Primary goal has no steps left");
            continue;
        };

        let probability = step_success_probability(&step, goal.priority);
        let success = rng.random::<f64>() < probability;
        let mut record = GoalStepRecord {
            goal_id: goal.id,
            actor_id: *actor_id,
            step: step.clone(),
            success,
            completed: false,
            blocked: false,
        };

        if success {
            let mut advanced = goal.clone();
            advanced.current_step = goal.current_step.saturating_add(1);
            store.record_progress(goal.id, advanced.current_step)?;

            if advanced.is_exhausted() {
                store.complete_goal(
                    goal.id,
                    &format!("completed all {} steps", goal.strategies.len()),
                )?;
                record.completed = true;
                outcome.completed.push(goal.id);
                info!(actor = %actor_name, goal_id = %goal.id, "Goal completed");
            } else {
                if let Some(destination) =
                    movement_destination(&actor_key, &step, advanced.next_step())
                {
                    let reason = format!("goal: {}", goal.description);
                    if let Some(movement) = world.relocate(*actor_id, &destination, None, reason) {
                        outcome.movements.push(movement);
                    }
                    outcome.moved.insert(*actor_id);
                }
                debug!(actor = %actor_name, goal_id = %goal.id, step = %step, "Goal step succeeded");
            }
        } else {
            store.block_goal(goal.id, &format!("failed step: {step}"))?;
            record.blocked = true;
            outcome.blocked.push(goal.id);
            info!(
                actor = %actor_name,
                goal_id = %goal.id,
                step = %step,
                probability,
                "Goal blocked by failed step"
            );
        }

        outcome.steps.push(record);
    }

    Ok(outcome)
}
