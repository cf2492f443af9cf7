//! Routine-driven NPC repositioning.
//!
//! After goals have had their say, every NPC with a routine is moved to
//! wherever its schedule puts it at the given time. NPCs a goal already
//! moved this step stay put, and so do NPCs held in place by a pressing
//! need.

use std::collections::BTreeSet;

use hourglass_types::{ActorId, Movement};
use tracing::debug;

use crate::clock::GameClock;
use crate::config::PositionConfig;
use crate::schedule::ScheduleError;
use crate::world::{SessionWorld, UrgencySnapshot};

/// Move NPCs to their scheduled locations as of `clock`.
///
/// Nothing happens for steps shorter than `config.min_hours`. An NPC is
/// left alone when a goal moved it this step, when no routine entry
/// applies, when the entry names no location or the NPC is already there,
/// or when its most urgent need exceeds `config.routine_override_urgency`.
///
/// # Errors
///
/// Returns [`ScheduleError`] if an applicable routine entry is malformed.
pub fn update_positions(
    hours: f64,
    world: &mut SessionWorld,
    clock: &GameClock,
    urgency: &UrgencySnapshot,
    already_moved: &BTreeSet<ActorId>,
    config: &PositionConfig,
) -> Result<Vec<Movement>, ScheduleError> {
    let mut movements = Vec::new();
    if hours < config.min_hours {
        return Ok(movements);
    }

    let scheduled: Vec<ActorId> = world.routines.actors().collect();
    for actor_id in scheduled {
        if already_moved.contains(&actor_id) {
            continue;
        }
        let Some(actor) = world.actor(actor_id).filter(|a| a.is_simulated_npc()) else {
            continue;
        };
        let Some(entry) = world
            .routines
            .resolve(actor_id, clock.weekday(), clock.time())?
        else {
            continue;
        };
        let Some(location) = entry.location.as_deref() else {
            continue;
        };
        if actor.location.as_deref() == Some(location) {
            continue;
        }
        if let Some(need) = urgency
            .get(&actor_id)
            .filter(|need| need.urgency > config.routine_override_urgency)
        {
            debug!(
                actor = %actor.name,
                need = %need.need,
                urgency = need.urgency,
                "Pressing need overrides routine"
            );
            continue;
        }

        let location = location.to_owned();
        let activity = entry.activity.clone();
        let reason = format!("schedule: {activity}");
        if let Some(movement) = world.relocate(actor_id, &location, Some(&activity), reason) {
            debug!(actor = %movement.actor_name, to = %movement.to, "Routine move");
            movements.push(movement);
        }
    }

    Ok(movements)
}
