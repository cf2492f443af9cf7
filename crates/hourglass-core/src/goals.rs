//! Need-driven goal generation.
//!
//! Once per step, every simulated NPC whose most urgent need has crossed
//! the urgency threshold gets a three-step goal aimed at satisfying it,
//! unless an active goal of the same type already answers that need.

use hourglass_types::{ActorId, GoalCreated, NewGoal, PriorityTier};
use tracing::{debug, info};

use crate::config::GoalConfig;
use crate::rules::{goal_template, goal_type_for_need};
use crate::services::{GoalStore, ServiceError};
use crate::world::{SessionWorld, UrgencySnapshot};

/// Priority tier for a need's urgency.
pub const fn priority_for_urgency(urgency: u32, config: &GoalConfig) -> PriorityTier {
    if urgency >= config.urgent_at {
        PriorityTier::Urgent
    } else if urgency >= config.high_at {
        PriorityTier::High
    } else {
        PriorityTier::Medium
    }
}

/// Build the goal an unmet need spawns.
pub fn goal_for_need(actor_id: ActorId, need: &str, urgency: u32, config: &GoalConfig) -> NewGoal {
    let template = goal_template(need);
    let target = template.target;
    let satisfied_below = config
        .urgency_threshold
        .saturating_sub(config.completion_margin);

    NewGoal {
        actor_id,
        goal_type: goal_type_for_need(need),
        strategies: vec![
            format!("look for {target}"),
            format!("acquire {target}"),
            format!("use {target} to satisfy {need}"),
        ],
        target,
        description: template.description,
        success_condition: format!("{need} drops below {satisfied_below}"),
        motivation: vec![need.to_owned()],
        triggered_by: format!("need_urgency_{urgency}"),
        priority: priority_for_urgency(urgency, config),
    }
}

/// Create goals for every simulated NPC with an unmet, unanswered need.
///
/// `urgency` holds each NPC's most urgent need as of this step; NPCs
/// missing from it track no needs and are skipped.
///
/// # Errors
///
/// Returns [`ServiceError`] if the goal store fails. Goals created before
/// the failure stay created; the caller is expected to roll back.
pub fn generate_goals(
    world: &SessionWorld,
    urgency: &UrgencySnapshot,
    store: &mut dyn GoalStore,
    config: &GoalConfig,
) -> Result<Vec<GoalCreated>, ServiceError> {
    let mut created = Vec::new();

    for actor in world.actors.values().filter(|a| a.is_simulated_npc()) {
        let Some(top) = urgency.get(&actor.id) else {
            continue;
        };
        if top.urgency < config.urgency_threshold {
            continue;
        }

        let goal_type = goal_type_for_need(&top.need);
        let existing = store.active_goals(Some(actor.id), Some(goal_type))?;
        if existing
            .iter()
            .any(|goal| goal.motivation.iter().any(|m| *m == top.need))
        {
            debug!(
                actor = %actor.name,
                need = %top.need,
                "Need already answered by an active goal"
            );
            continue;
        }

        let goal = store.create_goal(goal_for_need(actor.id, &top.need, top.urgency, config))?;
        info!(
            actor = %actor.name,
            goal_id = %goal.id,
            need = %top.need,
            urgency = top.urgency,
            priority = ?goal.priority,
            "Goal created from unmet need"
        );
        created.push(GoalCreated {
            goal_id: goal.id,
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            goal_type: goal.goal_type,
            target: goal.target,
            priority: goal.priority,
            need: top.need.clone(),
            urgency: top.urgency,
        });
    }

    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hourglass_types::{Actor, GoalType, UrgentNeed};

    use super::*;
    use crate::stub::InMemoryGoalStore;

    fn world_with_bob() -> (SessionWorld, ActorId) {
        let mut world = SessionWorld::new();
        let bob = world.add_actor(Actor::npc("bob", "Bob"));
        (world, bob)
    }

    fn snapshot(actor: ActorId, need: &str, urgency: u32) -> UrgencySnapshot {
        UrgencySnapshot::from([(actor, UrgentNeed::new(need, urgency))])
    }

    #[test]
    fn priority_tiers_follow_urgency() {
        let config = GoalConfig::default();
        assert_eq!(priority_for_urgency(95, &config), PriorityTier::Urgent);
        assert_eq!(priority_for_urgency(90, &config), PriorityTier::Urgent);
        assert_eq!(priority_for_urgency(82, &config), PriorityTier::High);
        assert_eq!(priority_for_urgency(76, &config), PriorityTier::Medium);
    }

    #[test]
    fn hunger_goal_has_three_steps() {
        let actor = ActorId::new();
        let goal = goal_for_need(actor, "hunger", 82, &GoalConfig::default());

        assert_eq!(goal.goal_type, GoalType::Survive);
        assert_eq!(goal.target, "food");
        assert_eq!(goal.description, "Find something to eat");
        assert_eq!(goal.success_condition, "hunger drops below 55");
        assert_eq!(goal.triggered_by, "need_urgency_82");
        assert_eq!(goal.priority, PriorityTier::High);
        assert_eq!(
            goal.strategies,
            vec!["look for food", "acquire food", "use food to satisfy hunger"]
        );
        assert_eq!(goal.motivation, vec!["hunger"]);
    }

    #[test]
    fn unknown_need_targets_itself() {
        let goal = goal_for_need(ActorId::new(), "boredom", 76, &GoalConfig::default());
        assert_eq!(goal.target, "boredom");
        assert_eq!(goal.description, "Address boredom");
        assert_eq!(goal.goal_type, GoalType::Survive);
    }

    #[test]
    fn urgent_need_creates_one_goal() {
        let (world, bob) = world_with_bob();
        let mut store = InMemoryGoalStore::new();
        let config = GoalConfig::default();

        let created =
            generate_goals(&world, &snapshot(bob, "hunger", 82), &mut store, &config).unwrap();
        assert_eq!(created.len(), 1);
        let record = created.first().unwrap();
        assert_eq!(record.actor_name, "Bob");
        assert_eq!(record.need, "hunger");
        assert_eq!(record.urgency, 82);
        assert_eq!(store.active_goals(Some(bob), None).unwrap().len(), 1);
    }

    #[test]
    fn existing_goal_for_same_need_suppresses_duplicate() {
        let (world, bob) = world_with_bob();
        let mut store = InMemoryGoalStore::new();
        let config = GoalConfig::default();
        let urgency = snapshot(bob, "hunger", 82);

        generate_goals(&world, &urgency, &mut store, &config).unwrap();
        let second = generate_goals(&world, &urgency, &mut store, &config).unwrap();

        assert!(second.is_empty());
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn goal_of_same_type_for_other_need_does_not_suppress() {
        let (world, bob) = world_with_bob();
        let mut store = InMemoryGoalStore::new();
        let config = GoalConfig::default();

        generate_goals(&world, &snapshot(bob, "thirst", 80), &mut store, &config).unwrap();
        let created =
            generate_goals(&world, &snapshot(bob, "hunger", 80), &mut store, &config).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn below_threshold_and_non_simulated_actors_are_skipped() {
        let (mut world, bob) = world_with_bob();
        let mut ghost = Actor::npc("ghost", "Ghost");
        ghost.alive = false;
        let ghost = world.add_actor(ghost);
        let hero = world.add_actor(Actor::player("hero", "Hero"));
        let mut store = InMemoryGoalStore::new();

        let urgency = UrgencySnapshot::from([
            (bob, UrgentNeed::new("hunger", 74)),
            (ghost, UrgentNeed::new("hunger", 99)),
            (hero, UrgentNeed::new("hunger", 99)),
        ]);
        let created = generate_goals(&world, &urgency, &mut store, &GoalConfig::default()).unwrap();

        assert!(created.is_empty());
        assert!(store.all().is_empty());
    }
}
