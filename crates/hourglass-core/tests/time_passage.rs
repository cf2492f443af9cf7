//! End-to-end tests of the time-passage step against in-memory
//! collaborators.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use chrono::{TimeDelta, Utc};
use hourglass_core::clock::parse_clock_time;
use hourglass_core::services::{RelationshipService, ServiceError};
use hourglass_core::stub::{
    CommitCounter, CountingRelationships, FixedTemporal, InMemoryGoalStore, TableNeedService,
};
use hourglass_core::{
    GameClock, LocationChange, PassageError, Services, SessionWorld, SimulationConfig,
    StepRequest, TimePassage,
};
use hourglass_types::{
    Actor, ActorId, DayPattern, Goal, GoalId, GoalStatus, GoalType, PriorityTier, RoutineEntry,
    TemporalEffects, Weekday,
};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// An RNG whose every `f64` draw is 0.0 (always succeed) or just under 1.0
/// (always fail).
struct FixedRng(u64);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        if self.0 == 0 { 0 } else { u32::MAX }
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let bytes = self.0.to_le_bytes();
        for (byte, value) in dst.iter_mut().zip(bytes.iter().cycle()) {
            *byte = *value;
        }
    }
}

const SUCCEED: u64 = 0;
const FAIL: u64 = u64::MAX;

struct Harness {
    needs: TableNeedService,
    relationships: CountingRelationships,
    temporal: FixedTemporal,
    goals: InMemoryGoalStore,
    persistence: CommitCounter,
}

impl Harness {
    fn new() -> Self {
        Self {
            // Flat needs: urgencies only change when a test sets them.
            needs: TableNeedService::new(0.0),
            relationships: CountingRelationships::default(),
            temporal: FixedTemporal::default(),
            goals: InMemoryGoalStore::new(),
            persistence: CommitCounter::default(),
        }
    }

    fn step(
        &mut self,
        world: &mut SessionWorld,
        request: &StepRequest,
        draw: u64,
    ) -> Result<hourglass_types::StepReport, PassageError> {
        let mut services = Services {
            needs: &mut self.needs,
            relationships: &mut self.relationships,
            temporal: &mut self.temporal,
            goals: &mut self.goals,
            persistence: &mut self.persistence,
        };
        TimePassage::default().simulate_step(world, &mut services, request, &mut FixedRng(draw))
    }
}

fn world_at(time: &str, weekday: Weekday) -> SessionWorld {
    SessionWorld::with_clock(GameClock::new(1, parse_clock_time(time).unwrap(), weekday).unwrap())
}

fn add_bob(world: &mut SessionWorld) -> ActorId {
    let bob = world.add_actor(Actor::npc("bob", "Bob"));
    world.add_routine(RoutineEntry {
        actor_id: bob,
        day_pattern: DayPattern::Daily,
        start: String::from("12:00"),
        end: String::from("18:00"),
        activity: String::from("selling wares"),
        location: Some(String::from("market")),
        priority: 0,
    });
    bob
}

fn authored_goal(actor_id: ActorId, steps: &[&str], current_step: usize) -> Goal {
    Goal {
        id: GoalId::new(),
        actor_id,
        goal_type: GoalType::Social,
        target: String::from("friends"),
        description: String::from("Catch up with friends"),
        success_condition: String::from("feels connected"),
        motivation: vec![String::from("social_connection")],
        triggered_by: String::from("scenario"),
        priority: PriorityTier::High,
        strategies: steps.iter().map(|s| (*s).to_owned()).collect(),
        current_step,
        status: GoalStatus::Active,
        created_at: Utc::now().checked_sub_signed(TimeDelta::hours(1)).unwrap(),
        closing_note: None,
    }
}

#[test]
fn bob_follows_his_market_routine() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    let mut harness = Harness::new();

    let report = harness
        .step(&mut world, &StepRequest::new(2.0, ActorId::new()), SUCCEED)
        .unwrap();

    let actor = world.actor(bob).unwrap();
    assert_eq!(actor.location.as_deref(), Some("market"));
    let movement = report.movements_of(bob).next().unwrap();
    assert_eq!(movement.from, None);
    assert_eq!(movement.to, "market");
    assert_eq!(movement.reason, "schedule: selling wares");
    assert_eq!(world.clock.as_ref().unwrap().time_string(), "13:30");
}

#[test]
fn clock_rolls_over_midnight_into_next_weekday() {
    let mut world = world_at("23:30", Weekday::Sun);
    let mut harness = Harness::new();

    harness
        .step(&mut world, &StepRequest::new(1.5, ActorId::new()), SUCCEED)
        .unwrap();

    let clock = world.clock.as_ref().unwrap();
    assert_eq!(clock.day(), 2);
    assert_eq!(clock.time_string(), "01:00");
    assert_eq!(clock.weekday(), Weekday::Mon);
}

#[test]
fn short_step_pursues_no_goals_and_moves_nobody() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    let mut harness = Harness::new();
    harness.goals.insert(authored_goal(bob, &["go to the tavern"], 0));
    harness.temporal.effects = TemporalEffects {
        lighting_change: Some(String::from("noon light")),
        ..TemporalEffects::default()
    };
    let player = ActorId::new();

    let request = StepRequest::new(0.49, player).at("inn");
    let report = harness.step(&mut world, &request, SUCCEED).unwrap();

    assert!(report.goal_steps.is_empty());
    assert!(report.movements.is_empty());
    assert_eq!(world.actor(bob).unwrap().location, None);
    assert_eq!(report.needs_updated, vec![player, bob]);
    assert_eq!(
        report.temporal.unwrap().lighting_change.as_deref(),
        Some("noon light")
    );
}

#[test]
fn pressing_need_keeps_npc_off_routine() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    let mut harness = Harness::new();
    harness.needs.set_urgency(bob, "energy", 71.0);

    let report = harness
        .step(&mut world, &StepRequest::new(2.0, ActorId::new()), SUCCEED)
        .unwrap();

    assert_eq!(report.movements_of(bob).count(), 0);
    assert_eq!(world.actor(bob).unwrap().location, None);
}

#[test]
fn goal_movement_ignores_need_override_and_wins_over_routine() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    let mut harness = Harness::new();
    harness.needs.set_urgency(bob, "social_connection", 72.0);
    harness
        .goals
        .insert(authored_goal(bob, &["go to the tavern", "talk to friends"], 0));

    let report = harness
        .step(&mut world, &StepRequest::new(2.0, ActorId::new()), SUCCEED)
        .unwrap();

    let moves: Vec<_> = report.movements_of(bob).collect();
    assert_eq!(moves.len(), 1);
    let movement = moves.first().unwrap();
    assert_eq!(movement.to, "tavern");
    assert_eq!(movement.reason, "goal: Catch up with friends");
    assert_eq!(world.actor(bob).unwrap().location.as_deref(), Some("tavern"));
}

#[test]
fn goal_cue_to_current_location_keeps_npc_off_routine() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    world.actor_mut(bob).unwrap().location = Some(String::from("tavern"));
    let mut harness = Harness::new();
    harness
        .goals
        .insert(authored_goal(bob, &["go to the tavern", "talk to friends"], 0));

    let report = harness
        .step(&mut world, &StepRequest::new(2.0, ActorId::new()), SUCCEED)
        .unwrap();

    assert!(report.goal_steps.first().unwrap().success);
    assert!(report.movements.is_empty());
    assert_eq!(world.actor(bob).unwrap().location.as_deref(), Some("tavern"));
}

#[test]
fn existing_goal_for_need_prevents_duplicate() {
    let mut world = world_at("08:00", Weekday::Mon);
    let bob = world.add_actor(Actor::npc("bob", "Bob"));
    let mut harness = Harness::new();
    harness.needs.set_urgency(bob, "hunger", 82.0);
    let mut existing = authored_goal(bob, &["look for bread"], 0);
    existing.goal_type = GoalType::Survive;
    existing.motivation = vec![String::from("hunger")];
    harness.goals.insert(existing);

    let report = harness
        .step(&mut world, &StepRequest::new(0.25, ActorId::new()), SUCCEED)
        .unwrap();

    assert!(report.goals_created.is_empty());
    assert_eq!(harness.goals.all().len(), 1);
}

#[test]
fn unmet_need_spawns_goal_that_is_pursued_the_same_step() {
    let mut world = world_at("08:00", Weekday::Mon);
    let bob = world.add_actor(Actor::npc("bob", "Bob"));
    let mut harness = Harness::new();
    harness.needs.set_urgency(bob, "hunger", 82.0);

    let report = harness
        .step(&mut world, &StepRequest::new(1.0, ActorId::new()), SUCCEED)
        .unwrap();

    let created = report.goals_created.first().unwrap();
    assert_eq!(created.priority, PriorityTier::High);
    let step = report.goal_steps.first().unwrap();
    assert_eq!(step.goal_id, created.goal_id);
    assert_eq!(step.step, "look for food");
    assert!(step.success);
    assert_eq!(harness.goals.get(created.goal_id).unwrap().current_step, 1);
}

#[test]
fn completed_goal_is_never_touched_again() {
    let mut world = world_at("08:00", Weekday::Mon);
    let bob = world.add_actor(Actor::npc("bob", "Bob"));
    let mut harness = Harness::new();
    let goal = authored_goal(bob, &["look around", "talk to friends"], 1);
    let goal_id = goal.id;
    harness.goals.insert(goal);

    let first = harness
        .step(&mut world, &StepRequest::new(1.0, ActorId::new()), SUCCEED)
        .unwrap();
    assert_eq!(first.goals_completed, vec![goal_id]);
    let after_first = harness.goals.get(goal_id).unwrap().clone();
    assert_eq!(after_first.status, GoalStatus::Completed);
    assert_eq!(after_first.current_step, 2);

    let second = harness
        .step(&mut world, &StepRequest::new(1.0, ActorId::new()), SUCCEED)
        .unwrap();
    assert!(second.goals_completed.is_empty());
    assert!(second.goal_steps.is_empty());
    assert_eq!(harness.goals.get(goal_id).unwrap(), &after_first);
}

#[test]
fn failed_step_blocks_goal_without_moving() {
    let mut world = world_at("20:00", Weekday::Mon);
    let bob = world.add_actor(Actor::npc("bob", "Bob"));
    let mut harness = Harness::new();
    let goal = authored_goal(bob, &["go to the tavern", "talk to friends"], 0);
    let goal_id = goal.id;
    harness.goals.insert(goal);

    let report = harness
        .step(&mut world, &StepRequest::new(1.0, ActorId::new()), FAIL)
        .unwrap();

    assert_eq!(report.goals_failed, vec![goal_id]);
    assert!(report.movements.is_empty());
    let stored = harness.goals.get(goal_id).unwrap();
    assert_eq!(stored.status, GoalStatus::Blocked);
    assert_eq!(stored.current_step, 0);
}

#[test]
fn npcs_sharing_a_location_are_not_alone() {
    let mut world = world_at("08:00", Weekday::Mon);
    let mut ann = Actor::npc("ann", "Ann");
    ann.location = Some(String::from("tavern"));
    let ann = world.add_actor(ann);
    let mut cid = Actor::npc("cid", "Cid");
    cid.location = Some(String::from("tavern"));
    world.add_actor(cid);
    let mut dee = Actor::npc("dee", "Dee");
    dee.location = Some(String::from("temple"));
    let dee = world.add_actor(dee);
    let mut harness = Harness::new();

    harness
        .step(&mut world, &StepRequest::new(1.0, ActorId::new()), SUCCEED)
        .unwrap();

    let alone = |id: ActorId| {
        harness
            .needs
            .calls()
            .iter()
            .find(|call| call.actor_id == id)
            .unwrap()
            .is_alone
    };
    assert!(!alone(ann));
    assert!(alone(dee));
}

/// Relationship service that is always down.
struct DownRelationships;

impl RelationshipService for DownRelationships {
    fn expire_mood_modifiers(&mut self) -> Result<u32, ServiceError> {
        Err(ServiceError::Unavailable {
            service: "relationships",
            message: String::from("connection refused"),
        })
    }
}

#[test]
fn failing_collaborator_leaves_world_untouched() {
    let mut world = world_at("11:30", Weekday::Mon);
    let bob = add_bob(&mut world);
    let before = world.clone();
    let mut harness = Harness::new();
    let mut relationships = DownRelationships;

    let mut services = Services {
        needs: &mut harness.needs,
        relationships: &mut relationships,
        temporal: &mut harness.temporal,
        goals: &mut harness.goals,
        persistence: &mut harness.persistence,
    };
    let result = TimePassage::default().simulate_step(
        &mut world,
        &mut services,
        &StepRequest::new(2.0, ActorId::new()),
        &mut FixedRng(SUCCEED),
    );

    assert!(matches!(
        result,
        Err(PassageError::Service {
            phase: "mood modifier expiry",
            ..
        })
    ));
    assert_eq!(world, before);
    assert_eq!(world.actor(bob).unwrap().location, None);
    assert_eq!(harness.persistence.commits, 0);
}

#[test]
fn seeded_rolls_replay_identically() {
    let outcomes = |seed: u64| {
        let mut world = world_at("08:00", Weekday::Mon);
        let mut harness = Harness::new();
        for n in 0..12 {
            let actor = world.add_actor(Actor::npc(&format!("npc{n}"), "Villager"));
            harness
                .goals
                .insert(authored_goal(actor, &["ask around", "talk to friends"], 0));
        }
        let mut services = Services {
            needs: &mut harness.needs,
            relationships: &mut harness.relationships,
            temporal: &mut harness.temporal,
            goals: &mut harness.goals,
            persistence: &mut harness.persistence,
        };
        let report = TimePassage::default()
            .simulate_step(
                &mut world,
                &mut services,
                &StepRequest::new(1.0, ActorId::new()),
                &mut SmallRng::seed_from_u64(seed),
            )
            .unwrap();
        report
            .goal_steps
            .iter()
            .map(|step| step.success)
            .collect::<Vec<_>>()
    };

    assert_eq!(outcomes(42), outcomes(42));
    assert_eq!(outcomes(42).len(), 12);
}

#[test]
fn shipped_config_charges_five_minutes_for_an_instant_trip() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../hourglass-config.yaml");
    let config = SimulationConfig::from_file(&path).unwrap();
    let passage = TimePassage::new(config);
    let mut world = world_at("08:00", Weekday::Mon);
    let player = world.add_actor(Actor::player("hero", "Hero"));
    let mut harness = Harness::new();
    let change = LocationChange {
        player_id: player,
        from: Some(String::from("inn")),
        to: String::from("market"),
        travel_hours: 0.0,
        player_alone: true,
    };

    let mut services = Services {
        needs: &mut harness.needs,
        relationships: &mut harness.relationships,
        temporal: &mut harness.temporal,
        goals: &mut harness.goals,
        persistence: &mut harness.persistence,
    };
    passage
        .on_location_change(&mut world, &mut services, &change, &mut FixedRng(SUCCEED))
        .unwrap();

    assert_eq!(world.clock.as_ref().unwrap().time_string(), "08:05");
    assert_eq!(
        world.actor(player).unwrap().location.as_deref(),
        Some("market")
    );
}
