//! Time passage: the step sequence that advances a session by some hours.
//!
//! Each step runs these phases in order:
//!
//! 1. **Player decay** -- the player's needs decay for the elapsed hours.
//! 2. **NPC decay** -- every simulated NPC's needs decay, with the activity
//!    taken from a pressing need or, failing that, the routine.
//! 3. **Temporal effects** -- environmental changes at the player's
//!    location, when one is known.
//! 4. **Goal generation** -- unmet needs spawn goals.
//! 5. **Goal pursuit** -- each actor attempts one step of its primary goal.
//! 6. **Routine positions** -- NPCs not moved by a goal follow their
//!    schedule as of the end of the step.
//! 7. **Mood expiry** -- expired mood modifiers are cleared.
//! 8. **Clock** -- the session clock moves forward.
//! 9. **Commit** -- the persistence boundary is flushed once.
//!
//! The world is mutated on a staged copy that replaces the caller's world
//! only after the commit succeeds. A failed step leaves the world as it
//! was; collaborators are expected to roll back their own writes when the
//! commit never arrives.

use hourglass_types::{ActivityKind, ActorId, StepReport};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, GameClock};
use crate::config::SimulationConfig;
use crate::goals::generate_goals;
use crate::positions::update_positions;
use crate::pursuit::pursue_goals;
use crate::rules::{classify_activity, urgent_need_activity};
use crate::schedule::ScheduleError;
use crate::services::{NeedService, ServiceError, Services};
use crate::world::{SessionWorld, UrgencySnapshot};

/// Errors that abort a time-passage step.
#[derive(Debug, thiserror::Error)]
pub enum PassageError {
    /// The requested duration is negative or not a number.
    #[error("invalid step duration: {hours} hours")]
    InvalidHours {
        /// The rejected duration.
        hours: f64,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A routine entry could not be resolved.
    #[error("schedule error: {source}")]
    Schedule {
        /// The underlying schedule error.
        #[from]
        source: ScheduleError,
    },

    /// A collaborator failed during a phase.
    #[error("{phase} failed: {source}")]
    Service {
        /// The phase that was running.
        phase: &'static str,
        /// The underlying collaborator error.
        source: ServiceError,
    },
}

/// Attach the running phase to a collaborator error.
fn in_phase(phase: &'static str) -> impl FnOnce(ServiceError) -> PassageError {
    move |source| PassageError::Service { phase, source }
}

/// What the caller tells the orchestrator about the player for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRequest {
    /// In-game hours to simulate.
    pub hours: f64,
    /// The player character.
    pub player_id: ActorId,
    /// What the player was doing.
    pub player_activity: ActivityKind,
    /// Where the player is, if anywhere in particular.
    pub player_location: Option<String>,
    /// Whether the player was alone.
    pub player_alone: bool,
}

impl StepRequest {
    /// A step of `hours` for a player doing something active, alone, nowhere
    /// in particular.
    pub const fn new(hours: f64, player_id: ActorId) -> Self {
        Self {
            hours,
            player_id,
            player_activity: ActivityKind::Active,
            player_location: None,
            player_alone: true,
        }
    }

    /// Set the player's location.
    #[must_use]
    pub fn at(mut self, location: &str) -> Self {
        self.player_location = Some(location.to_owned());
        self
    }
}

/// The player moving between locations.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationChange {
    /// The player character.
    pub player_id: ActorId,
    /// Where the player left from.
    pub from: Option<String>,
    /// Where the player arrived.
    pub to: String,
    /// Reported travel time in hours; zero when the caller does not know.
    pub travel_hours: f64,
    /// Whether the player travelled alone.
    pub player_alone: bool,
}

/// The time-passage orchestrator.
#[derive(Debug, Clone, Default)]
pub struct TimePassage {
    config: SimulationConfig,
}

impl TimePassage {
    /// Create an orchestrator with the given configuration.
    pub const fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate `request.hours` of in-game time.
    ///
    /// On success the world reflects the whole step and the report lists
    /// what happened. On error the world is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PassageError::InvalidHours`] for negative or non-finite
    /// durations, and otherwise the first clock, schedule, or collaborator
    /// error raised by any phase.
    pub fn simulate_step(
        &self,
        world: &mut SessionWorld,
        services: &mut Services<'_>,
        request: &StepRequest,
        rng: &mut impl Rng,
    ) -> Result<StepReport, PassageError> {
        let hours = request.hours;
        if !hours.is_finite() || hours < 0.0 {
            return Err(PassageError::InvalidHours { hours });
        }

        let mut staged = world.clone();
        let mut report = StepReport::new(hours);
        info!(hours, clock = ?staged.clock, "Time passage step started");

        if let Some(location) = &request.player_location
            && let Some(player) = staged.actor_mut(request.player_id)
        {
            player.location = Some(location.clone());
        }

        // --- Phase 1: Player decay ---
        services
            .needs
            .apply_time_decay(
                request.player_id,
                hours,
                request.player_activity,
                request.player_alone,
            )
            .map_err(in_phase("player need decay"))?;
        report.needs_updated.push(request.player_id);

        // --- Phase 2: NPC decay ---
        let npcs = staged.simulated_npcs();
        for npc_id in &npcs {
            let activity = self.decay_activity(&staged, &*services.needs, *npc_id)?;
            let alone = staged.is_alone(*npc_id);
            services
                .needs
                .apply_time_decay(*npc_id, hours, activity, alone)
                .map_err(in_phase("npc need decay"))?;
            report.needs_updated.push(*npc_id);
        }

        // --- Phase 3: Temporal effects ---
        if let Some(location) = &request.player_location {
            let effects = services
                .temporal
                .calculate_temporal_effects(hours, location)
                .map_err(in_phase("temporal effects"))?;
            report.temporal = Some(effects);
        }

        let mut urgency = UrgencySnapshot::new();
        for npc_id in &npcs {
            if let Some(need) = services
                .needs
                .most_urgent_need(*npc_id)
                .map_err(in_phase("need snapshot"))?
            {
                urgency.insert(*npc_id, need);
            }
        }

        // --- Phase 4: Goal generation ---
        report.goals_created =
            generate_goals(&staged, &urgency, &mut *services.goals, &self.config.goals)
                .map_err(in_phase("goal generation"))?;

        // --- Phase 5: Goal pursuit ---
        let pursuit = pursue_goals(
            hours,
            &mut staged,
            &mut *services.goals,
            &self.config.pursuit,
            rng,
        )
        .map_err(in_phase("goal pursuit"))?;
        report.goal_steps = pursuit.steps;
        report.goals_completed = pursuit.completed;
        report.goals_failed = pursuit.blocked;
        report.movements = pursuit.movements;

        // --- Phase 6: Routine positions ---
        let advanced = staged
            .clock
            .as_ref()
            .map(|clock| advanced_clock(clock, hours))
            .transpose()?;
        if let Some(end_of_step) = &advanced {
            let routine_moves = update_positions(
                hours,
                &mut staged,
                end_of_step,
                &urgency,
                &pursuit.moved,
                &self.config.positions,
            )?;
            report.movements.extend(routine_moves);
        }

        // --- Phase 7: Mood expiry ---
        report.expired_modifiers = services
            .relationships
            .expire_mood_modifiers()
            .map_err(in_phase("mood modifier expiry"))?;

        // --- Phase 8: Clock ---
        if advanced.is_none() {
            warn!("Session has no clock; time not advanced");
        }
        staged.clock = advanced;

        // --- Phase 9: Commit ---
        services
            .persistence
            .commit()
            .map_err(in_phase("commit"))?;

        *world = staged;
        info!(
            hours,
            clock = ?world.clock,
            movements = report.movements.len(),
            goals_created = report.goals_created.len(),
            goals_completed = report.goals_completed.len(),
            goals_failed = report.goals_failed.len(),
            expired_modifiers = report.expired_modifiers,
            "Time passage step finished"
        );
        Ok(report)
    }

    /// Simulate the time a player spends travelling between locations.
    ///
    /// A change of location that reports no travel time is charged the
    /// configured minimum. The step runs with the player active at the
    /// destination.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`TimePassage::simulate_step`].
    pub fn on_location_change(
        &self,
        world: &mut SessionWorld,
        services: &mut Services<'_>,
        change: &LocationChange,
        rng: &mut impl Rng,
    ) -> Result<StepReport, PassageError> {
        let moved = change.from.as_deref() != Some(change.to.as_str());
        let hours = if moved && change.travel_hours <= 0.0 {
            self.config.travel.minimum_hours()
        } else {
            change.travel_hours
        };
        debug!(from = ?change.from, to = %change.to, hours, "Player changed location");

        let request = StepRequest {
            hours,
            player_id: change.player_id,
            player_activity: ActivityKind::Active,
            player_location: Some(change.to.clone()),
            player_alone: change.player_alone,
        };
        self.simulate_step(world, services, &request, rng)
    }

    /// The activity an NPC's needs decay under this step.
    ///
    /// A need above the urgent threshold decides; otherwise the routine
    /// entry at the current time does; otherwise the NPC counts as active.
    fn decay_activity(
        &self,
        world: &SessionWorld,
        needs: &dyn NeedService,
        npc_id: ActorId,
    ) -> Result<ActivityKind, PassageError> {
        let top = needs
            .most_urgent_need(npc_id)
            .map_err(in_phase("npc need decay"))?;
        if let Some(need) = top.filter(|n| n.urgency > self.config.activity.urgent_need_threshold)
        {
            let forced = urgent_need_activity(&need.need);
            debug!(
                actor_id = %npc_id,
                need = %need.need,
                urgency = need.urgency,
                activity = forced.label,
                "Pressing need overrides routine activity"
            );
            return Ok(forced.kind);
        }

        let Some(clock) = &world.clock else {
            return Ok(ActivityKind::Active);
        };
        Ok(world
            .routines
            .resolve(npc_id, clock.weekday(), clock.time())?
            .map_or(ActivityKind::Active, |entry| classify_activity(&entry.activity)))
    }
}

/// A copy of `clock` moved forward by `hours`.
fn advanced_clock(clock: &GameClock, hours: f64) -> Result<GameClock, ClockError> {
    let mut next = clock.clone();
    let advance = next.advance(hours)?;
    debug!(
        minutes = advance.minutes,
        days_passed = advance.days_passed,
        time = %next.time_string(),
        "Clock advanced"
    );
    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Weekday;
    use hourglass_types::{Actor, DayPattern, RoutineEntry};

    use super::*;
    use crate::clock::parse_clock_time;
    use crate::pursuit::tests::FixedRng;
    use crate::stub::{
        CommitCounter, CountingRelationships, FixedTemporal, InMemoryGoalStore, TableNeedService,
    };

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
                needs: TableNeedService::new(0.0),
                relationships: CountingRelationships::default(),
                temporal: FixedTemporal::default(),
                goals: InMemoryGoalStore::new(),
                persistence: CommitCounter::default(),
            }
        }

        fn services(&mut self) -> Services<'_> {
            Services {
                needs: &mut self.needs,
                relationships: &mut self.relationships,
                temporal: &mut self.temporal,
                goals: &mut self.goals,
                persistence: &mut self.persistence,
            }
        }
    }

    fn world_at(time: &str) -> SessionWorld {
        SessionWorld::with_clock(
            GameClock::new(1, parse_clock_time(time).unwrap(), Weekday::Mon).unwrap(),
        )
    }

    #[test]
    fn negative_hours_are_rejected_without_side_effects() {
        let mut world = world_at("08:00");
        let mut harness = Harness::new();
        let request = StepRequest::new(-1.0, ActorId::new());

        let result = TimePassage::default().simulate_step(
            &mut world,
            &mut harness.services(),
            &request,
            &mut FixedRng::succeed(),
        );

        assert!(matches!(result, Err(PassageError::InvalidHours { .. })));
        assert_eq!(harness.persistence.commits, 0);
        assert!(harness.needs.calls().is_empty());
    }

    #[test]
    fn step_advances_clock_and_commits_once() {
        let mut world = world_at("08:00");
        let mut harness = Harness::new();
        let request = StepRequest::new(2.5, ActorId::new());

        TimePassage::default()
            .simulate_step(
                &mut world,
                &mut harness.services(),
                &request,
                &mut FixedRng::succeed(),
            )
            .unwrap();

        assert_eq!(world.clock.as_ref().unwrap().time_string(), "10:30");
        assert_eq!(harness.persistence.commits, 1);
        assert_eq!(harness.relationships.calls, 1);
    }

    #[test]
    fn routine_label_sets_decay_activity() {
        let mut world = world_at("23:00");
        let bob = world.add_actor(Actor::npc("bob", "Bob"));
        world.add_routine(RoutineEntry {
            actor_id: bob,
            day_pattern: DayPattern::Daily,
            start: String::from("22:00"),
            end: String::from("06:00"),
            activity: String::from("sleeping"),
            location: Some(String::from("home_bob")),
            priority: 0,
        });
        let mut harness = Harness::new();
        let player = ActorId::new();

        TimePassage::default()
            .simulate_step(
                &mut world,
                &mut harness.services(),
                &StepRequest::new(1.0, player),
                &mut FixedRng::succeed(),
            )
            .unwrap();

        let calls = harness.needs.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.first().unwrap().actor_id, player);
        let npc_call = calls.get(1).unwrap();
        assert_eq!(npc_call.actor_id, bob);
        assert_eq!(npc_call.activity, ActivityKind::Sleeping);
    }

    #[test]
    fn pressing_need_overrides_routine_activity() {
        let mut world = world_at("23:00");
        let bob = world.add_actor(Actor::npc("bob", "Bob"));
        world.add_routine(RoutineEntry {
            actor_id: bob,
            day_pattern: DayPattern::Daily,
            start: String::from("22:00"),
            end: String::from("06:00"),
            activity: String::from("sleeping"),
            location: None,
            priority: 0,
        });
        let mut harness = Harness::new();
        harness.needs.set_urgency(bob, "hunger", 71.0);

        TimePassage::default()
            .simulate_step(
                &mut world,
                &mut harness.services(),
                &StepRequest::new(0.25, ActorId::new()),
                &mut FixedRng::succeed(),
            )
            .unwrap();

        let npc_call = harness.needs.calls().get(1).unwrap();
        assert_eq!(npc_call.activity, ActivityKind::Active);
    }

    #[test]
    fn location_change_without_travel_time_costs_minimum() {
        let mut world = world_at("08:00");
        let mut harness = Harness::new();
        let change = LocationChange {
            player_id: ActorId::new(),
            from: Some(String::from("inn")),
            to: String::from("market"),
            travel_hours: 0.0,
            player_alone: true,
        };

        let report = TimePassage::default()
            .on_location_change(
                &mut world,
                &mut harness.services(),
                &change,
                &mut FixedRng::succeed(),
            )
            .unwrap();

        assert!((report.hours - 5.0 / 60.0).abs() < 1e-9);
        assert_eq!(world.clock.as_ref().unwrap().time_string(), "08:05");
        let (hours, location) = harness.temporal.requests.first().unwrap();
        assert!((hours - 5.0 / 60.0).abs() < 1e-9);
        assert_eq!(location, "market");
    }

    #[test]
    fn missing_clock_is_left_missing() {
        let mut world = SessionWorld::new();
        let mut harness = Harness::new();

        let report = TimePassage::default()
            .simulate_step(
                &mut world,
                &mut harness.services(),
                &StepRequest::new(1.0, ActorId::new()),
                &mut FixedRng::succeed(),
            )
            .unwrap();

        assert!(world.clock.is_none());
        assert!(report.movements.is_empty());
        assert_eq!(harness.persistence.commits, 1);
    }
}
