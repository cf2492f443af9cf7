//! In-memory collaborator implementations.
//!
//! These back the engine harness and the tests. They keep their state in
//! plain collections, record what they were asked, and never fail on their
//! own. None of them tries to model the real services faithfully: the need
//! table uses a flat per-hour rise, the relationship stub expires whatever
//! count it was primed with, and so on.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use hourglass_types::{
    ActivityKind, ActorId, Goal, GoalId, GoalStatus, GoalType, NewGoal, TemporalEffects,
    UrgentNeed,
};

use crate::services::{
    GoalStore, NeedService, Persistence, RelationshipService, ServiceError, TemporalService,
};

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// Goal store backed by a `Vec`, in creation order.
///
/// Creation timestamps are forced to be strictly increasing so that goals
/// created back to back still have a stable age order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGoalStore {
    goals: Vec<Goal>,
    last_created: Option<DateTime<Utc>>,
}

impl InMemoryGoalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every goal, whatever its status.
    pub fn all(&self) -> &[Goal] {
        &self.goals
    }

    /// Look up a goal by ID.
    pub fn get(&self, goal_id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    /// Insert a fully formed goal, e.g. one authored by a scenario.
    pub fn insert(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last
                .checked_add_signed(TimeDelta::microseconds(1))
                .unwrap_or(last),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }

    fn open_goal_mut(&mut self, goal_id: GoalId) -> Result<&mut Goal, ServiceError> {
        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| ServiceError::NotFound {
                service: "goal store",
                what: format!("goal {goal_id}"),
            })?;
        if goal.status.is_terminal() {
            return Err(ServiceError::Rejected {
                service: "goal store",
                reason: format!("goal {goal_id} is already {:?}", goal.status),
            });
        }
        Ok(goal)
    }

    fn close(&mut self, goal_id: GoalId, status: GoalStatus, note: &str) -> Result<(), ServiceError> {
        let goal = self.open_goal_mut(goal_id)?;
        goal.status = status;
        goal.closing_note = Some(note.to_owned());
        Ok(())
    }
}

impl GoalStore for InMemoryGoalStore {
    fn active_goals(
        &self,
        actor_id: Option<ActorId>,
        goal_type: Option<GoalType>,
    ) -> Result<Vec<Goal>, ServiceError> {
        Ok(self
            .goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .filter(|g| actor_id.is_none_or(|id| g.actor_id == id))
            .filter(|g| goal_type.is_none_or(|t| g.goal_type == t))
            .cloned()
            .collect())
    }

    fn create_goal(&mut self, goal: NewGoal) -> Result<Goal, ServiceError> {
        let created_at = self.next_timestamp();
        let goal = Goal {
            id: GoalId::new(),
            actor_id: goal.actor_id,
            goal_type: goal.goal_type,
            target: goal.target,
            description: goal.description,
            success_condition: goal.success_condition,
            motivation: goal.motivation,
            triggered_by: goal.triggered_by,
            priority: goal.priority,
            strategies: goal.strategies,
            current_step: 0,
            status: GoalStatus::Active,
            created_at,
            closing_note: None,
        };
        self.goals.push(goal.clone());
        Ok(goal)
    }

    fn record_progress(&mut self, goal_id: GoalId, step_index: usize) -> Result<(), ServiceError> {
        let goal = self.open_goal_mut(goal_id)?;
        if step_index > goal.strategies.len() {
            return Err(ServiceError::Rejected {
                service: "goal store",
                reason: format!(
                    "step {step_index} is past the {} steps of goal {goal_id}",
                    goal.strategies.len()
                ),
            });
        }
        goal.current_step = step_index;
        Ok(())
    }

    fn complete_goal(&mut self, goal_id: GoalId, note: &str) -> Result<(), ServiceError> {
        self.close(goal_id, GoalStatus::Completed, note)
    }

    fn block_goal(&mut self, goal_id: GoalId, note: &str) -> Result<(), ServiceError> {
        self.close(goal_id, GoalStatus::Blocked, note)
    }
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// One call to [`NeedService::apply_time_decay`], as recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayCall {
    /// Actor whose needs decayed.
    pub actor_id: ActorId,
    /// Hours of decay.
    pub hours: f64,
    /// Activity the actor was doing.
    pub activity: ActivityKind,
    /// Whether the actor was alone.
    pub is_alone: bool,
}

/// Need table: per-actor urgency values that rise by a flat rate per hour.
///
/// Energy falls while sleeping or resting; social needs fall while
/// socializing and rise faster when alone. Everything else simply rises.
#[derive(Debug, Clone)]
pub struct TableNeedService {
    needs: BTreeMap<ActorId, BTreeMap<String, f64>>,
    rise_per_hour: f64,
    calls: Vec<DecayCall>,
}

impl Default for TableNeedService {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl TableNeedService {
    /// Create an empty table with the given urgency rise per hour.
    pub const fn new(rise_per_hour: f64) -> Self {
        Self {
            needs: BTreeMap::new(),
            rise_per_hour,
            calls: Vec::new(),
        }
    }

    /// Set one need's urgency, clamped to `0..=100`.
    pub fn set_urgency(&mut self, actor_id: ActorId, need: &str, urgency: f64) {
        self.needs
            .entry(actor_id)
            .or_default()
            .insert(need.to_owned(), urgency.clamp(0.0, 100.0));
    }

    /// Current urgency of one need.
    pub fn urgency(&self, actor_id: ActorId, need: &str) -> Option<f64> {
        self.needs.get(&actor_id)?.get(need).copied()
    }

    /// Every decay call received, in order.
    pub fn calls(&self) -> &[DecayCall] {
        &self.calls
    }

    fn rate_for(&self, need: &str, activity: ActivityKind, is_alone: bool) -> f64 {
        let rate = self.rise_per_hour;
        let social = need.contains("social") || need == "intimacy";
        match activity {
            ActivityKind::Sleeping if need == "energy" => -3.0 * rate,
            ActivityKind::Resting if need == "energy" => -rate,
            ActivityKind::Socializing if social => -2.0 * rate,
            _ if social && is_alone => 1.5 * rate,
            _ => rate,
        }
    }
}

impl NeedService for TableNeedService {
    fn apply_time_decay(
        &mut self,
        actor_id: ActorId,
        hours: f64,
        activity: ActivityKind,
        is_alone: bool,
    ) -> Result<(), ServiceError> {
        self.calls.push(DecayCall {
            actor_id,
            hours,
            activity,
            is_alone,
        });
        let rates: Vec<(String, f64)> = self
            .needs
            .get(&actor_id)
            .map(|needs| {
                needs
                    .keys()
                    .map(|need| (need.clone(), self.rate_for(need, activity, is_alone)))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(needs) = self.needs.get_mut(&actor_id) {
            for (need, rate) in rates {
                if let Some(value) = needs.get_mut(&need) {
                    *value = rate.mul_add(hours, *value).clamp(0.0, 100.0);
                }
            }
        }
        Ok(())
    }

    fn most_urgent_need(&self, actor_id: ActorId) -> Result<Option<UrgentNeed>, ServiceError> {
        let Some(needs) = self.needs.get(&actor_id) else {
            return Ok(None);
        };
        // Strictly greater keeps the alphabetically first need on a tie.
        let top = needs.iter().fold(None, |best: Option<(&String, f64)>, (need, value)| {
            match best {
                Some((_, best_value)) if *value <= best_value => best,
                _ => Some((need, *value)),
            }
        });
        Ok(top.map(|(need, value)| UrgentNeed::new(need, whole_urgency(value))))
    }
}

/// Round a clamped urgency to a whole number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_urgency(value: f64) -> u32 {
    // Values are clamped to 0..=100 on every write.
    value.round().clamp(0.0, 100.0) as u32
}

// ---------------------------------------------------------------------------
// Relationships, temporal effects, persistence
// ---------------------------------------------------------------------------

/// Relationship service that expires a primed number of modifiers.
#[derive(Debug, Clone, Default)]
pub struct CountingRelationships {
    /// Modifiers that will expire on the next call.
    pub pending: u32,
    /// How many times expiry was requested.
    pub calls: u32,
}

impl RelationshipService for CountingRelationships {
    fn expire_mood_modifiers(&mut self) -> Result<u32, ServiceError> {
        self.calls = self.calls.saturating_add(1);
        Ok(std::mem::take(&mut self.pending))
    }
}

/// Temporal service that always reports the same effects.
#[derive(Debug, Clone, Default)]
pub struct FixedTemporal {
    /// Effects returned for every request.
    pub effects: TemporalEffects,
    /// `(hours, location)` of every request, in order.
    pub requests: Vec<(f64, String)>,
}

impl TemporalService for FixedTemporal {
    fn calculate_temporal_effects(
        &mut self,
        hours: f64,
        location: &str,
    ) -> Result<TemporalEffects, ServiceError> {
        self.requests.push((hours, location.to_owned()));
        Ok(self.effects.clone())
    }
}

/// Persistence boundary that only counts commits.
#[derive(Debug, Clone, Default)]
pub struct CommitCounter {
    /// Number of successful commits.
    pub commits: u32,
}

impl Persistence for CommitCounter {
    fn commit(&mut self) -> Result<(), ServiceError> {
        self.commits = self.commits.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hourglass_types::PriorityTier;

    use super::*;

    fn new_goal(actor_id: ActorId) -> NewGoal {
        NewGoal {
            actor_id,
            goal_type: GoalType::Survive,
            target: String::from("food"),
            description: String::from("Find something to eat"),
            success_condition: String::from("hunger drops below 55"),
            motivation: vec![String::from("hunger")],
            triggered_by: String::from("need_urgency_80"),
            priority: PriorityTier::High,
            strategies: vec![String::from("look for food"), String::from("acquire food")],
        }
    }

    #[test]
    fn created_goals_start_active_and_ordered() {
        let actor = ActorId::new();
        let mut store = InMemoryGoalStore::new();
        let first = store.create_goal(new_goal(actor)).unwrap();
        let second = store.create_goal(new_goal(actor)).unwrap();

        assert_eq!(first.status, GoalStatus::Active);
        assert_eq!(first.current_step, 0);
        assert!(first.created_at < second.created_at);
        assert_eq!(store.active_goals(Some(actor), None).unwrap().len(), 2);
        assert!(store.active_goals(Some(ActorId::new()), None).unwrap().is_empty());
        assert!(store.active_goals(None, Some(GoalType::Social)).unwrap().is_empty());
    }

    #[test]
    fn closed_goals_cannot_be_closed_again() {
        let mut store = InMemoryGoalStore::new();
        let goal = store.create_goal(new_goal(ActorId::new())).unwrap();

        store.complete_goal(goal.id, "done").unwrap();
        assert_eq!(store.get(goal.id).unwrap().status, GoalStatus::Completed);
        assert!(store.active_goals(None, None).unwrap().is_empty());
        assert!(matches!(
            store.block_goal(goal.id, "late failure"),
            Err(ServiceError::Rejected { .. })
        ));
        assert!(matches!(
            store.complete_goal(GoalId::new(), "missing"),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn progress_cannot_pass_the_last_step() {
        let mut store = InMemoryGoalStore::new();
        let goal = store.create_goal(new_goal(ActorId::new())).unwrap();

        store.record_progress(goal.id, 2).unwrap();
        assert_eq!(store.get(goal.id).unwrap().current_step, 2);
        assert!(store.record_progress(goal.id, 3).is_err());
    }

    #[test]
    fn needs_rise_and_report_the_most_urgent() {
        let actor = ActorId::new();
        let mut needs = TableNeedService::new(10.0);
        needs.set_urgency(actor, "hunger", 50.0);
        needs.set_urgency(actor, "energy", 60.0);

        needs
            .apply_time_decay(actor, 2.0, ActivityKind::Active, false)
            .unwrap();
        assert_eq!(needs.urgency(actor, "hunger"), Some(70.0));
        assert_eq!(
            needs.most_urgent_need(actor).unwrap(),
            Some(UrgentNeed::new("energy", 80))
        );

        needs
            .apply_time_decay(actor, 1.0, ActivityKind::Sleeping, false)
            .unwrap();
        assert_eq!(needs.urgency(actor, "energy"), Some(50.0));
        assert_eq!(needs.calls().len(), 2);
        assert!(needs.most_urgent_need(ActorId::new()).unwrap().is_none());
    }

    #[test]
    fn urgency_is_clamped() {
        let actor = ActorId::new();
        let mut needs = TableNeedService::new(50.0);
        needs.set_urgency(actor, "hunger", 90.0);
        needs
            .apply_time_decay(actor, 3.0, ActivityKind::Active, true)
            .unwrap();
        assert_eq!(needs.urgency(actor, "hunger"), Some(100.0));
    }

    #[test]
    fn relationship_stub_expires_pending_once() {
        let mut relationships = CountingRelationships {
            pending: 3,
            calls: 0,
        };
        assert_eq!(relationships.expire_mood_modifiers().unwrap(), 3);
        assert_eq!(relationships.expire_mood_modifiers().unwrap(), 0);
        assert_eq!(relationships.calls, 2);
    }
}
