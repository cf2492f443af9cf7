//! Routine lookup: which entry of an actor's schedule applies right now.
//!
//! An entry applies when its day pattern covers the weekday and its time
//! window contains the time of day. Windows whose end is earlier than their
//! start cross midnight. Among applicable entries the highest priority
//! wins; equal priorities fall back to the order in which entries were
//! added to the [`RoutineBook`].
//!
//! Entry times are parsed on use. A malformed `"HH:MM"` is corrupt upstream
//! data and surfaces as a [`ScheduleError`] rather than being skipped.

use std::collections::BTreeMap;

use chrono::{NaiveTime, Weekday};
use hourglass_types::{ActorId, RoutineEntry};
use serde::{Deserialize, Serialize};

use crate::clock::{TimeParseError, minute_of_day, parse_clock_time};

/// Errors that can occur while resolving a routine.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A routine entry carries a time that is not `"HH:MM"`.
    #[error("routine entry for actor {actor_id} has malformed {field} time: {source}")]
    MalformedTime {
        /// The actor owning the entry.
        actor_id: ActorId,
        /// Which field was malformed (`start` or `end`).
        field: &'static str,
        /// The underlying parse error.
        source: TimeParseError,
    },
}

/// The activity label and location of a resolved routine entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActivity {
    /// Free-text activity label.
    pub activity: String,
    /// Location key, if the entry names one.
    pub location: Option<String>,
}

/// Every actor's routine entries, in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineBook {
    /// Entries keyed by owning actor.
    entries: BTreeMap<ActorId, Vec<RoutineEntry>>,
}

impl RoutineBook {
    /// Create an empty routine book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to its actor's routine.
    pub fn insert(&mut self, entry: RoutineEntry) {
        self.entries.entry(entry.actor_id).or_default().push(entry);
    }

    /// All entries of one actor, in authoring order.
    pub fn entries_for(&self, actor_id: ActorId) -> &[RoutineEntry] {
        self.entries
            .get(&actor_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the actor has at least one routine entry.
    pub fn has_routine(&self, actor_id: ActorId) -> bool {
        !self.entries_for(actor_id).is_empty()
    }

    /// Actors with at least one routine entry.
    pub fn actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.entries
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(actor_id, _)| *actor_id)
    }

    /// The winning routine entry for an actor at a weekday and time.
    ///
    /// Returns `Ok(None)` when nothing applies.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::MalformedTime`] if a candidate entry for this
    /// weekday has an unparseable start or end.
    pub fn resolve(
        &self,
        actor_id: ActorId,
        weekday: Weekday,
        time: NaiveTime,
    ) -> Result<Option<&RoutineEntry>, ScheduleError> {
        resolve_entry(self.entries_for(actor_id), weekday, time)
    }

    /// The activity and location an actor's routine prescribes right now.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::MalformedTime`] under the same conditions as
    /// [`RoutineBook::resolve`].
    pub fn activity_at(
        &self,
        actor_id: ActorId,
        weekday: Weekday,
        time: NaiveTime,
    ) -> Result<Option<ScheduledActivity>, ScheduleError> {
        Ok(self
            .resolve(actor_id, weekday, time)?
            .map(|entry| ScheduledActivity {
                activity: entry.activity.clone(),
                location: entry.location.clone(),
            }))
    }
}

/// Pick the winning entry from one actor's entries.
///
/// Highest priority wins; the earliest entry wins a tie.
///
/// # Errors
///
/// Returns [`ScheduleError::MalformedTime`] if a day-matching entry has an
/// unparseable time.
pub fn resolve_entry(
    entries: &[RoutineEntry],
    weekday: Weekday,
    time: NaiveTime,
) -> Result<Option<&RoutineEntry>, ScheduleError> {
    let now = minute_of_day(time);
    let mut best: Option<&RoutineEntry> = None;

    for entry in entries.iter().filter(|e| e.day_pattern.matches(weekday)) {
        let (start, end) = entry_window(entry)?;
        if !window_contains(start, end, now) {
            continue;
        }
        // Strictly greater keeps the first of equal-priority candidates.
        if best.is_none_or(|current| entry.priority > current.priority) {
            best = Some(entry);
        }
    }

    Ok(best)
}

/// Whether minute-of-day `time` falls in the window `[start, end)`.
///
/// When `start > end` the window crosses midnight and contains everything
/// from `start` to midnight plus everything before `end`. A window with
/// `start == end` is empty.
pub const fn window_contains(start: u32, end: u32, time: u32) -> bool {
    if start <= end {
        start <= time && time < end
    } else {
        time >= start || time < end
    }
}

/// Check that both times of an entry parse.
///
/// # Errors
///
/// Returns [`ScheduleError::MalformedTime`] naming the bad field.
pub fn validate_routine(entry: &RoutineEntry) -> Result<(), ScheduleError> {
    entry_window(entry).map(|_| ())
}

/// Parse an entry's window into minutes since midnight.
fn entry_window(entry: &RoutineEntry) -> Result<(u32, u32), ScheduleError> {
    let parse = |field: &'static str, value: &str| {
        parse_clock_time(value)
            .map(minute_of_day)
            .map_err(|source| ScheduleError::MalformedTime {
                actor_id: entry.actor_id,
                field,
                source,
            })
    };
    Ok((parse("start", &entry.start)?, parse("end", &entry.end)?))
}
