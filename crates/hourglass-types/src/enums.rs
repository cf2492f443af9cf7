//! Enumeration types for the Hourglass simulation.
//!
//! Every enum here is closed and serialized in `SCREAMING_SNAKE_CASE`, the
//! form used by authoring tools (`DAILY`, `WEEKDAY`, `URGENT`, ...).

use core::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Whether an actor is the player character or a non-player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorKind {
    /// The player character.
    Player,
    /// A simulated non-player character.
    Npc,
}

/// Coarse activity category handed to the need service during decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    /// Asleep, resting deeply, or napping.
    Sleeping,
    /// Idle but awake: sitting, reading, waiting.
    Resting,
    /// Talking, visiting, partying.
    Socializing,
    /// Fighting, training, sparring.
    Combat,
    /// Anything else.
    Active,
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// The recurring days on which a routine entry applies.
///
/// Serialized as `DAILY`, `WEEKDAY`, `MONDAY` and so on; deserialization
/// goes through [`FromStr`], so authored data may use any case or the
/// three-letter day abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum DayPattern {
    /// Mondays only.
    Monday,
    /// Tuesdays only.
    Tuesday,
    /// Wednesdays only.
    Wednesday,
    /// Thursdays only.
    Thursday,
    /// Fridays only.
    Friday,
    /// Saturdays only.
    Saturday,
    /// Sundays only.
    Sunday,
    /// Monday through Friday.
    Weekday,
    /// Saturday and Sunday.
    Weekend,
    /// Every day of the week.
    Daily,
}

impl DayPattern {
    /// Whether this pattern covers the given weekday.
    pub const fn matches(self, day: Weekday) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekday => !matches!(day, Weekday::Sat | Weekday::Sun),
            Self::Weekend => matches!(day, Weekday::Sat | Weekday::Sun),
            Self::Monday => matches!(day, Weekday::Mon),
            Self::Tuesday => matches!(day, Weekday::Tue),
            Self::Wednesday => matches!(day, Weekday::Wed),
            Self::Thursday => matches!(day, Weekday::Thu),
            Self::Friday => matches!(day, Weekday::Fri),
            Self::Saturday => matches!(day, Weekday::Sat),
            Self::Sunday => matches!(day, Weekday::Sun),
        }
    }
}

/// Error returned when a day pattern string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown day pattern: {0}")]
pub struct UnknownDayPattern(pub String);

impl FromStr for DayPattern {
    type Err = UnknownDayPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            "saturday" | "sat" => Ok(Self::Saturday),
            "sunday" | "sun" => Ok(Self::Sunday),
            "weekday" | "weekdays" => Ok(Self::Weekday),
            "weekend" | "weekends" => Ok(Self::Weekend),
            "daily" => Ok(Self::Daily),
            other => Err(UnknownDayPattern(other.to_owned())),
        }
    }
}

impl TryFrom<String> for DayPattern {
    type Error = UnknownDayPattern;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// The broad kind of objective a goal represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    /// Food, drink, sleep: staying alive and functional.
    Survive,
    /// Company and conversation.
    Social,
    /// Intimacy and companionship.
    Romance,
    /// Money and possessions.
    Wealth,
    /// Learning and discovery.
    Knowledge,
}

/// Lifecycle status of a goal.
///
/// `Active` is the only non-terminal state. Completed and blocked goals are
/// never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Being pursued.
    Active,
    /// Every step succeeded.
    Completed,
    /// A step failed.
    Blocked,
}

impl GoalStatus {
    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Scheduling tier of a goal, also used as a step-success modifier.
///
/// Variants are declared lowest first so the derived `Ord` ranks
/// `Urgent` highest. Deserialization is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum PriorityTier {
    /// Idle ambitions.
    Background,
    /// Nice to have.
    Low,
    /// Ordinary needs.
    Medium,
    /// Pressing needs.
    High,
    /// Drop everything.
    Urgent,
}

impl PriorityTier {
    /// Additive adjustment applied to a step's base success rate.
    pub const fn success_modifier(self) -> f64 {
        match self {
            Self::Urgent => 0.20,
            Self::High => 0.10,
            Self::Medium => 0.0,
            Self::Low => -0.10,
            Self::Background => -0.20,
        }
    }
}

/// Error returned when a priority tier string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority tier: {0}")]
pub struct UnknownPriorityTier(pub String);

impl FromStr for PriorityTier {
    type Err = UnknownPriorityTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "background" => Ok(Self::Background),
            other => Err(UnknownPriorityTier(other.to_owned())),
        }
    }
}

impl TryFrom<String> for PriorityTier {
    type Error = UnknownPriorityTier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
