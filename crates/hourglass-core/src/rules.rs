//! Keyword rule tables for free-text classification.
//!
//! Routine labels, goal step texts, and need names are free text. Every
//! policy that inspects them is an ordered table of keyword sets mapped to
//! an outcome: the first rule with a keyword contained in the
//! (lowercased) text wins. Keeping the policy as data means each table can
//! be read, and tested, on its own.
//!
//! Matching is plain substring containment, so `"rest"` also hits
//! `"restock shelves"`. The tables are ordered with that in mind.

use hourglass_types::{ActivityKind, GoalType};

/// One ordered rule: any keyword contained in the text selects `outcome`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordRule<T: 'static> {
    /// Lowercase substrings, any of which triggers the rule.
    pub keywords: &'static [&'static str],
    /// Result when the rule fires.
    pub outcome: T,
}

/// Return the outcome of the first rule matching `text`, case-insensitively.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    let text = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
        .map(|rule| rule.outcome)
}

// ---------------------------------------------------------------------------
// Activity classification (routine label -> activity kind)
// ---------------------------------------------------------------------------

/// Routine label keywords mapped to the activity kind used for need decay.
pub const ACTIVITY_RULES: &[KeywordRule<ActivityKind>] = &[
    KeywordRule {
        keywords: &["sleep", "rest", "nap"],
        outcome: ActivityKind::Sleeping,
    },
    KeywordRule {
        keywords: &["relax", "sit", "read", "wait"],
        outcome: ActivityKind::Resting,
    },
    KeywordRule {
        keywords: &["talk", "chat", "meet", "visit", "party"],
        outcome: ActivityKind::Socializing,
    },
    KeywordRule {
        keywords: &["fight", "train", "spar", "battle"],
        outcome: ActivityKind::Combat,
    },
];

/// Classify a routine activity label, defaulting to [`ActivityKind::Active`].
pub fn classify_activity(label: &str) -> ActivityKind {
    first_match(ACTIVITY_RULES, label).unwrap_or(ActivityKind::Active)
}

// ---------------------------------------------------------------------------
// Urgent needs (need name -> what the actor drops everything to do)
// ---------------------------------------------------------------------------

/// What an actor does while a need overrides its routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgentActivity {
    /// Activity label, e.g. `"seeking food"`.
    pub label: &'static str,
    /// Activity kind handed to need decay.
    pub kind: ActivityKind,
}

/// Need-name keywords mapped to the activity an urgent need forces.
pub const URGENT_NEED_RULES: &[KeywordRule<UrgentActivity>] = &[
    KeywordRule {
        keywords: &["hunger"],
        outcome: UrgentActivity {
            label: "seeking food",
            kind: ActivityKind::Active,
        },
    },
    KeywordRule {
        keywords: &["energy"],
        outcome: UrgentActivity {
            label: "resting",
            kind: ActivityKind::Resting,
        },
    },
    KeywordRule {
        keywords: &["social"],
        outcome: UrgentActivity {
            label: "socializing",
            kind: ActivityKind::Socializing,
        },
    },
    KeywordRule {
        keywords: &["intimacy"],
        outcome: UrgentActivity {
            label: "seeking companionship",
            kind: ActivityKind::Socializing,
        },
    },
];

/// The activity an urgent need forces, or an active default for needs the
/// table does not name.
pub fn urgent_need_activity(need: &str) -> UrgentActivity {
    first_match(URGENT_NEED_RULES, need).unwrap_or(UrgentActivity {
        label: "tending to needs",
        kind: ActivityKind::Active,
    })
}

// ---------------------------------------------------------------------------
// Goal step success (step text -> base rate)
// ---------------------------------------------------------------------------

/// Base success rate for step texts no rule recognises.
pub const DEFAULT_STEP_RATE: f64 = 0.60;

/// Step-text keywords mapped to the base success rate of the step.
pub const STEP_RATE_RULES: &[KeywordRule<f64>] = &[
    KeywordRule {
        keywords: &["look for", "search"],
        outcome: 0.70,
    },
    KeywordRule {
        keywords: &["acquire", "get"],
        outcome: 0.60,
    },
    KeywordRule {
        keywords: &["use", "consume"],
        outcome: 0.90,
    },
    KeywordRule {
        keywords: &["talk", "ask"],
        outcome: 0.50,
    },
    KeywordRule {
        keywords: &["travel", "go to"],
        outcome: 0.80,
    },
];

/// Base success rate of a step, before the priority modifier.
pub fn step_base_rate(step: &str) -> f64 {
    first_match(STEP_RATE_RULES, step).unwrap_or(DEFAULT_STEP_RATE)
}

// ---------------------------------------------------------------------------
// Movement cues (step text -> destination)
// ---------------------------------------------------------------------------

/// Where a movement cue sends an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A fixed, shared location key.
    Place(&'static str),
    /// The actor's own home, `home_<actor key>`.
    Home,
}

impl Destination {
    /// Resolve to a concrete location key for the given actor.
    pub fn location_key(self, actor_key: &str) -> String {
        match self {
            Self::Place(key) => key.to_owned(),
            Self::Home => format!("home_{actor_key}"),
        }
    }
}

/// Step-text keywords mapped to the place the step takes the actor.
pub const MOVEMENT_RULES: &[KeywordRule<Destination>] = &[
    KeywordRule {
        keywords: &["tavern"],
        outcome: Destination::Place("tavern"),
    },
    KeywordRule {
        keywords: &["inn"],
        outcome: Destination::Place("inn"),
    },
    KeywordRule {
        keywords: &["market"],
        outcome: Destination::Place("market"),
    },
    KeywordRule {
        keywords: &["shop"],
        outcome: Destination::Place("general_store"),
    },
    KeywordRule {
        keywords: &["home"],
        outcome: Destination::Home,
    },
    KeywordRule {
        keywords: &["temple"],
        outcome: Destination::Place("temple"),
    },
    KeywordRule {
        keywords: &["guild"],
        outcome: Destination::Place("guild_hall"),
    },
];

/// Venues recognised after `"at the "` in an upcoming step.
pub const UPCOMING_VENUES: &[&str] = &["tavern", "inn", "market", "shop", "temple", "guild"];

/// Find a `"at the <venue>"` phrase in an upcoming step.
pub fn upcoming_venue(step: &str) -> Option<Destination> {
    let text = step.to_lowercase();
    text.match_indices("at the ").find_map(|(idx, phrase)| {
        let rest = text.get(idx.saturating_add(phrase.len())..)?;
        let venue = UPCOMING_VENUES.iter().find(|venue| rest.starts_with(*venue))?;
        first_match(MOVEMENT_RULES, venue)
    })
}

// ---------------------------------------------------------------------------
// Need -> goal lookups
// ---------------------------------------------------------------------------

/// Goal type spawned by each known need. Unknown needs default to survival.
pub const NEED_GOAL_TYPES: &[(&str, GoalType)] = &[
    ("hunger", GoalType::Survive),
    ("thirst", GoalType::Survive),
    ("energy", GoalType::Survive),
    ("social_connection", GoalType::Social),
    ("intimacy", GoalType::Romance),
];

/// Goal type for a need name.
pub fn goal_type_for_need(need: &str) -> GoalType {
    NEED_GOAL_TYPES
        .iter()
        .find(|(name, _)| *name == need)
        .map_or(GoalType::Survive, |(_, goal_type)| *goal_type)
}

/// Target and description of the goal a need spawns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalTemplate {
    /// What the goal is about, e.g. `"food"`.
    pub target: String,
    /// Human-readable description.
    pub description: String,
}

/// Known needs mapped to (target, description).
pub const GOAL_TEMPLATES: &[(&str, &str, &str)] = &[
    ("hunger", "food", "Find something to eat"),
    ("thirst", "drink", "Find something to drink"),
    ("energy", "rest", "Get some rest"),
    ("social_connection", "company", "Spend time with someone"),
    ("intimacy", "companionship", "Seek out a companion"),
];

/// Target and description for a need; unknown needs target themselves.
pub fn goal_template(need: &str) -> GoalTemplate {
    GOAL_TEMPLATES
        .iter()
        .find(|(name, _, _)| *name == need)
        .map_or_else(
            || GoalTemplate {
                target: need.to_owned(),
                description: format!("Address {need}"),
            },
            |(_, target, description)| GoalTemplate {
                target: (*target).to_owned(),
                description: (*description).to_owned(),
            },
        )
}
