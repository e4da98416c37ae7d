//! Keyword tables and confidence tiers for the heuristic classifier.
//!
//! # Responsibility
//! - Hold every tunable the classifier reads: area keywords, signal phrase
//!   sets and per-branch confidence constants.
//! - Provide the built-in tables used in production.
//!
//! # Invariants
//! - All phrases are stored lowercase; constructors lowercase their input.
//! - Area order is declaration order and acts as the tie-break.
//! - A config value is never mutated after construction.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One area label and the phrases that anchor a note to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

impl AreaKeywords {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            keywords: lowercase_all(keywords),
        }
    }
}

/// Fixed confidence per decision branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceTiers {
    /// Action verb plus a time signal.
    pub project_with_time: f64,
    /// Action verb plus a task marker, no time signal.
    pub project_with_task: f64,
    /// Area keyword matched.
    pub area_resource: f64,
    /// Only a link matched.
    pub link_resource: f64,
    /// Nothing matched.
    pub default_resource: f64,
}

pub const PROJECT_WITH_TIME_CONFIDENCE: f64 = 0.72;
pub const PROJECT_WITH_TASK_CONFIDENCE: f64 = 0.62;
pub const AREA_RESOURCE_CONFIDENCE: f64 = 0.65;
pub const LINK_RESOURCE_CONFIDENCE: f64 = 0.55;
pub const DEFAULT_RESOURCE_CONFIDENCE: f64 = 0.45;

impl ConfidenceTiers {
    /// Checks every tier is a finite value within `[0, 1]`.
    pub fn validate(&self) -> Result<(), InvalidConfidenceTier> {
        let tiers = [
            ("project_with_time", self.project_with_time),
            ("project_with_task", self.project_with_task),
            ("area_resource", self.area_resource),
            ("link_resource", self.link_resource),
            ("default_resource", self.default_resource),
        ];
        match tiers
            .into_iter()
            .find(|(_, value)| !value.is_finite() || !(0.0..=1.0).contains(value))
        {
            Some((tier, value)) => Err(InvalidConfidenceTier { tier, value }),
            None => Ok(()),
        }
    }
}

/// A confidence tier that is not a finite value within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidConfidenceTier {
    pub tier: &'static str,
    pub value: f64,
}

impl Display for InvalidConfidenceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "confidence tier `{}` must be within [0, 1], got {}",
            self.tier, self.value
        )
    }
}

impl Error for InvalidConfidenceTier {}

impl Default for ConfidenceTiers {
    fn default() -> Self {
        Self {
            project_with_time: PROJECT_WITH_TIME_CONFIDENCE,
            project_with_task: PROJECT_WITH_TASK_CONFIDENCE,
            area_resource: AREA_RESOURCE_CONFIDENCE,
            link_resource: LINK_RESOURCE_CONFIDENCE,
            default_resource: DEFAULT_RESOURCE_CONFIDENCE,
        }
    }
}

/// Immutable classifier configuration.
///
/// Build once at startup and hand it to [`super::Classifier::new`]. Tests
/// substitute their own tables through the `with_*` builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub areas: Vec<AreaKeywords>,
    pub action_verbs: Vec<String>,
    pub time_signals: Vec<String>,
    pub task_markers: Vec<String>,
    pub confidence: ConfidenceTiers,
}

const ACTION_VERBS: &[&str] = &[
    "make", "write", "ship", "launch", "set up", "build", "plan", "prepare", "create", "draft",
    "organize", "schedule", "book ", "call ", "email ", "buy ", "fix ", "send ", "deliver",
    "publish", "renew", "pay ", "clean ", "update ", "review ", "apply ", "register",
];

const TIME_SIGNALS: &[&str] = &[
    "today",
    "tonight",
    "tomorrow",
    "this week",
    "next week",
    "this weekend",
    "this month",
    "next month",
    "end of day",
    "end of week",
    "end of month",
    "eod",
    "eow",
    "asap",
    "due ",
    "overdue",
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const TASK_MARKERS: &[&str] = &[
    "todo",
    "to-do",
    "to do",
    "deadline",
    "finish",
    "submit",
    "complete",
    "milestone",
    "deliverable",
    "action item",
    "checklist",
    "[ ]",
];

const AREAS: &[(&str, &[&str])] = &[
    (
        "Health",
        &[
            "health", "fitness", "workout", "gym", "doctor", "dentist", "meditat", "diet",
            "running", "sleep",
        ],
    ),
    (
        "Finance",
        &[
            "finance", "budget", "invoice", "tax", "bank", "salary", "expense", "invest",
            "mortgage", "insurance",
        ],
    ),
    (
        "Cooking",
        &[
            "recipe", "cook", "bake", "baking", "kitchen", "ingredient", "meal prep", "dinner",
        ],
    ),
    (
        "Home",
        &["household", "garden", "laundry", "furniture", "apartment", "landlord"],
    ),
    (
        "Career",
        &["career", "resume", "interview", "promotion", "job offer", "networking"],
    ),
    (
        "Learning",
        &["course", "lecture", "study", "tutorial", "reading list", "flashcard"],
    ),
    (
        "Relationships",
        &["birthday", "anniversary", "family", "friend", "wedding", "partner"],
    ),
    (
        "Travel",
        &["flight", "hotel", "itinerary", "passport", "vacation", "trip "],
    ),
];

impl Default for ClassifierConfig {
    fn default() -> Self {
        let mut time_signals = lowercase_all(TIME_SIGNALS);
        for day in WEEKDAYS {
            time_signals.push(format!("next {day}"));
            time_signals.push(format!("by {day}"));
            time_signals.push(format!("this {day}"));
        }

        Self {
            areas: AREAS
                .iter()
                .map(|(name, keywords)| AreaKeywords::new(*name, keywords.iter()))
                .collect(),
            action_verbs: lowercase_all(ACTION_VERBS),
            time_signals,
            task_markers: lowercase_all(TASK_MARKERS),
            confidence: ConfidenceTiers::default(),
        }
    }
}

impl ClassifierConfig {
    /// Replaces the area table; order of `areas` becomes the tie-break.
    pub fn with_areas(mut self, areas: Vec<AreaKeywords>) -> Self {
        self.areas = areas;
        self
    }

    pub fn with_action_verbs<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.action_verbs = lowercase_all(phrases);
        self
    }

    pub fn with_time_signals<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.time_signals = lowercase_all(phrases);
        self
    }

    pub fn with_task_markers<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.task_markers = lowercase_all(phrases);
        self
    }

    /// Replaces the confidence tiers after checking them.
    pub fn with_confidence(
        mut self,
        confidence: ConfidenceTiers,
    ) -> Result<Self, InvalidConfidenceTier> {
        confidence.validate()?;
        self.confidence = confidence;
        Ok(self)
    }
}

// Blank phrases would match every buffer, so they are dropped.
fn lowercase_all<I, S>(phrases: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .map(|phrase| phrase.as_ref().to_lowercase())
        .filter(|phrase| !phrase.trim().is_empty())
        .collect()
}
