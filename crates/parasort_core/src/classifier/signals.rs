//! Scan-buffer normalization and signal detectors.
//!
//! # Responsibility
//! - Fold title, body and tags into one lowercase scan buffer.
//! - Answer the boolean/categorical questions the decision chain asks.
//!
//! # Invariants
//! - Detectors only ever read the scan buffer.
//! - Phrase checks are literal substring matches; only the date and clock
//!   patterns require word boundaries.

use crate::classifier::config::{AreaKeywords, ClassifierConfig};
use once_cell::sync::Lazy;
use regex::Regex;

static SLASH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b").expect("valid slash date regex")
});
static CLOCK_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}(?:\s?(?:am|pm))?\b").expect("valid clock time regex")
});

const URL_MARKERS: &[&str] = &["http://", "https://", "www."];

/// Lowercased concatenation of title, body and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBuffer(String);

impl ScanBuffer {
    /// Builds `title + " " + body + " " + tags.join(" ")`, all lowercase.
    ///
    /// Absent title or tags contribute empty strings.
    pub fn new(title: Option<&str>, body: &str, tags: Option<&[String]>) -> Self {
        let title = title.unwrap_or_default().to_lowercase();
        let body = body.to_lowercase();
        let tags = tags.map(|values| values.join(" ")).unwrap_or_default();

        let mut buffer = String::with_capacity(title.len() + body.len() + tags.len() + 2);
        buffer.push_str(&title);
        buffer.push(' ');
        buffer.push_str(&body);
        buffer.push(' ');
        buffer.push_str(&tags.to_lowercase());
        Self(buffer)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn contains_any(&self, phrases: &[String]) -> bool {
        phrases.iter().any(|phrase| self.0.contains(phrase.as_str()))
    }
}

/// Signals computed once per classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub has_time_signal: bool,
    pub has_action_verb: bool,
    pub has_task_marker: bool,
    pub has_url: bool,
    pub area_name: Option<String>,
}

impl Signals {
    pub fn detect(buffer: &ScanBuffer, config: &ClassifierConfig) -> Self {
        Self {
            has_time_signal: has_time_signal(buffer, &config.time_signals),
            has_action_verb: has_action_verb(buffer, &config.action_verbs),
            has_task_marker: has_task_marker(buffer, &config.task_markers),
            has_url: has_url(buffer),
            area_name: detect_area(buffer, &config.areas).map(str::to_string),
        }
    }
}

/// Time phrase, slash date (`4/12`, `4/12/2025`) or clock time (`9:30 am`).
pub fn has_time_signal(buffer: &ScanBuffer, phrases: &[String]) -> bool {
    buffer.contains_any(phrases)
        || SLASH_DATE_RE.is_match(buffer.as_str())
        || CLOCK_TIME_RE.is_match(buffer.as_str())
}

pub fn has_action_verb(buffer: &ScanBuffer, phrases: &[String]) -> bool {
    buffer.contains_any(phrases)
}

pub fn has_task_marker(buffer: &ScanBuffer, phrases: &[String]) -> bool {
    buffer.contains_any(phrases)
}

pub fn has_url(buffer: &ScanBuffer) -> bool {
    URL_MARKERS
        .iter()
        .any(|marker| buffer.as_str().contains(marker))
}

/// Returns the first declared area with any keyword present in the buffer.
pub fn detect_area<'a>(buffer: &ScanBuffer, areas: &'a [AreaKeywords]) -> Option<&'a str> {
    areas
        .iter()
        .find(|area| buffer.contains_any(&area.keywords))
        .map(|area| area.name.as_str())
}
