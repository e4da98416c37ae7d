//! Heuristic PARA classifier.
//!
//! # Responsibility
//! - Turn a note's title, body and tags into a bucket verdict with an
//!   optional area, optional project outcome, confidence and reason.
//!
//! # Invariants
//! - `classify` is total: every input yields a result and nothing panics.
//! - Rule priority is project → area resource → link resource → default.
//! - `Archive` is never produced; archiving is a user action.
//! - `method` is always [`HEURISTIC_METHOD`].
//! - The classifier holds no mutable state and performs no I/O.

pub mod config;
pub mod signals;

use crate::model::bucket::ParaBucket;
use serde::{Deserialize, Serialize};

pub use config::{AreaKeywords, ClassifierConfig, ConfidenceTiers, InvalidConfidenceTier};
pub use signals::{ScanBuffer, Signals};

/// Strategy tag recorded on every verdict.
pub const HEURISTIC_METHOD: &str = "heuristic";
/// Outcome used when a project is detected on an untitled note.
pub const UNTITLED_PROJECT_OUTCOME: &str = "Untitled project";

/// Classifier verdict for one note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub bucket: ParaBucket,
    pub area_name: Option<String>,
    pub project_outcome: Option<String>,
    /// Fixed per-branch constant in `[0, 1]`, checked when the classifier is
    /// built.
    pub confidence: f64,
    pub method: String,
    pub reason: String,
}

/// Rule-based classifier over an injected, immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Builds a classifier over `config`.
    ///
    /// # Errors
    /// - A confidence tier outside `[0, 1]` or not finite; verdicts would
    ///   otherwise break the confidence range contract.
    pub fn new(config: ClassifierConfig) -> Result<Self, InvalidConfidenceTier> {
        config.confidence.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies one note.
    ///
    /// Absent `title`/`tags` are treated as empty; empty `content` falls
    /// through to the default rule.
    pub fn classify(
        &self,
        content: &str,
        title: Option<&str>,
        tags: Option<&[String]>,
    ) -> ClassificationResult {
        let buffer = ScanBuffer::new(title, content, tags);
        let signals = Signals::detect(&buffer, &self.config);

        self.project_rule(&signals, title)
            .or_else(|| self.area_rule(&signals))
            .or_else(|| self.link_rule(&signals))
            .unwrap_or_else(|| self.default_rule())
    }

    fn project_rule(&self, signals: &Signals, title: Option<&str>) -> Option<ClassificationResult> {
        if !signals.has_action_verb || !(signals.has_time_signal || signals.has_task_marker) {
            return None;
        }

        let (confidence, cue) = if signals.has_time_signal {
            (self.config.confidence.project_with_time, "time")
        } else {
            (self.config.confidence.project_with_task, "task")
        };
        let outcome = title
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNTITLED_PROJECT_OUTCOME)
            .to_string();
        let reason = match signals.area_name.as_deref() {
            Some(area) => format!(
                "Detected an action verb with a {cue} cue; filed as a project in area '{area}'."
            ),
            None => format!("Detected an action verb with a {cue} cue; filed as a project."),
        };

        Some(verdict(
            ParaBucket::Project,
            signals.area_name.clone(),
            Some(outcome),
            confidence,
            reason,
        ))
    }

    fn area_rule(&self, signals: &Signals) -> Option<ClassificationResult> {
        let area = signals.area_name.as_deref()?;
        Some(verdict(
            ParaBucket::Resource,
            Some(area.to_string()),
            None,
            self.config.confidence.area_resource,
            format!(
                "Matched keywords for area '{area}'; treated as a resource anchored to that area."
            ),
        ))
    }

    fn link_rule(&self, signals: &Signals) -> Option<ClassificationResult> {
        if !signals.has_url {
            return None;
        }
        Some(verdict(
            ParaBucket::Resource,
            None,
            None,
            self.config.confidence.link_resource,
            "Detected a link; defaulted to reference material.".to_string(),
        ))
    }

    fn default_rule(&self) -> ClassificationResult {
        verdict(
            ParaBucket::Resource,
            None,
            None,
            self.config.confidence.default_resource,
            "No project or area signals found; defaulted to Resource.".to_string(),
        )
    }
}

fn verdict(
    bucket: ParaBucket,
    area_name: Option<String>,
    project_outcome: Option<String>,
    confidence: f64,
    reason: String,
) -> ClassificationResult {
    ClassificationResult {
        bucket,
        area_name,
        project_outcome,
        confidence,
        method: HEURISTIC_METHOD.to_string(),
        reason,
    }
}
