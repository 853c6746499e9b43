//! Data model for test reports.
//!
//! These types mirror the report JSON emitted by the test runner: one
//! `TestCase` per test, one `TestResult` per attempt, and a recursive tree of
//! `Step`s per result.

use crate::annotation::Annotation;
use crate::attachment::Attachment;
use crate::error::{ReportError, Result};
use crate::step::{Step, flatten};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Source position of a test or step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Overall outcome of a test across all of its attempts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Passed as expected
    Expected,
    /// Failed unexpectedly
    Unexpected,
    /// Failed at least once, then passed on retry
    Flaky,
    /// Not run
    Skipped,
}

impl Outcome {
    /// Key used for icon selection and serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Expected => "expected",
            Outcome::Unexpected => "unexpected",
            Outcome::Flaky => "flaky",
            Outcome::Skipped => "skipped",
        }
    }

    /// Whether a test with this outcome counts as passing.
    pub fn is_ok(self) -> bool {
        !matches!(self, Outcome::Unexpected)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::TimedOut => "timedOut",
            TestStatus::Skipped => "skipped",
            TestStatus::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single test with all of its attempts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub test_id: String,
    pub title: String,
    /// Suite names from the outermost describe block inwards
    #[serde(default)]
    pub path: Vec<String>,
    pub project_name: String,
    pub location: Location,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub outcome: Outcome,
    /// Aggregate duration in milliseconds
    pub duration: u64,
    pub ok: bool,
    /// One entry per attempt, ordered by retry index
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl TestCase {
    /// Checks the structural invariants the viewer relies on.
    ///
    /// A mismatch between `ok` and `outcome` is logged but tolerated, since
    /// `ok` is display-only.
    pub fn validate(&self) -> Result<()> {
        if self.test_id.trim().is_empty() {
            return Err(ReportError::MalformedReport(
                "test case has an empty testId".to_string(),
            ));
        }
        if self.title.is_empty() {
            return Err(ReportError::MalformedReport(format!(
                "test {} has an empty title",
                self.test_id
            )));
        }

        for (index, result) in self.results.iter().enumerate() {
            if result.retry as usize != index {
                return Err(ReportError::MalformedReport(format!(
                    "result {} of test {} has retry {}; results must be ordered by retry starting at 0",
                    index, self.test_id, result.retry
                )));
            }
            result.validate()?;
        }

        if self.ok != self.outcome.is_ok() {
            tracing::warn!(
                test_id = %self.test_id,
                ok = self.ok,
                outcome = %self.outcome,
                "ok flag disagrees with outcome"
            );
        }

        Ok(())
    }

    /// Title with the suite path prepended, e.g. `suite › nested › title`.
    pub fn full_title(&self) -> String {
        self.path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.title.as_str()))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

/// One attempt of a test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub retry: u32,
    #[serde(with = "crate::timestamp")]
    pub start_time: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration: u64,
    pub status: TestStatus,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TestResult {
    /// Finds an attachment by exact name. The first match wins when names repeat.
    pub fn attachment_by_name(&self, name: &str) -> Option<(usize, &Attachment)> {
        self.attachments
            .iter()
            .enumerate()
            .find(|(_, attachment)| attachment.name() == name)
    }

    fn validate(&self) -> Result<()> {
        let attachment_count = self.attachments.len();
        for (path, step) in flatten(&self.steps, |_, _| true) {
            if let Some(index) = step
                .attachments
                .iter()
                .find(|index| **index >= attachment_count)
            {
                return Err(ReportError::MalformedReport(format!(
                    "step {} ({}) of retry {} references attachment {} but the result has {}",
                    path, step.title, self.retry, index, attachment_count
                )));
            }
        }
        Ok(())
    }
}

/// Everything the viewer is handed by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportBundle {
    /// The test to show, or `None` for the summary page
    #[serde(default)]
    pub test: Option<TestCase>,
    /// Known project names, for display context
    #[serde(default)]
    pub project_names: Vec<String>,
    /// Index of the attempt displayed initially
    #[serde(default)]
    pub run: usize,
    /// Section, attachment or step to reveal initially
    #[serde(default)]
    pub anchor: String,
}

impl ReportBundle {
    /// Parses and validates a bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        if let Some(test) = &bundle.test {
            test.validate()?;
        }
        Ok(bundle)
    }

    /// Loads a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
