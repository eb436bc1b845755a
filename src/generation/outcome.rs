//! Job outcomes and the per-brief summary they fold into.

use crate::asset::StoredAsset;
use crate::generation::plan::{JobKind, PlanDiagnostic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Why an item produced no job, or why a job was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingData,
    MalformedData,
    InvalidElement,
    InvalidBackground,
    EmptyPrompt,
}

impl SkipReason {
    pub fn code(self) -> &'static str {
        match self {
            SkipReason::MissingData => "missing-data",
            SkipReason::MalformedData => "malformed-data",
            SkipReason::InvalidElement => "invalid-element",
            SkipReason::InvalidBackground => "missing-background",
            SkipReason::EmptyPrompt => "empty-prompt",
        }
    }
}

/// The primary step that failed; the job stored nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "message", rename_all = "kebab-case")]
pub enum FailureReason {
    Generation(String),
    StoreOriginal(String),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Generation(_) => "generation",
            FailureReason::StoreOriginal(_) => "store-original",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FailureReason::Generation(m) | FailureReason::StoreOriginal(m) => m,
        }
    }
}

/// Result of the best-effort transparent variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TransparentOutcome {
    Stored(StoredAsset),
    /// Background jobs keep their backdrop.
    NotRequested,
    /// No background-removal collaborator is configured.
    Disabled,
    RemovalFailed(String),
    StoreFailed(String),
}

impl TransparentOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            TransparentOutcome::RemovalFailed(_) | TransparentOutcome::StoreFailed(_)
        )
    }
}

/// A job whose original image is durably stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredJob {
    pub original: StoredAsset,
    pub transparent: TransparentOutcome,
}

impl StoredJob {
    pub fn annotation(&self) -> &'static str {
        if self.transparent.is_degraded() {
            "stored-without-transparent"
        } else {
            "stored"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum JobOutcome {
    Stored(StoredJob),
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl JobOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Stored(stored) => stored.annotation(),
            JobOutcome::Skipped(_) => "skipped",
            JobOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome of one executed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub kind: JobKind,
    pub element_id: Option<String>,
    pub outcome: JobOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefState {
    Start,
    SpecsFetched,
    Planning,
    Running,
    EmptyDone,
    Done,
}

/// Aggregate result of processing one brief.
///
/// `jobs_stored` includes degraded jobs; `jobs_degraded` counts the subset whose
/// transparent variant is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefSummary {
    pub brief_id: String,
    pub run_id: Uuid,
    pub state: BriefState,
    pub records_seen: usize,
    pub jobs_planned: usize,
    pub jobs_run: usize,
    pub jobs_stored: usize,
    pub jobs_degraded: usize,
    pub jobs_skipped: usize,
    /// `jobs_skipped` broken down by reason
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    pub jobs_failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub diagnostics: Vec<PlanDiagnostic>,
    pub reports: Vec<JobReport>,
}

impl BriefSummary {
    pub fn new(brief_id: &str) -> Self {
        Self {
            brief_id: brief_id.to_string(),
            run_id: Uuid::new_v4(),
            state: BriefState::Start,
            records_seen: 0,
            jobs_planned: 0,
            jobs_run: 0,
            jobs_stored: 0,
            jobs_degraded: 0,
            jobs_skipped: 0,
            skipped_by_reason: BTreeMap::new(),
            jobs_failed: 0,
            started_at: Utc::now(),
            finished_at: None,
            diagnostics: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Count an item the planner dropped.
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.jobs_skipped += 1;
        *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
    }

    /// Fold the outcome of an executed job.
    pub fn record(&mut self, report: JobReport) {
        self.jobs_run += 1;
        match &report.outcome {
            JobOutcome::Stored(stored) => {
                self.jobs_stored += 1;
                if stored.transparent.is_degraded() {
                    self.jobs_degraded += 1;
                }
            }
            JobOutcome::Skipped(reason) => {
                self.jobs_skipped += 1;
                *self.skipped_by_reason.entry(*reason).or_insert(0) += 1;
            }
            JobOutcome::Failed(_) => self.jobs_failed += 1,
        }
        self.reports.push(report);
    }

    pub fn finish(&mut self, state: BriefState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    /// True when every planned job stored its original image.
    pub fn is_complete(&self) -> bool {
        self.jobs_failed == 0 && self.jobs_stored == self.jobs_planned
    }
}
