//! Job planning: specification records to an ordered list of generation jobs.
//!
//! Planning never fails. Records and elements that cannot produce a job are dropped
//! with a diagnostic, and their siblings are planned as usual.

use crate::asset;
use crate::generation::outcome::SkipReason;
use crate::prompt::{build_prompt, PromptSource};
use crate::specification::SpecificationRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Element,
    Background,
}

/// One unit of generation work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationJob {
    pub kind: JobKind,
    pub brief_id: String,
    pub element_id: Option<String>,
    pub prompt: String,
    pub needs_background_removal: bool,
}

impl GenerationJob {
    pub fn element(brief_id: &str, element_id: &str, prompt: String) -> Self {
        Self {
            kind: JobKind::Element,
            brief_id: brief_id.to_string(),
            element_id: Some(element_id.to_string()),
            prompt,
            needs_background_removal: true,
        }
    }

    pub fn background(brief_id: &str, prompt: String) -> Self {
        Self {
            kind: JobKind::Background,
            brief_id: brief_id.to_string(),
            element_id: None,
            prompt,
            needs_background_removal: false,
        }
    }

    /// Storage path of the generated image.
    pub fn original_path(&self) -> String {
        match (&self.kind, &self.element_id) {
            (JobKind::Element, Some(element_id)) => asset::original_path(&self.brief_id, element_id),
            _ => asset::background_path(&self.brief_id),
        }
    }

    /// Storage path of the background-removed variant, for element jobs only.
    pub fn transparent_path(&self) -> Option<String> {
        match (&self.kind, &self.element_id) {
            (JobKind::Element, Some(element_id)) => {
                Some(asset::transparent_path(&self.brief_id, element_id))
            }
            _ => None,
        }
    }
}

/// Why part of a record produced no job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum PlanDiagnostic {
    MissingData {
        record_index: usize,
    },
    MalformedData {
        record_index: usize,
        message: String,
    },
    InvalidElement {
        record_index: usize,
        element_index: usize,
        element_id: Option<String>,
    },
    /// `section_present` distinguishes an absent background (valid) from one without
    /// a prompt (skipped).
    MissingBackground {
        record_index: usize,
        section_present: bool,
    },
}

impl PlanDiagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            PlanDiagnostic::MissingData { .. } => "missing-data",
            PlanDiagnostic::MalformedData { .. } => "malformed-data",
            PlanDiagnostic::InvalidElement { .. } => "invalid-element",
            PlanDiagnostic::MissingBackground { .. } => "missing-background",
        }
    }

    /// The skip this diagnostic counts as, if any.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            PlanDiagnostic::MissingData { .. } => Some(SkipReason::MissingData),
            PlanDiagnostic::MalformedData { .. } => Some(SkipReason::MalformedData),
            PlanDiagnostic::InvalidElement { .. } => Some(SkipReason::InvalidElement),
            PlanDiagnostic::MissingBackground {
                section_present: true,
                ..
            } => Some(SkipReason::InvalidBackground),
            PlanDiagnostic::MissingBackground {
                section_present: false,
                ..
            } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPlan {
    pub brief_id: String,
    pub records_seen: usize,
    pub jobs: Vec<GenerationJob>,
    pub diagnostics: Vec<PlanDiagnostic>,
}

impl JobPlan {
    pub fn skipped(&self) -> impl Iterator<Item = SkipReason> + '_ {
        self.diagnostics.iter().filter_map(PlanDiagnostic::skip_reason)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Plan every job for `brief_id`, preserving record order and document order.
///
/// Within a record all element jobs come before the background job.
pub fn plan(brief_id: &str, records: &[SpecificationRecord]) -> JobPlan {
    let mut jobs = Vec::new();
    let mut diagnostics = Vec::new();

    for (record_index, record) in records.iter().enumerate() {
        let document = match record.document() {
            Ok(Some(document)) => document,
            Ok(None) => {
                warn!(
                    brief_id,
                    record_index,
                    diagnostic = "missing-data",
                    "Skipping record due to missing 'specification_data'"
                );
                diagnostics.push(PlanDiagnostic::MissingData { record_index });
                continue;
            }
            Err(e) => {
                warn!(
                    brief_id,
                    record_index,
                    diagnostic = "malformed-data",
                    error = %e,
                    "Skipping record with unreadable 'specification_data'"
                );
                diagnostics.push(PlanDiagnostic::MalformedData {
                    record_index,
                    message: e.to_string(),
                });
                continue;
            }
        };

        for (element_index, entry) in document.elements.iter().enumerate() {
            let job = entry.as_ref().and_then(|element| {
                let prompt = build_prompt(PromptSource::Element(element))?;
                let element_id = element.element_id()?;
                Some(GenerationJob::element(brief_id, element_id, prompt))
            });
            match job {
                Some(job) => jobs.push(job),
                None => {
                    let element_id = entry.as_ref().and_then(|element| element.id.clone());
                    warn!(
                        brief_id,
                        record_index,
                        element_index,
                        element_id = element_id.as_deref().unwrap_or("-"),
                        diagnostic = "invalid-element",
                        "Skipping element due to missing 'id' or 'regenerationPrompt'"
                    );
                    diagnostics.push(PlanDiagnostic::InvalidElement {
                        record_index,
                        element_index,
                        element_id,
                    });
                }
            }
        }

        let background_prompt = document
            .background
            .as_ref()
            .and_then(|background| build_prompt(PromptSource::Background(background)));
        match background_prompt {
            Some(prompt) => jobs.push(GenerationJob::background(brief_id, prompt)),
            None => {
                warn!(
                    brief_id,
                    record_index,
                    diagnostic = "missing-background",
                    "No background specification with a prompt found"
                );
                diagnostics.push(PlanDiagnostic::MissingBackground {
                    record_index,
                    section_present: document.background.is_some(),
                });
            }
        }
    }

    JobPlan {
        brief_id: brief_id.to_string(),
        records_seen: records.len(),
        jobs,
        diagnostics,
    }
}
