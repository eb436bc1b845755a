//! Brief orchestration: fetch records, plan, run every job, summarize.

use crate::generation::outcome::{BriefState, BriefSummary, JobReport};
use crate::generation::plan::{plan, JobPlan};
use crate::generation::runner::GenerationJobRunner;
use crate::services::ServiceContext;
use crate::specification::SpecificationStore;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

pub struct BriefOrchestrator {
    services: Arc<ServiceContext>,
    runner: GenerationJobRunner,
}

impl BriefOrchestrator {
    pub fn new(services: Arc<ServiceContext>) -> Self {
        let runner = GenerationJobRunner::new(services.clone());
        Self { services, runner }
    }

    /// Process every specification record of a brief.
    ///
    /// Jobs run one at a time in plan order. A failing job never stops the jobs after it.
    pub async fn process_brief(&self, brief_id: &str) -> BriefSummary {
        let mut summary = BriefSummary::new(brief_id);
        let span = info_span!("brief", brief_id, run_id = %summary.run_id);
        async move {
            info!("Processing brief");
            let records = self.services.spec_store.fetch(brief_id).await;
            summary.records_seen = records.len();
            transition(&mut summary, BriefState::SpecsFetched);

            if records.is_empty() {
                warn!(
                    diagnostic = "no-specifications",
                    "No specifications found for brief"
                );
                summary.finish(BriefState::EmptyDone);
                return summary;
            }

            transition(&mut summary, BriefState::Planning);
            let plan = plan(brief_id, &records);
            summary.jobs_planned = plan.jobs.len();
            for reason in plan.skipped() {
                summary.record_skip(reason);
            }
            summary.diagnostics = plan.diagnostics;

            transition(&mut summary, BriefState::Running);
            for job in &plan.jobs {
                let outcome = self.runner.run(job).await;
                debug!(
                    element_id = job.element_id.as_deref().unwrap_or("background"),
                    outcome = outcome.label(),
                    "Job finished"
                );
                summary.record(JobReport {
                    kind: job.kind,
                    element_id: job.element_id.clone(),
                    outcome,
                });
            }

            summary.finish(BriefState::Done);
            info!(
                records = summary.records_seen,
                planned = summary.jobs_planned,
                stored = summary.jobs_stored,
                degraded = summary.jobs_degraded,
                skipped = summary.jobs_skipped,
                failed = summary.jobs_failed,
                "Brief processed"
            );
            summary
        }
        .instrument(span)
        .await
    }

    /// Plan a brief without generating or storing anything.
    pub async fn preview(&self, brief_id: &str) -> JobPlan {
        plan_brief(self.services.spec_store.as_ref(), brief_id).await
    }
}

/// Fetch and plan a brief using only the specification store.
pub async fn plan_brief(store: &dyn SpecificationStore, brief_id: &str) -> JobPlan {
    let records = store.fetch(brief_id).await;
    plan(brief_id, &records)
}

fn transition(summary: &mut BriefSummary, next: BriefState) {
    debug!(from = ?summary.state, to = ?next, "Brief state");
    summary.state = next;
}
