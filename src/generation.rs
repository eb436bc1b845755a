//! Brief generation: planning, per-job execution, and brief orchestration.

pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod runner;

pub use orchestrator::{plan_brief, BriefOrchestrator};
pub use outcome::{
    BriefState, BriefSummary, FailureReason, JobOutcome, JobReport, SkipReason, StoredJob,
    TransparentOutcome,
};
pub use plan::{plan, GenerationJob, JobKind, JobPlan, PlanDiagnostic};
pub use runner::GenerationJobRunner;
