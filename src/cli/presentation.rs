//! CLI presentation: text and JSON rendering of run summaries, plans, and config checks.

use crate::config::ValidationError;
use crate::generation::{
    BriefSummary, JobKind, JobOutcome, JobPlan, PlanDiagnostic, TransparentOutcome,
};
use comfy_table::Table;
use owo_colors::OwoColorize;

fn job_label(kind: JobKind, element_id: Option<&str>) -> String {
    match kind {
        JobKind::Element => element_id.unwrap_or("-").to_string(),
        JobKind::Background => "(background)".to_string(),
    }
}

fn transparent_cell(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Stored(stored) => match &stored.transparent {
            TransparentOutcome::Stored(asset) => asset.path.clone(),
            TransparentOutcome::NotRequested => "-".to_string(),
            TransparentOutcome::Disabled => "disabled".to_string(),
            TransparentOutcome::RemovalFailed(msg) => format!("removal failed: {}", msg),
            TransparentOutcome::StoreFailed(msg) => format!("store failed: {}", msg),
        },
        _ => "-".to_string(),
    }
}

fn detail_cell(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Stored(stored) => stored.original.path.clone(),
        JobOutcome::Skipped(reason) => reason.code().to_string(),
        JobOutcome::Failed(reason) => format!("{}: {}", reason.code(), reason.message()),
    }
}

fn diagnostic_text(diagnostic: &PlanDiagnostic) -> String {
    match diagnostic {
        PlanDiagnostic::MissingData { record_index } => {
            format!("record {}: no specification data", record_index)
        }
        PlanDiagnostic::MalformedData {
            record_index,
            message,
        } => format!("record {}: unreadable specification data ({})", record_index, message),
        PlanDiagnostic::InvalidElement {
            record_index,
            element_index,
            element_id,
        } => format!(
            "record {} element {}{}: missing id or regeneration prompt",
            record_index,
            element_index,
            element_id
                .as_deref()
                .map(|id| format!(" ({})", id))
                .unwrap_or_default()
        ),
        PlanDiagnostic::MissingBackground {
            record_index,
            section_present,
        } => {
            if *section_present {
                format!("record {}: background has no regeneration prompt", record_index)
            } else {
                format!("record {}: no background section", record_index)
            }
        }
    }
}

fn push_diagnostics(output: &mut String, diagnostics: &[PlanDiagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    output.push_str("\nDiagnostics:\n");
    for diagnostic in diagnostics {
        output.push_str(&format!(
            "  [{}] {}\n",
            diagnostic.code(),
            diagnostic_text(diagnostic)
        ));
    }
}

pub fn format_summary_text(summary: &BriefSummary) -> String {
    let mut output = format!("{}\n", format!("Brief {}", summary.brief_id).bold());
    output.push_str(&format!("Run: {}\n", summary.run_id));
    if summary.records_seen == 0 {
        output.push_str("No specifications found.\n");
        return output;
    }

    output.push_str(&format!(
        "Records: {}  Planned: {}  Stored: {}  Degraded: {}  Skipped: {}  Failed: {}\n",
        summary.records_seen,
        summary.jobs_planned,
        summary.jobs_stored.green(),
        summary.jobs_degraded.yellow(),
        summary.jobs_skipped,
        summary.jobs_failed.red()
    ));
    if !summary.skipped_by_reason.is_empty() {
        let breakdown: Vec<String> = summary
            .skipped_by_reason
            .iter()
            .map(|(reason, count)| format!("{} {}", reason.code(), count))
            .collect();
        output.push_str(&format!("Skipped by reason: {}
", breakdown.join(", ")));
    }

    if !summary.reports.is_empty() {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Job", "Status", "Original", "Transparent"]);
        for report in &summary.reports {
            table.add_row(vec![
                job_label(report.kind, report.element_id.as_deref()),
                report.outcome.label().to_string(),
                detail_cell(&report.outcome),
                transparent_cell(&report.outcome),
            ]);
        }
        output.push('\n');
        output.push_str(&table.to_string());
        output.push('\n');
    }

    push_diagnostics(&mut output, &summary.diagnostics);
    output
}

pub fn format_summary_json(summary: &BriefSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_plan_text(plan: &JobPlan) -> String {
    let mut output = format!("{}\n", format!("Plan for brief {}", plan.brief_id).bold());
    if plan.records_seen == 0 {
        output.push_str("No specifications found.\n");
        return output;
    }
    output.push_str(&format!(
        "Records: {}  Jobs: {}  Skipped: {}\n",
        plan.records_seen,
        plan.jobs.len(),
        plan.skipped().count()
    ));

    if !plan.jobs.is_empty() {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["#", "Job", "Prompt", "Writes"]);
        for (index, job) in plan.jobs.iter().enumerate() {
            let mut writes = job.original_path();
            if let Some(transparent) = job.transparent_path() {
                writes.push('\n');
                writes.push_str(&transparent);
            }
            table.add_row(vec![
                (index + 1).to_string(),
                job_label(job.kind, job.element_id.as_deref()),
                job.prompt.clone(),
                writes,
            ]);
        }
        output.push('\n');
        output.push_str(&table.to_string());
        output.push('\n');
    }

    push_diagnostics(&mut output, &plan.diagnostics);
    output
}

pub fn format_plan_json(plan: &JobPlan) -> String {
    serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_config_validation(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return format!("{}", "Configuration is valid".green());
    }
    let mut output = format!(
        "{}\n",
        format!("Configuration has {} problem(s):", errors.len()).red()
    );
    for error in errors {
        output.push_str(&format!("  - {}\n", error));
    }
    output
}
