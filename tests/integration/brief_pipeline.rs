//! End-to-end brief processing against in-memory collaborators.

use super::test_utils::{
    service_context, RecordingGenerator, ScriptedRemover, SelectiveStorage, StaticSpecStore,
    UnreachableSpecStore,
};
use briefgen::asset::decode_image;
use briefgen::generation::{
    BriefOrchestrator, BriefState, FailureReason, JobKind, JobOutcome, SkipReason,
    TransparentOutcome,
};
use briefgen::specification::SpecificationRecord;
use briefgen::storage::MemoryObjectStorage;
use image::GenericImageView;
use serde_json::json;
use std::sync::Arc;

fn brief_records() -> Vec<SpecificationRecord> {
    vec![SpecificationRecord::new(json!({
        "elements": [
            {
                "id": "e7",
                "name": "Mascot",
                "regenerationPrompt": "a cat",
                "lightingRequirements": "soft",
                "purpose": "icon",
                "dimensions": { "width": 512, "height": 512 }
            },
            { "name": "no id", "regenerationPrompt": "orphan" },
            { "id": "e9", "regenerationPrompt": "a bottle", "type": "product" }
        ],
        "background": { "type": "scene", "regenerationPrompt": "a beach at dusk" }
    }))]
}

#[tokio::test]
async fn full_brief_stores_every_variant() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let generator = Arc::new(RecordingGenerator::new());
    let remover = Arc::new(ScriptedRemover::working());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(store, generator.clone(), Some(remover.clone()), storage.clone());

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert_eq!(summary.state, BriefState::Done);
    assert_eq!(summary.records_seen, 1);
    assert_eq!(summary.jobs_planned, 3);
    assert_eq!(summary.jobs_run, 3);
    assert_eq!(summary.jobs_stored, 3);
    assert_eq!(summary.jobs_degraded, 0);
    assert_eq!(summary.jobs_skipped, 1);
    assert_eq!(summary.jobs_failed, 0);

    assert_eq!(
        generator.prompts(),
        vec!["a cat, soft, icon", "a bottle, product", "a beach at dusk"]
    );
    assert_eq!(remover.calls(), 2);
    assert_eq!(
        storage.written_paths(),
        vec![
            "element-images/b1/e7_original.png",
            "element-images/b1/e7_transparent.png",
            "element-images/b1/e9_original.png",
            "element-images/b1/e9_transparent.png",
            "element-images/b1/background.png",
        ]
    );
    assert!(storage
        .writes()
        .iter()
        .all(|w| w.content_type == "image/png"));

    let transparent = storage
        .get("element-images", "b1/e7_transparent.png")
        .unwrap();
    let decoded = decode_image(&transparent.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (4, 4));
    assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0[3], 0);
}

#[tokio::test]
async fn empty_store_makes_no_collaborator_calls() {
    let store = Arc::new(StaticSpecStore::new(Vec::new()));
    let generator = Arc::new(RecordingGenerator::new());
    let remover = Arc::new(ScriptedRemover::working());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(
        store.clone(),
        generator.clone(),
        Some(remover.clone()),
        storage.clone(),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b-empty").await;

    assert_eq!(summary.state, BriefState::EmptyDone);
    assert_eq!(
        (
            summary.jobs_planned,
            summary.jobs_run,
            summary.jobs_stored,
            summary.jobs_skipped,
            summary.jobs_failed
        ),
        (0, 0, 0, 0, 0)
    );
    assert_eq!(store.lookups.lock().as_slice(), ["b-empty".to_string()]);
    assert!(generator.prompts().is_empty());
    assert_eq!(remover.calls(), 0);
    assert!(storage.writes().is_empty());
}

#[tokio::test]
async fn lookup_failure_reads_as_no_specifications() {
    let generator = Arc::new(RecordingGenerator::new());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(
        Arc::new(UnreachableSpecStore),
        generator.clone(),
        None,
        storage.clone(),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;
    assert_eq!(summary.state, BriefState::EmptyDone);
    assert_eq!(summary.records_seen, 0);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn generation_failure_is_isolated_to_its_job() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let generator = Arc::new(RecordingGenerator::new().fail_on("a bottle, product"));
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(store, generator.clone(), None, storage.clone());

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert_eq!(summary.jobs_run, 3);
    assert_eq!(summary.jobs_failed, 1);
    assert_eq!(summary.jobs_stored, 2);
    let failed = &summary.reports[1];
    assert_eq!(failed.element_id.as_deref(), Some("e9"));
    assert!(matches!(
        failed.outcome,
        JobOutcome::Failed(FailureReason::Generation(_))
    ));
    assert_eq!(
        storage.written_paths(),
        vec![
            "element-images/b1/e7_original.png",
            "element-images/b1/background.png",
        ]
    );
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn removal_failure_degrades_but_stores() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let remover = Arc::new(ScriptedRemover::failing());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(
        store,
        Arc::new(RecordingGenerator::new()),
        Some(remover),
        storage.clone(),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert_eq!(summary.jobs_stored, 3);
    assert_eq!(summary.jobs_degraded, 2);
    assert_eq!(summary.jobs_failed, 0);
    for report in summary.reports.iter().filter(|r| r.kind == JobKind::Element) {
        match &report.outcome {
            JobOutcome::Stored(stored) => {
                assert!(matches!(
                    stored.transparent,
                    TransparentOutcome::RemovalFailed(_)
                ));
                assert_eq!(report.outcome.label(), "stored-without-transparent");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert!(storage
        .written_paths()
        .iter()
        .all(|p| !p.ends_with("_transparent.png")));
}

#[tokio::test]
async fn storage_failures_split_by_variant() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let storage = Arc::new(SelectiveStorage::rejecting(&[
        "e7_original.png",
        "e9_transparent.png",
    ]));
    let remover = Arc::new(ScriptedRemover::working());
    let services = service_context(
        store,
        Arc::new(RecordingGenerator::new()),
        Some(remover.clone()),
        storage.clone(),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert!(matches!(
        summary.reports[0].outcome,
        JobOutcome::Failed(FailureReason::StoreOriginal(_))
    ));
    match &summary.reports[1].outcome {
        JobOutcome::Stored(stored) => {
            assert!(matches!(stored.transparent, TransparentOutcome::StoreFailed(_)))
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    // removal never runs for a job whose original was not stored
    assert_eq!(remover.calls(), 1);
    assert_eq!(summary.jobs_failed, 1);
    assert_eq!(summary.jobs_degraded, 1);
    assert_eq!(
        storage.inner.written_paths(),
        vec![
            "element-images/b1/e9_original.png",
            "element-images/b1/background.png",
        ]
    );
}

#[tokio::test]
async fn rerun_repeats_the_same_writes() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(
        store,
        Arc::new(RecordingGenerator::new()),
        Some(Arc::new(ScriptedRemover::working())),
        storage.clone(),
    );
    let orchestrator = BriefOrchestrator::new(services);

    let first = orchestrator.process_brief("b1").await;
    let first_paths = storage.written_paths();
    let second = orchestrator.process_brief("b1").await;
    let all_paths = storage.written_paths();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(all_paths.len(), first_paths.len() * 2);
    assert_eq!(&all_paths[first_paths.len()..], first_paths.as_slice());
}

#[tokio::test]
async fn malformed_records_do_not_stop_the_brief() {
    let store = Arc::new(StaticSpecStore::new(vec![
        SpecificationRecord::default(),
        SpecificationRecord::new(json!("not a document")),
        SpecificationRecord::new(json!(
            r#"{"elements":[{"id":"e1","regenerationPrompt":"a lamp"}]}"#
        )),
        SpecificationRecord::new(json!({ "background": { "regenerationPrompt": "" } })),
    ]));
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(
        store,
        Arc::new(RecordingGenerator::new()),
        None,
        storage.clone(),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert_eq!(summary.records_seen, 4);
    assert_eq!(summary.jobs_planned, 1);
    assert_eq!(summary.jobs_stored, 1);
    // missing-data, malformed-data, empty background prompt
    assert_eq!(summary.jobs_skipped, 3);
    assert_eq!(
        summary.skipped_by_reason.into_iter().collect::<Vec<_>>(),
        vec![
            (SkipReason::MissingData, 1),
            (SkipReason::MalformedData, 1),
            (SkipReason::InvalidBackground, 1),
        ]
    );
    let codes: Vec<_> = summary.diagnostics.iter().map(|d| d.code()).collect();
    assert_eq!(
        codes,
        vec![
            "missing-data",
            "malformed-data",
            "missing-background",
            "missing-background"
        ]
    );
    assert!(summary
        .diagnostics
        .iter()
        .filter_map(|d| d.skip_reason())
        .any(|r| r == SkipReason::InvalidBackground));
    assert_eq!(storage.written_paths(), vec!["element-images/b1/e1_original.png"]);
}

#[tokio::test]
async fn badly_shaped_element_keeps_its_siblings() {
    let store = Arc::new(StaticSpecStore::new(vec![SpecificationRecord::new(json!({
        "elements": [
            { "id": "e1", "regenerationPrompt": "a bottle" },
            null,
            { "id": "e3", "regenerationPrompt": " " }
        ],
        "background": { "regenerationPrompt": "sky" }
    }))]));
    let generator = Arc::new(RecordingGenerator::new());
    let storage = Arc::new(MemoryObjectStorage::new());
    let services = service_context(store, generator.clone(), None, storage.clone());

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;

    assert_eq!(summary.jobs_planned, 3);
    assert_eq!(summary.jobs_stored, 3);
    assert_eq!(summary.jobs_skipped, 1);
    assert_eq!(generator.prompts(), vec!["a bottle", " ", "sky"]);
    assert_eq!(
        storage.written_paths(),
        vec![
            "element-images/b1/e1_original.png",
            "element-images/b1/e3_original.png",
            "element-images/b1/background.png",
        ]
    );
}

#[tokio::test]
async fn summary_serializes_for_reporting() {
    let store = Arc::new(StaticSpecStore::new(brief_records()));
    let services = service_context(
        store,
        Arc::new(RecordingGenerator::new()),
        None,
        Arc::new(MemoryObjectStorage::new()),
    );
    let summary = BriefOrchestrator::new(services).process_brief("b1").await;
    let value = serde_json::to_value(&summary).unwrap();

    assert_eq!(value["brief_id"], "b1");
    assert_eq!(value["state"], "done");
    assert_eq!(value["reports"][0]["outcome"]["status"], "stored");
    assert_eq!(
        value["reports"][0]["outcome"]["detail"]["original"]["path"],
        "b1/e7_original.png"
    );
    assert_eq!(
        value["reports"][0]["outcome"]["detail"]["transparent"]["status"],
        "disabled"
    );
}
