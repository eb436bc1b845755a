//! Brief processing with the file-backed specification store and filesystem storage.

use super::test_utils::{service_context, RecordingGenerator, ScriptedRemover};
use briefgen::asset::decode_image;
use briefgen::generation::BriefOrchestrator;
use briefgen::specification::JsonFileSpecificationStore;
use briefgen::storage::FilesystemObjectStorage;
use std::sync::Arc;
use tempfile::TempDir;

const SPECS: &str = r#"[
  {
    "brief_id": "b1",
    "specification_data": {
      "elements": [
        { "id": "hero", "regenerationPrompt": "a red kite", "perspective": "low angle" }
      ],
      "background": { "regenerationPrompt": "open sky" }
    }
  },
  {
    "brief_id": "b2",
    "specification_data": {
      "elements": [{ "id": "other", "regenerationPrompt": "not this brief" }]
    }
  }
]"#;

#[tokio::test]
async fn writes_assets_under_bucket_directory() {
    let temp = TempDir::new().unwrap();
    let specs_path = temp.path().join("specs.json");
    std::fs::write(&specs_path, SPECS).unwrap();

    let generator = Arc::new(RecordingGenerator::new());
    let services = service_context(
        Arc::new(JsonFileSpecificationStore::new(&specs_path)),
        generator.clone(),
        Some(Arc::new(ScriptedRemover::working())),
        Arc::new(FilesystemObjectStorage::new(temp.path().join("assets")).unwrap()),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;
    assert_eq!(summary.jobs_stored, 2);
    assert_eq!(generator.prompts(), vec!["a red kite, low angle", "open sky"]);

    let bucket = temp.path().join("assets/element-images/b1");
    for name in ["hero_original.png", "hero_transparent.png", "background.png"] {
        let bytes = std::fs::read(bucket.join(name)).unwrap();
        assert!(decode_image(&bytes).is_ok(), "{} should be a PNG", name);
    }
    assert!(!temp.path().join("assets/element-images/b2").exists());

    let mut entries: Vec<_> = std::fs::read_dir(&bucket)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    entries.sort();
    assert_eq!(
        entries,
        vec!["background.png", "hero_original.png", "hero_transparent.png"]
    );
}

#[tokio::test]
async fn missing_spec_file_yields_empty_summary() {
    let temp = TempDir::new().unwrap();
    let services = service_context(
        Arc::new(JsonFileSpecificationStore::new(temp.path().join("absent.json"))),
        Arc::new(RecordingGenerator::new()),
        None,
        Arc::new(FilesystemObjectStorage::new(temp.path().join("assets")).unwrap()),
    );

    let summary = BriefOrchestrator::new(services).process_brief("b1").await;
    assert_eq!(summary.records_seen, 0);
    assert_eq!(summary.jobs_run, 0);
}

#[tokio::test]
async fn preview_leaves_storage_untouched() {
    let temp = TempDir::new().unwrap();
    let specs_path = temp.path().join("specs.json");
    std::fs::write(&specs_path, SPECS).unwrap();
    let generator = Arc::new(RecordingGenerator::new());
    let services = service_context(
        Arc::new(JsonFileSpecificationStore::new(&specs_path)),
        generator.clone(),
        None,
        Arc::new(FilesystemObjectStorage::new(temp.path().join("assets")).unwrap()),
    );

    let plan = BriefOrchestrator::new(services).preview("b1").await;
    assert_eq!(plan.jobs.len(), 2);
    assert_eq!(plan.jobs[0].original_path(), "b1/hero_original.png");
    assert!(generator.prompts().is_empty());
    assert!(!temp.path().join("assets/element-images").exists());
}
