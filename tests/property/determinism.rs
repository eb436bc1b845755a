//! Property-based tests for determinism guarantees

use briefgen::generation::{plan, JobKind};
use briefgen::prompt::{build_prompt, PromptSource, PROMPT_DELIMITER};
use briefgen::specification::{ElementSpec, SpecificationRecord};
use proptest::prelude::*;
use serde_json::json;

fn field() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z]{1,8}")
}

/// Test that every present field appears in the prompt, in fixed order
#[test]
fn test_prompt_preserves_field_order_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[a-z]{1,12}",
                prop::collection::vec(field(), 8),
            ),
            |(base, fields)| {
                let spec = ElementSpec {
                    id: Some("e1".to_string()),
                    regeneration_prompt: Some(base.clone()),
                    critical_constraints: fields[0].clone(),
                    lighting_requirements: fields[1].clone(),
                    style_continuity_markers: fields[2].clone(),
                    transparency_requirements: fields[3].clone(),
                    style_anchors: fields[4].clone(),
                    perspective: fields[5].clone(),
                    element_type: fields[6].clone(),
                    purpose: fields[7].clone(),
                };

                let prompt = build_prompt(PromptSource::Element(&spec)).unwrap();
                let mut expected = vec![base];
                expected.extend(fields.into_iter().flatten());
                assert_eq!(prompt, expected.join(PROMPT_DELIMITER));

                // Same spec always produces the same prompt
                assert_eq!(build_prompt(PromptSource::Element(&spec)), Some(prompt));

                Ok(())
            },
        )
        .unwrap();
}

/// Test that whitespace-only prompts are kept verbatim, and only "" is dropped
#[test]
fn test_whitespace_prompt_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[ \t\n]{0,6}", |whitespace| {
            let spec = ElementSpec {
                id: Some("e1".to_string()),
                regeneration_prompt: Some(whitespace.clone()),
                purpose: Some("icon".to_string()),
                ..Default::default()
            };
            let expected = if whitespace.is_empty() {
                None
            } else {
                Some(format!("{}{}icon", whitespace, PROMPT_DELIMITER))
            };
            assert_eq!(build_prompt(PromptSource::Element(&spec)), expected);
            Ok(())
        })
        .unwrap();
}

fn record() -> impl Strategy<Value = SpecificationRecord> {
    (
        prop::collection::vec(("[a-z0-9]{1,6}", prop::option::of("[a-z ]{1,10}")), 0..5),
        prop::option::of("[a-z]{1,10}"),
    )
        .prop_map(|(elements, background)| {
            let elements: Vec<_> = elements
                .into_iter()
                .map(|(id, prompt)| json!({ "id": id, "regenerationPrompt": prompt }))
                .collect();
            let mut data = json!({ "elements": elements });
            if let Some(prompt) = background {
                data["background"] = json!({ "regenerationPrompt": prompt });
            }
            SpecificationRecord::new(data)
        })
}

/// Test that planning is deterministic and keeps per-record job order
#[test]
fn test_plan_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(record(), 0..4), |records| {
            let first = plan("brief", &records);
            let second = plan("brief", &records);
            assert_eq!(first, second);

            // At most one background per record, always after that record's elements
            let backgrounds = first
                .jobs
                .iter()
                .filter(|job| job.kind == JobKind::Background)
                .count();
            assert!(backgrounds <= records.len());
            assert_eq!(
                first.jobs.len() + first.diagnostics.len(),
                records
                    .iter()
                    .map(|r| {
                        let document = r.document().unwrap().unwrap();
                        document.elements.len() + 1
                    })
                    .sum::<usize>()
            );

            for job in &first.jobs {
                assert!(job.original_path().starts_with("brief/"));
                assert_eq!(job.needs_background_removal, job.kind == JobKind::Element);
            }

            Ok(())
        })
        .unwrap();
}
