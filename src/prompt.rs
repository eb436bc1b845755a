//! Prompt construction from specification fields.

use crate::specification::{non_empty, BackgroundSpec, ElementSpec};

/// Delimiter between prompt parts; diffusion models read comma-separated concepts.
pub const PROMPT_DELIMITER: &str = ", ";

/// The specification a prompt is built from.
#[derive(Debug, Clone, Copy)]
pub enum PromptSource<'a> {
    Element(&'a ElementSpec),
    Background(&'a BackgroundSpec),
}

/// Build the generation prompt for `source`, or `None` when it has no usable
/// `regenerationPrompt`.
///
/// Element prompts append the descriptive fields in a fixed order; empty fields are
/// omitted. Whitespace-only values count as present and nothing is trimmed.
pub fn build_prompt(source: PromptSource<'_>) -> Option<String> {
    match source {
        PromptSource::Background(background) => {
            non_empty(background.regeneration_prompt.as_deref()).map(str::to_string)
        }
        PromptSource::Element(element) => {
            let base = non_empty(element.regeneration_prompt.as_deref())?;
            let mut parts = vec![base];
            parts.extend(descriptive_fields(element).into_iter().filter_map(non_empty));
            Some(parts.join(PROMPT_DELIMITER))
        }
    }
}

fn descriptive_fields(element: &ElementSpec) -> [Option<&str>; 8] {
    [
        element.critical_constraints.as_deref(),
        element.lighting_requirements.as_deref(),
        element.style_continuity_markers.as_deref(),
        element.transparency_requirements.as_deref(),
        element.style_anchors.as_deref(),
        element.perspective.as_deref(),
        element.element_type.as_deref(),
        element.purpose.as_deref(),
    ]
}
