//! Specification data model
//!
//! A brief owns zero or more specification records. Each record carries a JSON
//! `specification_data` document with an ordered `elements` section and an optional
//! `background` section. Both sections may be absent; the planner treats absence as
//! "nothing to generate", never as an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub mod store;

pub use store::{JsonFileSpecificationStore, SpecificationStore};

/// One row from the specification store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationRecord {
    #[serde(default)]
    pub specification_data: Option<Value>,
}

impl SpecificationRecord {
    pub fn new(specification_data: Value) -> Self {
        Self {
            specification_data: Some(specification_data),
        }
    }

    /// Decode the record's document.
    ///
    /// Returns `Ok(None)` when the record carries no data (missing or JSON null) and
    /// `Err` when the data is present but cannot be read as a document. A JSON string
    /// holding an encoded object is decoded first.
    pub fn document(&self) -> Result<Option<SpecificationDocument>, serde_json::Error> {
        let data = match &self.specification_data {
            None | Some(Value::Null) => return Ok(None),
            Some(data) => data,
        };
        let document = match data {
            Value::String(encoded) => serde_json::from_str(encoded)?,
            other => SpecificationDocument::deserialize(other)?,
        };
        Ok(Some(document))
    }
}

/// The document stored in `specification_data`.
///
/// Sections are decoded item by item so one badly shaped entry never hides its
/// siblings. An `elements` entry that is not an object decodes as `None`; a
/// `background` that is not an object decodes as a section without a prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationDocument {
    #[serde(default, deserialize_with = "element_entries")]
    pub elements: Vec<Option<ElementSpec>>,
    #[serde(default, deserialize_with = "background_section")]
    pub background: Option<BackgroundSpec>,
}

/// Visual specification for a single element.
///
/// Only the fields that feed prompt construction are modelled; layout fields such as
/// `dimensions`, `position` or `layerDepth` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSpec {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub regeneration_prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub critical_constraints: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lighting_requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_continuity_markers: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub transparency_requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_anchors: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub perspective: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub element_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub purpose: Option<String>,
}

impl ElementSpec {
    /// The element id, if present and not empty.
    pub fn element_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }
}

/// Visual specification for the background plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSpec {
    #[serde(default, deserialize_with = "lenient_text")]
    pub regeneration_prompt: Option<String>,
}

/// Treats `""` as absent. Whitespace is a real value and is returned untouched.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// Strings pass through, numbers become their decimal text, anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn element_entries<'de, D>(deserializer: D) -> Result<Vec<Option<ElementSpec>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries,
        // an unreadable section is one invalid entry, not a broken record
        Some(other) => vec![other],
    };
    Ok(entries.into_iter().map(element_entry).collect())
}

fn element_entry(value: Value) -> Option<ElementSpec> {
    match value {
        object @ Value::Object(_) => ElementSpec::deserialize(object).ok(),
        _ => None,
    }
}

fn background_section<'de, D>(deserializer: D) -> Result<Option<BackgroundSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(object @ Value::Object(_)) => {
            Some(BackgroundSpec::deserialize(object).unwrap_or_default())
        }
        Some(_) => Some(BackgroundSpec::default()),
    })
}
