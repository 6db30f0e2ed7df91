use serde::Deserialize;
use serde_json::Value;

/// One submitted row of activity data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub created_at: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Labelled, typed value within an activity record
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Field {
    /// Column this field lands in; unlabelled fields have none
    pub fn column_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.is_empty())
    }

    /// Whether the value holds stored object ids rather than a scalar
    pub fn is_file_reference(&self, file_field_types: &[String]) -> bool {
        self.field_type.as_deref().is_some_and(|t| {
            let t = t.trim();
            file_field_types.iter().any(|ft| ft.eq_ignore_ascii_case(t))
        })
    }
}
