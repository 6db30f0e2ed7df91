use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::error::Result;
use crate::shared::constants::REPORT_FILE_EXTENSION;
use crate::shared::dates;

/// Undelivered export task owned by the upstream service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    /// Passed back to the upstream untouched, whatever its JSON type
    pub activity_id: Value,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filelink: Option<String>,
}

impl Report {
    /// Artifact file name, `{code}.xlsx` with path separators neutralized
    pub fn artifact_filename(&self) -> String {
        let safe_code: String = self
            .code
            .chars()
            .map(|c| match c {
                '/' | '\\' => '_',
                c => c,
            })
            .collect();
        format!("{}.{}", safe_code, REPORT_FILE_EXTENSION)
    }

    /// Query for the activity data covering this report's date range
    pub fn activity_query(&self) -> Result<ActivityDataQuery> {
        Ok(ActivityDataQuery {
            activity_id: self.activity_id.clone(),
            start_date: dates::iso_to_date(&self.start_date)?,
            end_date: dates::iso_to_date(&self.end_date)?,
        })
    }

    /// Record the stored artifact reference on this report
    pub fn assign_delivery(&mut self, patch: &DeliveryPatch) {
        self.filename = Some(patch.filename.clone());
        self.filelink = Some(patch.filelink.clone());
    }
}

/// Body of the "data for runner" call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDataQuery {
    pub activity_id: Value,
    pub start_date: String,
    pub end_date: String,
}

/// Body of the "mark delivered" call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPatch {
    pub filename: String,
    pub filelink: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
