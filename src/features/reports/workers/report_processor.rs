use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::AuthToken;
use crate::features::reports::clients::ReportApi;
use crate::features::reports::models::{DeliveryPatch, Report};
use crate::features::reports::services::ReportRenderer;
use crate::modules::storage::ObjectStore;
use crate::shared::constants::XLSX_CONTENT_TYPE;

/// How a single report pass ended, when it did not fail
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// No activity data in range; nothing rendered, report left undelivered
    Empty,
    /// Artifact stored and linked upstream; carries the updated report
    Delivered(Report),
}

/// Runs fetch -> render -> upload -> notify for one report.
///
/// No retries: a report that fails anywhere stays undelivered upstream and is
/// picked up again on the next poll cycle.
pub struct ReportProcessor {
    reports: Arc<dyn ReportApi>,
    store: Arc<dyn ObjectStore>,
    renderer: ReportRenderer,
}

impl ReportProcessor {
    pub fn new(
        reports: Arc<dyn ReportApi>,
        store: Arc<dyn ObjectStore>,
        renderer: ReportRenderer,
    ) -> Self {
        Self {
            reports,
            store,
            renderer,
        }
    }

    pub async fn process(&self, token: Option<&AuthToken>, report: &Report) -> Result<ProcessOutcome> {
        tracing::info!("Processing report {}", report.code);

        let records = self.reports.fetch_activity_data(token, report).await?;
        if records.is_empty() {
            tracing::info!("No activity data found for report {}", report.code);
            return Ok(ProcessOutcome::Empty);
        }

        let filename = report.artifact_filename();
        // Dropping `rendered` deletes the temporary file on every path below
        let rendered = self.renderer.render(&records, &filename).await?;

        for divergence in &rendered.divergences {
            tracing::warn!(
                "Report {}: record {} does not match the first record's fields (missing: {:?}, unexpected: {:?})",
                report.code,
                divergence.record_index,
                divergence.missing,
                divergence.unexpected
            );
        }

        for truncated in &rendered.truncations {
            tracing::warn!(
                "Report {}: record {} column {:?} truncated from {} characters to the worksheet limit",
                report.code,
                truncated.record_index,
                truncated.column,
                truncated.original_chars
            );
        }

        let data = tokio::fs::read(rendered.artifact.path()).await?;
        tracing::info!(
            "Uploading {} for report {} ({} rows, {} bytes)",
            filename,
            report.code,
            rendered.row_count,
            data.len()
        );

        let stored = self
            .store
            .upload(&filename, data, XLSX_CONTENT_TYPE, true)
            .await?;
        let filelink = stored.object_url.ok_or_else(|| {
            AppError::Storage(format!(
                "Upload of '{}' returned no URL",
                stored.object_name
            ))
        })?;

        let patch = DeliveryPatch {
            filename: stored.object_name,
            filelink,
        };
        let mut delivered = report.clone();
        delivered.assign_delivery(&patch);

        self.reports.deliver(token, &delivered.id, &patch).await?;

        tracing::info!(
            "Report {} delivered as {}",
            delivered.code,
            patch.filename
        );

        Ok(ProcessOutcome::Delivered(delivered))
    }
}
