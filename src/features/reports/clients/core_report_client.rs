use async_trait::async_trait;
use reqwest::StatusCode;

use crate::core::config::CoreApiConfig;
use crate::core::error::Result;
use crate::features::auth::AuthToken;
use crate::features::reports::models::{ActivityRecord, DeliveryPatch, Report};
use crate::shared::http::{self, with_bearer};

/// Report-related upstream calls
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Reports with no artifact linked yet, in upstream order
    async fn list_not_delivered(&self, token: Option<&AuthToken>) -> Result<Vec<Report>>;

    /// Activity records inside the report's date range
    async fn fetch_activity_data(
        &self,
        token: Option<&AuthToken>,
        report: &Report,
    ) -> Result<Vec<ActivityRecord>>;

    /// Link the stored artifact to the report, marking it delivered
    async fn deliver(
        &self,
        token: Option<&AuthToken>,
        report_id: &str,
        patch: &DeliveryPatch,
    ) -> Result<()>;
}

/// HTTP client for the upstream report and store routes
pub struct CoreReportClient {
    config: CoreApiConfig,
    http_client: reqwest::Client,
}

impl CoreReportClient {
    pub fn new(config: CoreApiConfig) -> Result<Self> {
        let http_client = http::build_client(config.request_timeout)?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ReportApi for CoreReportClient {
    async fn list_not_delivered(&self, token: Option<&AuthToken>) -> Result<Vec<Report>> {
        let url = self
            .config
            .endpoint(&self.config.report_route, "/not-delivered");

        let response = with_bearer(self.http_client.get(&url), token)
            .send()
            .await?;

        let items: Vec<serde_json::Value> = http::read_data(response, &[StatusCode::OK]).await?;
        Ok(decode_reports(items))
    }

    async fn fetch_activity_data(
        &self,
        token: Option<&AuthToken>,
        report: &Report,
    ) -> Result<Vec<ActivityRecord>> {
        let url = self.config.endpoint(&self.config.store_route, "/for-runner");
        let query = report.activity_query()?;

        tracing::debug!(
            "Fetching activity data for report {}: {:?} from {} to {}",
            report.code,
            query.activity_id,
            query.start_date,
            query.end_date
        );

        let response = with_bearer(self.http_client.post(&url), token)
            .json(&query)
            .send()
            .await?;

        http::read_data(response, &[StatusCode::CREATED]).await
    }

    async fn deliver(
        &self,
        token: Option<&AuthToken>,
        report_id: &str,
        patch: &DeliveryPatch,
    ) -> Result<()> {
        let path = format!("/{}", urlencoding::encode(report_id));
        let url = self.config.endpoint(&self.config.report_route, &path);

        let response = with_bearer(self.http_client.patch(&url), token)
            .json(patch)
            .send()
            .await?;

        // The echoed report is not used
        http::check_status(response, &[StatusCode::OK]).await?;
        Ok(())
    }
}

/// Decode each listed report on its own so one malformed entry is skipped
/// instead of hiding the rest of the list
fn decode_reports(items: Vec<serde_json::Value>) -> Vec<Report> {
    items
        .into_iter()
        .filter_map(|item| {
            let label = item
                .get("code")
                .or_else(|| item.get("id"))
                .map(|v| v.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            match serde_json::from_value::<Report>(item) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::error!("Skipping malformed report {}: {}", label, e);
                    None
                }
            }
        })
        .collect()
}
