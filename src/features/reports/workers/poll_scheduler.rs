use std::sync::Arc;
use std::time::Duration;

use crate::features::auth::{AuthToken, Authenticator};
use crate::features::reports::clients::ReportApi;
use super::report_processor::{ProcessOutcome, ReportProcessor};

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSummary {
    /// The undelivered list could not be fetched
    ListFailed,
    /// Nothing to deliver
    Idle,
    /// Every listed report was attempted
    Processed {
        delivered: usize,
        empty: usize,
        failed: usize,
    },
}

/// Outer loop: sign in, list undelivered reports, process them one by one,
/// sleep, repeat.
pub struct PollScheduler {
    auth: Arc<dyn Authenticator>,
    reports: Arc<dyn ReportApi>,
    processor: ReportProcessor,
    poll_interval: Duration,
}

impl PollScheduler {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        reports: Arc<dyn ReportApi>,
        processor: ReportProcessor,
        poll_interval: Duration,
    ) -> Self {
        Self {
            auth,
            reports,
            processor,
            poll_interval,
        }
    }

    /// Run forever; only external interruption stops the loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting report delivery worker (poll interval: {}s)",
            self.poll_interval.as_secs()
        );

        loop {
            match self.run_cycle().await {
                CycleSummary::Processed {
                    delivered,
                    empty,
                    failed,
                } => tracing::info!(
                    "Cycle complete: {} delivered, {} without data, {} failed. Waiting {}s for next iteration",
                    delivered,
                    empty,
                    failed,
                    self.poll_interval.as_secs()
                ),
                CycleSummary::Idle | CycleSummary::ListFailed => tracing::info!(
                    "Waiting {}s for next iteration",
                    self.poll_interval.as_secs()
                ),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One iteration without the trailing sleep
    pub async fn run_cycle(&self) -> CycleSummary {
        // Re-acquired every cycle; token lifetime is unknown so nothing is cached
        let token: Option<AuthToken> = match self.auth.sign_in().await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::error!("Error while logging in to core: {}", e);
                None
            }
        };

        let reports = match self.reports.list_not_delivered(token.as_ref()).await {
            Ok(reports) => reports,
            Err(e) => {
                tracing::error!("Error while listing reports not delivered: {}", e);
                return CycleSummary::ListFailed;
            }
        };

        if reports.is_empty() {
            tracing::debug!("No undelivered reports");
            return CycleSummary::Idle;
        }

        tracing::info!("Found {} undelivered reports", reports.len());

        let (mut delivered, mut empty, mut failed) = (0, 0, 0);
        for report in &reports {
            match self.processor.process(token.as_ref(), report).await {
                Ok(ProcessOutcome::Delivered(report)) => {
                    tracing::debug!(
                        "Report {} linked to {:?} ({:?})",
                        report.code,
                        report.filename,
                        report.filelink
                    );
                    delivered += 1;
                }
                Ok(ProcessOutcome::Empty) => empty += 1,
                Err(e) => {
                    tracing::error!("Error while delivering report {}: {}", report.code, e);
                    failed += 1;
                }
            }
        }

        CycleSummary::Processed {
            delivered,
            empty,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::services::ReportRenderer;
    use crate::shared::test_helpers::{
        record, report, worker_config, FakeAuth, FakeReportApi, FakeStore, Journal,
    };
    use serde_json::json;
    use std::path::Path;

    fn scheduler(
        auth: FakeAuth,
        api: Arc<FakeReportApi>,
        store: Arc<FakeStore>,
        temp_dir: &Path,
    ) -> PollScheduler {
        let renderer = ReportRenderer::new(store.clone(), &worker_config(temp_dir));
        let processor = ReportProcessor::new(api.clone(), store, renderer);
        PollScheduler::new(Arc::new(auth), api, processor, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_empty_list_skips_processing() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let api = Arc::new(FakeReportApi::new(journal.clone()));
        let store = Arc::new(FakeStore::new(journal.clone()));

        let summary = scheduler(FakeAuth::ok(), api, store, dir.path())
            .run_cycle()
            .await;

        assert_eq!(summary, CycleSummary::Idle);
        assert_eq!(journal.entries(), vec!["list token=Some"]);
    }

    #[tokio::test]
    async fn test_failed_sign_in_still_lists_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let api = Arc::new(FakeReportApi::new(journal.clone()).rejecting_missing_token());
        let store = Arc::new(FakeStore::new(journal.clone()));

        let summary = scheduler(FakeAuth::failing(), api, store, dir.path())
            .run_cycle()
            .await;

        assert_eq!(summary, CycleSummary::ListFailed);
        assert_eq!(journal.entries(), vec!["list token=None"]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let data = vec![record(
            "2025-02-24T08:30:00.000Z",
            json!([{"label": "Nom", "type": "text", "value": "Awa"}]),
        )];
        let api = Arc::new(
            FakeReportApi::new(journal.clone())
                .with_reports(vec![
                    report("r1", "RPT-1"),
                    report("r2", "RPT-2"),
                    report("r3", "RPT-3"),
                ])
                .with_data("RPT-1", data.clone())
                .with_data("RPT-2", data.clone())
                .with_data("RPT-3", vec![])
                .failing_delivery("r1"),
        );
        let store = Arc::new(FakeStore::new(journal.clone()));

        let summary = scheduler(FakeAuth::ok(), api.clone(), store, dir.path())
            .run_cycle()
            .await;

        assert_eq!(
            summary,
            CycleSummary::Processed {
                delivered: 1,
                empty: 1,
                failed: 1,
            }
        );
        assert_eq!(
            journal.entries(),
            vec![
                "list token=Some",
                "fetch RPT-1",
                "upload RPT-1.xlsx",
                "deliver r1",
                "fetch RPT-2",
                "upload RPT-2.xlsx",
                "deliver r2",
                "fetch RPT-3",
            ]
        );
        assert_eq!(api.deliveries().len(), 1);
        assert_eq!(api.deliveries()[0].0, "r2");
    }

    #[tokio::test]
    async fn test_run_keeps_polling() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let api = Arc::new(FakeReportApi::new(journal.clone()));
        let store = Arc::new(FakeStore::new(journal.clone()));
        let scheduler = scheduler(FakeAuth::ok(), api, store, dir.path());

        let _ = tokio::time::timeout(Duration::from_millis(100), scheduler.run()).await;

        let entries = journal.entries();
        assert!(entries.len() >= 2);
        assert!(entries.iter().all(|entry| entry == "list token=Some"));
    }
}
