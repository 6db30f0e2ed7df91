//! In-memory fakes and fixtures shared by the pipeline tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::config::{CoreApiConfig, WorkerConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::{AuthToken, Authenticator};
use crate::features::reports::clients::ReportApi;
use crate::features::reports::models::{ActivityRecord, DeliveryPatch, Report};
use crate::modules::storage::{ObjectStore, StoredObject};
use crate::shared::constants::DEFAULT_FILE_FIELD_TYPES;

pub fn core_config(base_url: &str) -> CoreApiConfig {
    CoreApiConfig {
        base_url: base_url.to_string(),
        auth_route: "/auth".to_string(),
        report_route: "/reports".to_string(),
        store_route: "/stores".to_string(),
        username: "runner@example.com".to_string(),
        password: "secret".to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn worker_config(temp_dir: &Path) -> WorkerConfig {
    WorkerConfig {
        poll_interval: Duration::from_millis(1),
        temp_dir: temp_dir.to_path_buf(),
        file_field_types: DEFAULT_FILE_FIELD_TYPES
            .split(',')
            .map(str::to_string)
            .collect(),
    }
}

pub fn report(id: &str, code: &str) -> Report {
    serde_json::from_value(json!({
        "id": id,
        "code": code,
        "activityId": "act-1",
        "startDate": "2025-02-24T00:00:00.000Z",
        "endDate": "2025-02-25T00:00:00.000Z"
    }))
    .unwrap()
}

pub fn record(created_at: &str, fields: Value) -> ActivityRecord {
    serde_json::from_value(json!({ "createdAt": created_at, "fields": fields })).unwrap()
}

/// Ordered log of calls made across fakes
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeAuth {
    succeed: bool,
}

impl FakeAuth {
    pub fn ok() -> Self {
        Self { succeed: true }
    }

    pub fn failing() -> Self {
        Self { succeed: false }
    }
}

#[async_trait]
impl Authenticator for FakeAuth {
    async fn sign_in(&self) -> Result<AuthToken> {
        if self.succeed {
            Ok(AuthToken::new("test-token"))
        } else {
            Err(AppError::Upstream {
                status: 401,
                message: "Invalid credentials".to_string(),
            })
        }
    }
}

pub struct FakeReportApi {
    journal: Journal,
    reports: Vec<Report>,
    data: HashMap<String, Vec<ActivityRecord>>,
    failing_deliveries: HashSet<String>,
    require_token: bool,
    deliveries: Mutex<Vec<(String, DeliveryPatch)>>,
}

impl FakeReportApi {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            reports: Vec::new(),
            data: HashMap::new(),
            failing_deliveries: HashSet::new(),
            require_token: false,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reports(mut self, reports: Vec<Report>) -> Self {
        self.reports = reports;
        self
    }

    pub fn with_data(mut self, code: &str, records: Vec<ActivityRecord>) -> Self {
        self.data.insert(code.to_string(), records);
        self
    }

    pub fn failing_delivery(mut self, report_id: &str) -> Self {
        self.failing_deliveries.insert(report_id.to_string());
        self
    }

    pub fn rejecting_missing_token(mut self) -> Self {
        self.require_token = true;
        self
    }

    /// Successful deliveries as (report id, patch)
    pub fn deliveries(&self) -> Vec<(String, DeliveryPatch)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportApi for FakeReportApi {
    async fn list_not_delivered(&self, token: Option<&AuthToken>) -> Result<Vec<Report>> {
        self.journal.push(format!(
            "list token={}",
            if token.is_some() { "Some" } else { "None" }
        ));
        if self.require_token && token.is_none() {
            return Err(AppError::Upstream {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }
        Ok(self.reports.clone())
    }

    async fn fetch_activity_data(
        &self,
        _token: Option<&AuthToken>,
        report: &Report,
    ) -> Result<Vec<ActivityRecord>> {
        self.journal.push(format!("fetch {}", report.code));
        self.data
            .get(&report.code)
            .cloned()
            .ok_or_else(|| AppError::Upstream {
                status: 404,
                message: format!("No activity for {}", report.code),
            })
    }

    async fn deliver(
        &self,
        _token: Option<&AuthToken>,
        report_id: &str,
        patch: &DeliveryPatch,
    ) -> Result<()> {
        self.journal.push(format!("deliver {}", report_id));
        if self.failing_deliveries.contains(report_id) {
            return Err(AppError::Upstream {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((report_id.to_string(), patch.clone()));
        Ok(())
    }
}

pub struct FakeStore {
    journal: Journal,
    fail_uploads: bool,
    uploads: Mutex<Vec<StoredObject>>,
    resolved: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_uploads: false,
            uploads: Mutex::new(Vec::new()),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn uploads(&self) -> Vec<StoredObject> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(
        &self,
        filename: &str,
        data: Vec<u8>,
        _content_type: &str,
        generate_url: bool,
    ) -> Result<StoredObject> {
        self.journal.push(format!("upload {}", filename));
        if self.fail_uploads {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        assert!(!data.is_empty(), "uploaded artifact is empty");

        let object_name = format!("reports/{}-{}", self.uploads().len(), filename);
        let stored = StoredObject {
            object_url: generate_url.then(|| format!("https://store.test/{}", object_name)),
            object_name,
        };
        self.uploads.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn resolve_url(&self, object_name: &str) -> Result<String> {
        self.resolved.lock().unwrap().push(object_name.to_string());
        Ok(format!("https://store.test/{}", object_name))
    }
}
