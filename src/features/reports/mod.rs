pub mod clients;
pub mod models;
pub mod services;
pub mod workers;

pub use clients::CoreReportClient;
pub use services::ReportRenderer;
pub use workers::{PollScheduler, ReportProcessor};
