mod core_report_client;

pub use core_report_client::{CoreReportClient, ReportApi};
