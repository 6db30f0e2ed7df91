mod poll_scheduler;
mod report_processor;

pub use poll_scheduler::PollScheduler;
pub use report_processor::ReportProcessor;
