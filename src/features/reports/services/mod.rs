mod report_renderer;
mod temp_artifact;

pub use report_renderer::ReportRenderer;
