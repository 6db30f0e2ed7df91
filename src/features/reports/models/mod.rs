mod activity_record;
mod report;

pub use activity_record::{ActivityRecord, Field};
pub use report::{DeliveryPatch, Report};
