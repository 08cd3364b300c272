//! Bugreport lifecycle tracking and artifact validation

pub mod artifact;
mod record;
mod store;
mod waiter;

pub use artifact::{
    classify, extract_important_files, BuildProperties, Category, ExtractedFile, FileValidation,
    ValidationReport,
};
pub use record::{BugReportRecord, Status};
pub use store::{read_records, DeviceStatusStore, StatusStore};
pub use waiter::{LifecycleWaiter, StatusWait, WaitError};
