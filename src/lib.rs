//! BugReport App Tester - semi-automatic checks for the automotive BugReport app
//!
//! The tester drives a device over adb through one full bugreport lifecycle,
//! waits on the app's status database, and validates the delivered zip.

pub mod bugreport;
pub mod cli;
pub mod common;
pub mod device;
pub mod tester;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
