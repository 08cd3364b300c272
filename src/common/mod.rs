//! Common utilities: configuration, errors, logging and paths

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{Config, DevicePaths, Timing};
pub use error::{Error, Result};
