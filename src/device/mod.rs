//! Device access through adb
//!
//! The runner captures raw command output; the controller turns it into
//! device-level operations such as root escalation and connectivity toggles.

mod controller;
mod runner;

pub use controller::DeviceController;
pub use runner::{split_lines, AdbRunner, CommandOutput, CommandRunner};
