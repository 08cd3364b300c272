//! CLI entry point
//!
//! Wires the adb-backed device, the on-device status store and the
//! configuration into a [`BugReportAppTester`] and prints its report.

use crate::bugreport::DeviceStatusStore;
use crate::common::{Config, Result};
use crate::device::{AdbRunner, DeviceController};
use crate::tester::{print_final_results, BugReportAppTester};

/// Run one BugReport app test against the device with `serial`
///
/// Without a serial, adb picks the only connected device.
pub async fn run(serial: Option<String>) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let runner = AdbRunner::new(&config.device.adb_path, serial)?;
    let device = DeviceController::new(runner);
    let paths = config.device_paths();
    let store = DeviceStatusStore::new(device.clone(), paths.clone());

    let tester = BugReportAppTester::new(device, store, config.timing(), paths)
        .with_output_dir(&config.output.data_dir);
    let report = tester.run().await?;

    print_final_results(&report);
    Ok(())
}
