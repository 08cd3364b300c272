//! End-to-end BugReport app test flow
//!
//! The flow is fixed: prepare the device, let a human file a bugreport,
//! wait for dumpstate, validate the zip, then wait for the upload. Any
//! infrastructure failure aborts the run; only the upload outcome is
//! reported instead.

use colored::Colorize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::time::sleep;

use crate::bugreport::artifact::write_files;
use crate::bugreport::{
    extract_important_files, BugReportRecord, LifecycleWaiter, StatusStore, StatusWait,
    ValidationReport, WaitError,
};
use crate::common::paths::DATA_DIR_PREFIX;
use crate::common::{DevicePaths, Error, Result, Timing};
use crate::device::{CommandRunner, DeviceController};

const TOOL_NAME: &str = "bugreport-app-tester";

/// Process that must not be running when a test starts
const DUMPSTATE_PROCESS: &str = "dumpstate";

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct TestReport {
    pub record: BugReportRecord,
    pub validation: ValidationReport,
    /// Directory holding the pulled zip and extracted files
    pub data_dir: PathBuf,
    /// Why the upload did not succeed, if it didn't
    pub upload_error: Option<String>,
}

impl TestReport {
    /// Printable check results, validation first, upload outcome last
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.validation.lines();
        lines.push(String::new());
        match &self.upload_error {
            Some(err) => lines.push(
                format!("Upload failed, make sure the device has Internet: {err}")
                    .red()
                    .to_string(),
            ),
            None => lines.push("Upload succeeded.".to_string()),
        }
        lines
    }
}

/// Drives one semi-manual BugReport app test
pub struct BugReportAppTester<R, S> {
    device: DeviceController<R>,
    store: S,
    timing: Timing,
    paths: DevicePaths,
    output_dir: PathBuf,
    show_progress: bool,
}

impl<R: CommandRunner, S: StatusStore> BugReportAppTester<R, S> {
    pub fn new(device: DeviceController<R>, store: S, timing: Timing, paths: DevicePaths) -> Self {
        Self {
            device,
            store,
            timing,
            paths,
            output_dir: PathBuf::from("."),
            show_progress: true,
        }
    }

    /// Parent directory for the per-run data directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Hide the remaining-time countdown
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub async fn run(&self) -> Result<TestReport> {
        self.device.ensure_root().await?;

        if !self.device.pidof(DUMPSTATE_PROCESS).await?.is_empty() {
            return Err(Error::DumpstateRunning);
        }

        self.device.disable_connectivity().await?;
        self.kill_bugreport_app().await?;
        self.delete_all_bugreports().await?;

        // The app starts recording audio as soon as the activity opens
        self.device.start_activity(&self.paths.activity()).await?;
        print_manual_instructions();
        sleep(self.timing.settle).await;

        let record = self.store.active_record().await?;
        tracing::info!(id = record.id(), "found active bugreport");

        println!("\nWaiting until the bug report is collected.");
        self.wait_phase(&StatusWait::collection(&self.timing), record.id())
            .await?;
        println!("\nDumpstate (bugreport) completed (or failed).");

        let (validation, data_dir) = self.process_bugreport(&record).await?;

        self.device.enable_connectivity().await?;

        println!("\nWaiting for the bug report to be uploaded.");
        let upload_error = self
            .wait_phase(&StatusWait::upload(&self.timing), record.id())
            .await?;
        match &upload_error {
            Some(err) => println!("Failed to upload: {err}"),
            None => println!("\nBugreport was successfully uploaded."),
        }

        Ok(TestReport {
            record,
            validation,
            data_dir,
            upload_error,
        })
    }

    /// Wait for one phase; a failure is an error only when the phase is fatal
    async fn wait_phase(&self, wait: &StatusWait, record_id: i64) -> Result<Option<String>> {
        let mut waiter = LifecycleWaiter::new(&self.store, self.timing);
        if !self.show_progress {
            waiter = waiter.quiet();
        }

        match waiter.wait(wait, record_id).await {
            Ok(()) => Ok(None),
            Err(WaitError::Store(e)) => Err(e),
            Err(e) if wait.fatal => Err(Error::phase_failed(wait.phase, e.to_string())),
            Err(e) => {
                tracing::warn!(phase = wait.phase, error = %e, "status wait failed");
                Ok(Some(e.to_string()))
            }
        }
    }

    async fn kill_bugreport_app(&self) -> Result<()> {
        for pid in self.device.pidof(&self.paths.package).await? {
            println!("Killing bugreport app with pid {pid}");
            self.device.kill(pid).await?;
        }
        Ok(())
    }

    /// Remove old zips and status rows; failures here are tolerated
    async fn delete_all_bugreports(&self) -> Result<()> {
        println!("Deleting old bugreports from the device...");
        let zips = format!("{}/*.zip", self.paths.pending_dir);
        self.device.shell(&["rm", "-f", zips.as_str()]).await?;
        self.device
            .shell(&["sqlite3", self.paths.db_path.as_str(), "'delete from bugreports;'"])
            .await?;
        Ok(())
    }

    /// Pull the zip, validate its contents and keep local copies
    async fn process_bugreport(
        &self,
        record: &BugReportRecord,
    ) -> Result<(ValidationReport, PathBuf)> {
        println!(
            "Processing bugreport id={}, timestamp={}",
            record.id(),
            record.timestamp()
        );

        let data_dir = tempfile::Builder::new()
            .prefix(DATA_DIR_PREFIX)
            .suffix("zip")
            .tempdir_in(&self.output_dir)?
            .keep();
        let zip_path = data_dir.join("bugreport.zip");

        let output = self.device.pull(record.filepath(), &zip_path).await?;
        if !output.success() {
            println!("{}", output.stdout.join("\n"));
            if let Err(e) = std::fs::remove_dir_all(&data_dir) {
                tracing::warn!(
                    dir = %data_dir.display(),
                    error = %e,
                    "could not remove data dir"
                );
            }
            return Err(Error::PullFailed {
                what: "bugreport zip file".to_string(),
                exit_code: output.exit_code,
                output: output.stdout.join("\n"),
            });
        }
        println!("Zip file saved to {}", zip_path.display());

        let files = extract_important_files(File::open(&zip_path)?)?;
        let zip_size = std::fs::metadata(&zip_path)?.len();
        let zip_name = Path::new(record.filepath())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.filepath().to_string());
        let validation = ValidationReport::inspect(&files, &zip_name, zip_size);
        if validation.has_invalid() {
            tracing::warn!(zip = %zip_name, "bugreport contains invalid files");
        }

        write_files(&files, &data_dir)?;
        println!("Files have been written to {}", data_dir.display());

        Ok((validation, data_dir))
    }
}

fn print_manual_instructions() {
    println!("\n\n");
    println!("{}", "************** MANUAL **************".green());
    println!(
        "Please speak something to the device's microphone.\n\
         After that press *Submit* button and wait until the script finishes.\n"
    );
}

/// Print the consolidated report
pub fn print_final_results(report: &TestReport) {
    println!("\n\n");
    println!(
        "{}",
        "************** FINAL RESULTS *********************".green()
    );
    println!(
        "{} v{}",
        TOOL_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", report.lines().join("\n"));
    println!();
    println!("Please verify the contents of files.");
}
