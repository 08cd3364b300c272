//! Waiting for a bugreport to reach a lifecycle status
//!
//! The waiter ticks once per `poll_tick` so the operator sees a live
//! countdown, but only pulls the status database every `check_interval`.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

use super::record::Status;
use super::store::StatusStore;
use crate::common::{Error, Timing};

/// Why a status wait did not reach its target
#[derive(Error, Debug)]
pub enum WaitError {
    #[error("Bugreport with id {id} not found")]
    NotFound { id: i64 },

    #[error("Expected status to be {expected}, but got {actual}. Message: {message}")]
    UnexpectedStatus {
        expected: Status,
        actual: Status,
        message: String,
    },

    #[error("Timeout, status={}", last_status(.last))]
    Timeout { last: Option<Status> },

    /// The store itself failed; never a reportable outcome
    #[error(transparent)]
    Store(#[from] Error),
}

fn last_status(last: &Option<Status>) -> &'static str {
    last.map_or("NOT_OBSERVED", Status::as_str)
}

/// One lifecycle phase to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWait {
    /// Human-readable phase name used in fatal errors
    pub phase: &'static str,
    pub target: Status,
    pub deadline: Duration,
    /// Statuses that mean "still in progress"
    pub allowed: Vec<Status>,
    /// Whether a failed wait aborts the run
    pub fatal: bool,
}

impl StatusWait {
    /// Dumpstate writes the bugreport zip
    pub fn collection(timing: &Timing) -> Self {
        Self {
            phase: "Dumpstate (bugreport)",
            target: Status::UploadPending,
            deadline: timing.collection_deadline,
            allowed: vec![Status::WritePending],
            fatal: true,
        }
    }

    /// The app uploads the finished bugreport
    pub fn upload(timing: &Timing) -> Self {
        Self {
            phase: "Upload",
            target: Status::UploadSuccess,
            deadline: timing.upload_deadline,
            allowed: vec![Status::UploadPending],
            fatal: false,
        }
    }
}

/// Polls a [`StatusStore`] until a record reaches a status
pub struct LifecycleWaiter<'a, S: ?Sized> {
    store: &'a S,
    timing: Timing,
    show_progress: bool,
}

impl<'a, S: StatusStore + ?Sized> LifecycleWaiter<'a, S> {
    pub fn new(store: &'a S, timing: Timing) -> Self {
        Self {
            store,
            timing,
            show_progress: true,
        }
    }

    /// Suppress the remaining-time line
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub async fn wait(&self, wait: &StatusWait, record_id: i64) -> Result<(), WaitError> {
        self.await_status(wait.target, wait.deadline, record_id, &wait.allowed)
            .await
    }

    /// Wait until record `record_id` reaches `target`
    ///
    /// Fails on the first query that finds the record missing or in a status
    /// that is neither `target` nor in `allowed`.
    pub async fn await_status(
        &self,
        target: Status,
        deadline: Duration,
        record_id: i64,
        allowed: &[Status],
    ) -> Result<(), WaitError> {
        let start = Instant::now();
        let timeout_at = start + deadline;
        let mut last_fetch_at = start;
        let mut last_seen: Option<Status> = None;
        let progress = self.progress_bar();

        let result = loop {
            let now = Instant::now();
            if now >= timeout_at {
                break Err(WaitError::Timeout { last: last_seen });
            }
            let remaining = timeout_at - now;
            progress.set_message(format!(
                "Remaining time {:.0} seconds",
                remaining.as_secs_f64()
            ));

            sleep(self.timing.poll_tick).await;
            if last_fetch_at.elapsed() < self.timing.check_interval {
                continue;
            }
            last_fetch_at = Instant::now();

            let records = match self.store.records().await {
                Ok(records) => records,
                Err(e) => break Err(WaitError::Store(e)),
            };
            let Some(record) = records.into_iter().find(|r| r.id() == record_id) else {
                break Err(WaitError::NotFound { id: record_id });
            };

            let status = record.status();
            last_seen = Some(status);
            tracing::debug!(record_id, %status, "polled bugreport status");

            if allowed.contains(&status) {
                continue;
            }
            if status == target {
                break Ok(());
            }
            break Err(WaitError::UnexpectedStatus {
                expected: target,
                actual: status,
                message: record.status_message().to_string(),
            });
        };

        // keep the last countdown line on the terminal
        progress.finish();
        result
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar
    }
}
