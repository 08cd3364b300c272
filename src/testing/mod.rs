//! Test doubles for the device seams
//!
//! [`ScriptedRunner`] stands in for adb and [`ScriptedStore`] for the
//! on-device status database, so the lifecycle and orchestration logic can
//! be exercised without hardware.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::bugreport::{BugReportRecord, StatusStore};
use crate::common::{Error, Result};
use crate::device::{CommandOutput, CommandRunner};

type Handler = dyn Fn(&[&str]) -> CommandOutput + Send + Sync;

/// A [`CommandRunner`] answering every call from a closure and recording it
pub struct ScriptedRunner {
    handler: Box<Handler>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&[&str]) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every argument list received so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// How many calls had exactly these arguments
    pub fn count(&self, args: &[&str]) -> usize {
        self.calls().iter().filter(|call| *call == args).count()
    }
}

impl fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(args.iter().map(|s| s.to_string()).collect());
        Ok((self.handler)(args))
    }
}

/// A [`StatusStore`] replaying a fixed sequence of snapshots
///
/// Query `n` returns snapshot `n`; once the script runs out the last
/// snapshot repeats.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    snapshots: Vec<Vec<BugReportRecord>>,
    queries: AtomicUsize,
    fail: bool,
}

impl ScriptedStore {
    pub fn new(snapshots: Vec<Vec<BugReportRecord>>) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }

    /// A store whose every query fails like an unreachable device
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for ScriptedStore {
    async fn records(&self) -> Result<Vec<BugReportRecord>> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::PullFailed {
                what: "bugreport.db".to_string(),
                exit_code: 1,
                output: "adb: device offline".to_string(),
            });
        }
        Ok(self
            .snapshots
            .get(n)
            .or_else(|| self.snapshots.last())
            .cloned()
            .unwrap_or_default())
    }
}
