//! Device-level operations built on a [`CommandRunner`]

use std::path::Path;

use super::runner::{CommandOutput, CommandRunner};
use crate::common::{Error, Result};

/// Directory only listable when adbd runs as root
const PRIVILEGED_DIR: &str = "/data/user/0";

const AIRPLANE_MODE_ACTION: &str = "android.intent.action.AIRPLANE_MODE";

/// High-level device control used by the tester
#[derive(Debug, Clone)]
pub struct DeviceController<R> {
    runner: R,
}

impl<R: CommandRunner> DeviceController<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a command, returning its exit code and stdout lines
    pub async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run(args).await
    }

    /// Run a command that must succeed
    pub async fn run_checked(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = self.runner.run(args).await?;
        if !output.success() {
            return Err(Error::command_failed(args, output.exit_code));
        }
        Ok(output.stdout)
    }

    /// Run `shell <args>` on the device
    pub async fn shell(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.run(&full).await
    }

    async fn shell_checked(&self, args: &[&str]) -> Result<Vec<String>> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.run_checked(&full).await
    }

    pub async fn is_root(&self) -> Result<bool> {
        Ok(self.shell(&["ls", PRIVILEGED_DIR]).await?.success())
    }

    /// Restart adbd as root unless it already is
    pub async fn ensure_root(&self) -> Result<()> {
        if !self.is_root().await? {
            println!("adb is not running as root. Running 'adb root'.");
            self.run_checked(&["root"]).await?;
        }
        Ok(())
    }

    /// PIDs of processes named `name`; empty when none is running
    pub async fn pidof(&self, name: &str) -> Result<Vec<u32>> {
        let output = self.shell(&["pidof", name]).await?;
        let joined = output.stdout.join(" ");
        let pids = joined
            .split_whitespace()
            .filter_map(|raw| match raw.parse::<u32>() {
                Ok(pid) => Some(pid),
                Err(_) => {
                    tracing::warn!(name, raw, "ignoring unparseable pidof output");
                    None
                }
            })
            .collect();
        Ok(pids)
    }

    pub async fn kill(&self, pid: u32) -> Result<()> {
        let pid = pid.to_string();
        self.shell(&["kill", pid.as_str()]).await?;
        Ok(())
    }

    /// Turn wifi off and airplane mode on
    ///
    /// All three commands are needed; on some devices airplane mode does not
    /// take effect otherwise.
    pub async fn disable_connectivity(&self) -> Result<()> {
        println!("\nDisabling the Internet.");
        self.shell_checked(&["svc", "wifi", "disable"]).await?;
        self.shell_checked(&["settings", "put", "global", "airplane_mode_on", "1"])
            .await?;
        self.shell_checked(&[
            "am",
            "broadcast",
            "-a",
            AIRPLANE_MODE_ACTION,
            "--ez",
            "state",
            "true",
        ])
        .await?;
        Ok(())
    }

    /// Turn airplane mode off and wifi on
    pub async fn enable_connectivity(&self) -> Result<()> {
        println!("\nEnabling the Internet.");
        self.shell_checked(&["settings", "put", "global", "airplane_mode_on", "0"])
            .await?;
        self.shell_checked(&[
            "am",
            "broadcast",
            "-a",
            AIRPLANE_MODE_ACTION,
            "--ez",
            "state",
            "false",
        ])
        .await?;
        self.shell_checked(&["svc", "wifi", "enable"]).await?;
        Ok(())
    }

    /// Copy a device path to the host
    pub async fn pull(&self, remote: &str, local: &Path) -> Result<CommandOutput> {
        let local = local.to_string_lossy();
        self.run(&["pull", remote, &*local]).await
    }

    pub async fn start_activity(&self, component: &str) -> Result<()> {
        self.shell_checked(&["am", "start", component]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    #[tokio::test]
    async fn test_ensure_root_skips_restart_when_already_root() {
        let runner = ScriptedRunner::new(|_| CommandOutput::new(0, "com.example\n"));
        let device = DeviceController::new(runner);

        device.ensure_root().await.unwrap();

        assert_eq!(
            device.runner().calls(),
            vec![vec!["shell", "ls", "/data/user/0"]]
        );
    }

    #[tokio::test]
    async fn test_ensure_root_restarts_once() {
        let runner = ScriptedRunner::new(|args| match args {
            ["shell", "ls", ..] => CommandOutput::new(1, ""),
            _ => CommandOutput::new(0, "restarting adbd as root\n"),
        });
        let device = DeviceController::new(runner);

        device.ensure_root().await.unwrap();

        assert_eq!(device.runner().count(&["root"]), 1);
    }

    #[tokio::test]
    async fn test_failed_root_is_fatal() {
        let runner = ScriptedRunner::new(|_| CommandOutput::new(1, ""));
        let device = DeviceController::new(runner);

        let err = device.ensure_root().await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { exit_code: 1, .. }));
    }

    #[tokio::test]
    async fn test_pidof_parses_multiple_lines() {
        let runner = ScriptedRunner::new(|_| CommandOutput::new(0, "123 456\r\n789\r\n"));
        let device = DeviceController::new(runner);

        assert_eq!(device.pidof("dumpstate").await.unwrap(), vec![123, 456, 789]);
    }

    #[tokio::test]
    async fn test_pidof_nothing_running() {
        let runner = ScriptedRunner::new(|_| CommandOutput::new(1, ""));
        let device = DeviceController::new(runner);

        assert!(device.pidof("dumpstate").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disable_connectivity_issues_all_three_commands() {
        let runner = ScriptedRunner::new(|_| CommandOutput::new(0, ""));
        let device = DeviceController::new(runner);

        device.disable_connectivity().await.unwrap();

        let calls = device.runner().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], vec!["shell", "svc", "wifi", "disable"]);
        assert_eq!(
            calls[1],
            vec!["shell", "settings", "put", "global", "airplane_mode_on", "1"]
        );
        assert_eq!(calls[2].last().map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_enable_connectivity_stops_at_first_failure() {
        let runner = ScriptedRunner::new(|args| match args {
            ["shell", "am", ..] => CommandOutput::new(255, ""),
            _ => CommandOutput::new(0, ""),
        });
        let device = DeviceController::new(runner);

        assert!(device.enable_connectivity().await.is_err());
        assert_eq!(device.runner().count(&["shell", "svc", "wifi", "enable"]), 0);
    }
}
