// Subprocess scraper with a hard timeout

use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::instrument;

use super::ByteScraper;
use crate::error::ScrapeError;

pub const CLI_TIMEOUT_ENV: &str = "CLI_TIMEOUT";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Seconds as a positive float; `None` when unparsable or out of `Duration` range.
pub fn parse_timeout(raw: &str) -> Option<Duration> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Runs a fixed command line and returns its stdout. Any stderr output counts
/// as failure, even with a zero exit code.
#[derive(Debug)]
pub struct CliScraper {
    args: Vec<String>,
    timeout: Duration,
    duration: Mutex<Duration>,
}

impl CliScraper {
    /// Timeout comes from `CLI_TIMEOUT` (seconds) when set, else 10s.
    pub fn new(args: Vec<String>) -> Self {
        let timeout = match std::env::var(CLI_TIMEOUT_ENV) {
            Ok(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                tracing::error!(value = %raw, "`CLI_TIMEOUT` env var parse error");
                DEFAULT_TIMEOUT
            }),
            Err(_) => DEFAULT_TIMEOUT,
        };
        Self::with_timeout(args, timeout)
    }

    pub fn with_timeout(args: Vec<String>, timeout: Duration) -> Self {
        Self {
            args,
            timeout,
            duration: Mutex::new(Duration::ZERO),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command_line(&self) -> String {
        self.args.join(" ")
    }

    async fn run(&self) -> Result<Vec<u8>, ScrapeError> {
        let (program, rest) = self.args.split_first().ok_or(ScrapeError::EmptyArgs)?;
        let cmd = self.command_line();
        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScrapeError::Spawn {
                cmd: cmd.clone(),
                source,
            })?;
        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(ScrapeError::Wait { cmd, source }),
            Err(_) => {
                tracing::error!(cmd = %cmd, timeout = ?self.timeout, "killed cmd after timeout");
                return Err(ScrapeError::Timeout {
                    cmd,
                    timeout: self.timeout,
                });
            }
        };
        if !output.status.success() {
            return Err(ScrapeError::ExitStatus {
                cmd,
                status: output.status,
            });
        }
        if !output.stderr.is_empty() {
            return Err(ScrapeError::Stderr {
                cmd,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl ByteScraper for CliScraper {
    #[instrument(skip(self), fields(scraper = "cli", cmd = %self.command_line()))]
    async fn fetch_raw_bytes(&self) -> Result<Vec<u8>, ScrapeError> {
        let start = Instant::now();
        let result = self.run().await;
        let elapsed = start.elapsed();
        *self.duration.lock().unwrap_or_else(PoisonError::into_inner) = elapsed;
        tracing::debug!(elapsed = ?elapsed, ok = result.is_ok(), "cmd finished");
        result
    }

    fn duration(&self) -> Duration {
        *self.duration.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
