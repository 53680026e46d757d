use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const POLL_LIMIT_ENV: &str = "POLL_LIMIT";
pub const CLI_TIMEOUT_ENV: &str = crate::scraper::CLI_TIMEOUT_ENV;
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// Paths served regardless of configuration.
const RESERVED_PATHS: [&str; 2] = ["/", "/version"];

/// Upper bound for `scrape.cli_timeout_secs`.
pub const MAX_CLI_TIMEOUT_SECS: f64 = 86_400.0;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Compact sinfo invocation: one JSON object per (node, partition).
pub const SINFO_FALLBACK_FORMAT: &str = r#"{"s": "%T", "mem": %m, "n": "%n", "l": "%O", "p": "%R", "fmem": "%e", "cstate": "%C", "w": %w}"#;
/// Compact squeue invocation: one JSON object per job.
pub const SQUEUE_FALLBACK_FORMAT: &str = r#"{"a": "%a", "id": %A, "end_time": "%e", "u": "%u", "state": "%T", "p": "%P", "cpu": %C, "mem": "%m", "array_id": "%K", "r": "%R"}"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scrape: ScrapeConfig,
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_path: String,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9092,
            metrics_path: "/metrics".into(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Minimum seconds between two runs of the same command.
    pub poll_limit_secs: f64,
    pub cli_timeout_secs: f64,
    /// Use the compact sinfo/squeue formats instead of `--json`.
    pub fallback: bool,
    pub licenses: bool,
    pub diagnostics: bool,
    pub accounts: bool,
    /// Command line overrides, split on whitespace.
    pub sinfo: Option<String>,
    pub squeue: Option<String>,
    pub lic: Option<String>,
    pub sdiag: Option<String>,
    pub sacctmgr: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            poll_limit_secs: 10.0,
            cli_timeout_secs: 10.0,
            fallback: false,
            licenses: false,
            diagnostics: false,
            accounts: false,
            sinfo: None,
            squeue: None,
            lic: None,
            sdiag: None,
            sacctmgr: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub enabled: bool,
    /// POST path for job tracers.
    pub path: String,
    /// Seconds a pushed trace stays live.
    pub sample_rate_secs: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/trace".into(),
            sample_rate_secs: 10,
        }
    }
}

fn split_args(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(String::from).collect()
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.cli_timeout_secs).unwrap_or(crate::scraper::DEFAULT_TIMEOUT)
    }

    pub fn sinfo_args(&self) -> Vec<String> {
        match (&self.sinfo, self.fallback) {
            (Some(cmd), _) => split_args(cmd),
            (None, true) => owned(&["sinfo", "-h", "-o", SINFO_FALLBACK_FORMAT]),
            (None, false) => owned(&["sinfo", "--json"]),
        }
    }

    pub fn squeue_args(&self) -> Vec<String> {
        match (&self.squeue, self.fallback) {
            (Some(cmd), _) => split_args(cmd),
            (None, true) => owned(&["squeue", "--states=all", "-h", "-r", "-o", SQUEUE_FALLBACK_FORMAT]),
            (None, false) => owned(&["squeue", "--json"]),
        }
    }

    pub fn lic_args(&self) -> Vec<String> {
        self.lic
            .as_deref()
            .map(split_args)
            .unwrap_or_else(|| owned(&["scontrol", "show", "lic", "--json"]))
    }

    pub fn sdiag_args(&self) -> Vec<String> {
        self.sdiag
            .as_deref()
            .map(split_args)
            .unwrap_or_else(|| owned(&["sdiag", "--json"]))
    }

    pub fn sacctmgr_args(&self) -> Vec<String> {
        self.sacctmgr.as_deref().map(split_args).unwrap_or_else(|| {
            owned(&[
                "sacctmgr",
                "show",
                "assoc",
                "format=User,Account,GrpCPU,GrpMem,GrpJobs,GrpSubmit",
                "--noheader",
                "--parsable2",
            ])
        })
    }
}

impl TraceConfig {
    pub fn sample_rate(&self) -> Duration {
        Duration::from_secs(self.sample_rate_secs)
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`); a missing default file means
    /// all defaults. Environment overrides are applied before validation.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_file(Path::new(&path), |key| std::env::var(key).ok()),
            Err(_) => {
                let path = Path::new("config.toml");
                if path.exists() {
                    Self::load_file(path, |key| std::env::var(key).ok())
                } else {
                    let mut config = AppConfig::default();
                    config.apply_env(|key| std::env::var(key).ok())?;
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Reads `path`, applies overrides from `lookup`, then validates.
    pub fn load_file(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path.display(), e))?;
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `POLL_LIMIT`, `CLI_TIMEOUT` and `LOGLEVEL` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(raw) = lookup(POLL_LIMIT_ENV) {
            self.scrape.poll_limit_secs = raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{} must be a number, got {:?}: {}", POLL_LIMIT_ENV, raw, e))?;
        }
        if let Some(raw) = lookup(CLI_TIMEOUT_ENV) {
            self.scrape.cli_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{} must be a number, got {:?}: {}", CLI_TIMEOUT_ENV, raw, e))?;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.server.log_level = level.trim().to_lowercase();
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.server.metrics_path.starts_with('/'),
            "server.metrics_path must start with '/', got {:?}",
            self.server.metrics_path
        );
        anyhow::ensure!(
            LOG_LEVELS.contains(&self.server.log_level.as_str()),
            "server.log_level must be one of {:?}, got {:?}",
            LOG_LEVELS,
            self.server.log_level
        );
        anyhow::ensure!(
            self.scrape.poll_limit_secs >= 0.0,
            "scrape.poll_limit_secs must be >= 0, got {}",
            self.scrape.poll_limit_secs
        );
        anyhow::ensure!(
            self.scrape.cli_timeout_secs > 0.0 && self.scrape.cli_timeout_secs <= MAX_CLI_TIMEOUT_SECS,
            "scrape.cli_timeout_secs must be in (0, {}], got {}",
            MAX_CLI_TIMEOUT_SECS,
            self.scrape.cli_timeout_secs
        );
        for (name, cmd) in [
            ("sinfo", &self.scrape.sinfo),
            ("squeue", &self.scrape.squeue),
            ("lic", &self.scrape.lic),
            ("sdiag", &self.scrape.sdiag),
            ("sacctmgr", &self.scrape.sacctmgr),
        ] {
            if let Some(cmd) = cmd {
                anyhow::ensure!(!cmd.trim().is_empty(), "scrape.{} must be non-empty", name);
            }
        }
        anyhow::ensure!(
            self.trace.sample_rate_secs > 0,
            "trace.sample_rate_secs must be > 0, got {}",
            self.trace.sample_rate_secs
        );
        anyhow::ensure!(
            self.trace.path.starts_with('/'),
            "trace.path must start with '/', got {:?}",
            self.trace.path
        );
        anyhow::ensure!(
            !self.trace.enabled || self.trace.path != self.server.metrics_path,
            "trace.path must differ from server.metrics_path"
        );
        for path in [&self.server.metrics_path, &self.trace.path] {
            anyhow::ensure!(
                !RESERVED_PATHS.contains(&path.as_str()),
                "{:?} is reserved",
                path
            );
        }
        Ok(())
    }
}
