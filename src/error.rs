// Error taxonomy: source unavailable (ScrapeError), schema mismatch (ParseError),
// push validation (TraceError). Row-level problems never surface as errors; they
// bump the domain error counter instead.

use std::time::Duration;

/// The external command could not produce usable output.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("need at least 1 args")]
    EmptyArgs,
    #[error("failed to start `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{cmd}` killed after {timeout:?} timeout")]
    Timeout { cmd: String, timeout: Duration },
    #[error("`{cmd}` wait failed: {source}")]
    Wait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{cmd}` exited with {status}")]
    ExitStatus { cmd: String, status: std::process::ExitStatus },
    #[error("cmd failed with {stderr}")]
    Stderr { cmd: String, stderr: String },
    /// Used by in-process sources (fixtures, test doubles).
    #[error("{0}")]
    Source(String),
}

/// The scraped bytes did not match any schema we understand.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response missing `{0}` section")]
    MissingSection(&'static str),
    #[error("upstream api error: {0}")]
    Upstream(String),
    #[error("only the {0} plugin is supported")]
    UnsupportedPlugin(&'static str),
    #[error("{0}")]
    Schema(String),
}

/// Failure decoding a `{set, infinite, number}` tagged count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TaggedNumberError {
    #[error("tagged number is unset")]
    Unset,
    #[error("tagged number is infinite")]
    Infinite,
}

/// A job row whose id cannot be used as a correlation key.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum JobIdError {
    #[error(transparent)]
    Tagged(#[from] TaggedNumberError),
    #[error("job id {0} is not a positive integer")]
    Invalid(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mem string {input} doesn't match regex {pattern} nor is a float")]
pub struct MemParseError {
    pub input: String,
    pub pattern: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("job id unset")]
    JobIdUnset,
}

/// What a domain fetch returns when the whole snapshot is unusable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
