// Shared decoding helpers for slurm CLI output

pub mod accounts;
pub mod diags;
pub mod jobs;
pub mod licenses;
pub mod nodes;

use std::sync::LazyLock;

use prometheus::IntCounter;
use regex::Regex;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{MemParseError, ParseError, TaggedNumberError};

/// Turns one raw snapshot into records. Row-level problems bump `errors`
/// and are skipped; snapshot-level problems are returned.
pub type ParseFn<T> = fn(&[u8], &IntCounter) -> Result<Vec<T>, ParseError>;

/// Capability that must be advertised before diagnostics are trusted.
pub const DATA_PARSER: &str = "data_parser";

const MEM_PATTERN: &str = r"^(?P<num>([0-9]*[.])?[0-9]+)(?P<memunit>G|M|T)$";

static MEM_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(MEM_PATTERN).ok());

/// A count that newer slurm versions wrap as `{set, infinite, number}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TaggedNumber {
    Bare(f64),
    Tagged {
        set: bool,
        #[serde(default)]
        infinite: bool,
        #[serde(default)]
        number: f64,
    },
}

impl Default for TaggedNumber {
    fn default() -> Self {
        TaggedNumber::Bare(0.0)
    }
}

impl TaggedNumber {
    pub fn value(&self) -> Result<f64, TaggedNumberError> {
        match *self {
            TaggedNumber::Bare(n) => Ok(n),
            TaggedNumber::Tagged { set: false, .. } => Err(TaggedNumberError::Unset),
            TaggedNumber::Tagged { infinite: true, .. } => Err(TaggedNumberError::Infinite),
            TaggedNumber::Tagged { number, .. } => Ok(number),
        }
    }

    /// Unset and infinite both read as 0.
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

/// `state` is a plain string on older releases and a list on newer ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StateField {
    One(String),
    Many(Vec<String>),
}

impl Default for StateField {
    fn default() -> Self {
        StateField::One(String::new())
    }
}

impl StateField {
    pub fn joined(self) -> String {
        match self {
            StateField::One(s) => s,
            StateField::Many(states) => states.join(crate::models::STATE_SEPARATOR),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub plugins: Option<Value>,
    #[serde(default)]
    pub plugin: Option<Value>,
}

impl Meta {
    /// True when either `meta.plugins` or `meta.plugin` mentions `capability`,
    /// as a key or as a string value.
    pub fn has_capability(&self, capability: &str) -> bool {
        [&self.plugins, &self.plugin]
            .into_iter()
            .flatten()
            .any(|v| mentions(v, capability))
    }
}

fn mentions(value: &Value, capability: &str) -> bool {
    match value {
        Value::String(s) => s.contains(capability),
        Value::Array(items) => items.iter().any(|v| mentions(v, capability)),
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.contains(capability) || v.as_str().is_some_and(|s| s.contains(capability))),
        _ => false,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiError {
    Message(String),
    Detail {
        #[serde(default)]
        description: String,
        #[serde(default)]
        error: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Message(m) => f.write_str(m),
            ApiError::Detail { description, error } if description.is_empty() => f.write_str(error),
            ApiError::Detail { description, .. } => f.write_str(description),
        }
    }
}

/// Top level of every `--json` response: `meta`, `errors` and one data section.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(flatten)]
    sections: Map<String, Value>,
}

impl Envelope {
    /// Decodes the envelope and fails on a missing `meta` or any upstream error.
    pub fn decode(bytes: &[u8]) -> Result<Self, ParseError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.meta.is_none() {
            return Err(ParseError::MissingSection("meta"));
        }
        if let Some(first) = envelope.errors.first() {
            for e in &envelope.errors {
                tracing::error!(error = %e, "api error response");
            }
            return Err(ParseError::Upstream(first.to_string()));
        }
        Ok(envelope)
    }

    pub fn has_section(&self, key: &str) -> bool {
        self.sections.contains_key(key)
    }

    pub fn take(&mut self, key: &'static str) -> Result<Value, ParseError> {
        self.sections
            .remove(key)
            .ok_or(ParseError::MissingSection(key))
    }

    pub fn capability(&self, capability: &str) -> bool {
        self.meta.as_ref().is_some_and(|m| m.has_capability(capability))
    }
}

/// Decodes each element of a JSON array on its own; bad rows are counted and dropped.
pub fn decode_rows<R: DeserializeOwned>(
    section: Value,
    domain: &'static str,
    errors: &IntCounter,
) -> Result<Vec<R>, ParseError> {
    let Value::Array(rows) = section else {
        return Err(ParseError::Schema(format!("{domain} section is not a list")));
    };
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        match serde_json::from_value(row) {
            Ok(r) => out.push(r),
            Err(e) => {
                errors.inc();
                tracing::warn!(error = %e, domain, row = i, "skipping malformed row");
            }
        }
    }
    Ok(out)
}

/// Non-empty lines of a newline-delimited text snapshot, with their index.
pub fn lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    bytes
        .split(|b| *b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|l| !l.is_empty())
        .enumerate()
}

/// Converts a slurm memory string ("12G", "512M", "1.5T" or a bare number) to bytes.
/// Bare numbers are returned unchanged.
pub fn mem_to_float(mem: &str) -> Result<f64, MemParseError> {
    if let Ok(n) = mem.parse::<f64>() {
        return Ok(n);
    }
    let err = || MemParseError {
        input: mem.to_string(),
        pattern: MEM_PATTERN,
    };
    let caps = MEM_RE
        .as_ref()
        .and_then(|re| re.captures(mem))
        .ok_or_else(err)?;
    let num: f64 = caps["num"].parse().map_err(|_| err())?;
    let unit = match &caps["memunit"] {
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        _ => return Err(err()),
    };
    Ok(num * unit)
}

/// Same as [`mem_to_float`] but reports failures with the -1 sentinel.
pub fn mem_to_float_or_sentinel(mem: &str) -> (f64, Option<MemParseError>) {
    match mem_to_float(mem) {
        Ok(v) => (v, None),
        Err(e) => (-1.0, Some(e)),
    }
}

const NULL_TIMES: [&str; 2] = ["N/A", "NONE"];
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a `%e`-style timestamp to unix seconds; "N/A" and "NONE" map to 0.
pub fn parse_nullable_time(s: &str) -> Result<f64, chrono::ParseError> {
    if NULL_TIMES.contains(&s) {
        return Ok(0.0);
    }
    let t = chrono::NaiveDateTime::parse_from_str(s, TIME_FORMAT)?;
    Ok(t.and_utc().timestamp() as f64)
}

pub fn deserialize_nullable_time<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let s = String::deserialize(d)?;
    parse_nullable_time(&s).map_err(serde::de::Error::custom)
}

/// A float that sinfo may print as "N/A".
pub fn deserialize_nullable_float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) if s == "N/A" => Ok(0.0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(v: Value) -> TaggedNumber {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn tagged_number_variants() {
        assert_eq!(tagged(json!(7)).value(), Ok(7.0));
        assert_eq!(
            tagged(json!({"set": true, "infinite": false, "number": 42})).value(),
            Ok(42.0)
        );
        assert_eq!(
            tagged(json!({"set": false, "infinite": false, "number": 42})).value(),
            Err(TaggedNumberError::Unset)
        );
        assert_eq!(
            tagged(json!({"set": true, "infinite": true, "number": 0})).value(),
            Err(TaggedNumberError::Infinite)
        );
        assert_eq!(tagged(json!({"set": false})).or_zero(), 0.0);
    }

    #[test]
    fn capability_under_either_key() {
        let plugins: Meta =
            serde_json::from_value(json!({"plugins": {"data_parser": "data_parser/v0.0.39"}})).unwrap();
        let plugin: Meta =
            serde_json::from_value(json!({"plugin": {"type": "openapi/slurmctld", "data_parser": "data_parser/v0.0.40"}}))
                .unwrap();
        let neither: Meta =
            serde_json::from_value(json!({"plugins": {"accounting_storage": "as/slurmdbd"}})).unwrap();
        assert!(plugins.has_capability(DATA_PARSER));
        assert!(plugin.has_capability(DATA_PARSER));
        assert!(!neither.has_capability(DATA_PARSER));
        assert!(!Meta::default().has_capability(DATA_PARSER));
    }

    #[test]
    fn mem_units() {
        assert_eq!(mem_to_float("12M"), Ok(1.2e7));
        assert_eq!(mem_to_float("12G"), Ok(1.2e10));
        assert_eq!(mem_to_float("12T"), Ok(1.2e13));
        assert_eq!(mem_to_float("1.5G"), Ok(1.5e9));
        assert_eq!(mem_to_float("0"), Ok(0.0));
        let (v, err) = mem_to_float_or_sentinel("12X");
        assert_eq!(v, -1.0);
        assert!(err.unwrap().to_string().contains("12X"));
    }

    #[test]
    fn nullable_times() {
        assert_eq!(parse_nullable_time("N/A").unwrap(), 0.0);
        assert_eq!(parse_nullable_time("NONE").unwrap(), 0.0);
        assert_eq!(parse_nullable_time("1970-01-01T00:01:40").unwrap(), 100.0);
        assert!(parse_nullable_time("yesterday").is_err());
    }

    #[test]
    fn envelope_errors_abort() {
        let body = br#"{"meta": {}, "errors": [{"description": "slurmctld down", "error_number": 1}], "nodes": []}"#;
        match Envelope::decode(body) {
            Err(ParseError::Upstream(msg)) => assert_eq!(msg, "slurmctld down"),
            other => panic!("unexpected {other:?}"),
        }
        let no_meta = br#"{"nodes": []}"#;
        assert!(matches!(
            Envelope::decode(no_meta),
            Err(ParseError::MissingSection("meta"))
        ));
    }

    #[test]
    fn blank_lines_skipped() {
        let input = b"\n  a \n\nb\n";
        let got: Vec<_> = lines(input).collect();
        assert_eq!(got, vec![(0, &b"a"[..]), (1, &b"b"[..])]);
    }
}
