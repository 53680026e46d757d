// Turns domain snapshots into prometheus samples

pub mod accounts;
pub mod diags;
pub mod jobs;
pub mod licenses;
pub mod nodes;
pub mod trace;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use prometheus::{Encoder, GaugeVec, IntCounter, Opts, Registry, TextEncoder};

/// One gauge value with its label pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Sample {
    pub fn gauge(name: &'static str, help: &'static str, value: f64) -> Self {
        Self {
            name,
            help,
            labels: Vec::new(),
            value,
        }
    }

    pub fn label(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((name, value.into()));
        self
    }

    pub fn label_value(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Scrape duration gauge in milliseconds.
pub(crate) fn duration_sample(name: &'static str, help: &'static str, d: Duration) -> Sample {
    Sample::gauge(name, help, d.as_millis() as f64)
}

/// Encodes `samples` and `counters` in the prometheus text format. A fresh
/// registry is built per call; counters keep their values across calls.
pub fn render(samples: &[Sample], counters: &[IntCounter]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let mut gauges: HashMap<&'static str, GaugeVec> = HashMap::new();
    for s in samples {
        let vec = match gauges.entry(s.name) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let names: Vec<&str> = s.labels.iter().map(|(k, _)| *k).collect();
                let vec = GaugeVec::new(Opts::new(s.name, s.help), &names)?;
                registry.register(Box::new(vec.clone()))?;
                e.insert(vec)
            }
        };
        let values: Vec<&str> = s.labels.iter().map(|(_, v)| v.as_str()).collect();
        vec.get_metric_with_label_values(&values)?.set(s.value);
    }
    for c in counters {
        registry.register(Box::new(c.clone()))?;
    }
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
