//! Counter-style metrics, kept deliberately minimal: an in-process counter
//! map rather than a full exporter, so the pipeline's upload/return counters
//! have somewhere real to land and tests can assert on them directly.

use std::collections::HashMap;
use std::sync::Mutex;

pub trait Metrics: Send + Sync {
    fn incr(&self, name: &str, labels: &[(&str, &str)]);
}

#[derive(Default)]
pub struct InMemoryMetrics {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = Self::key(name, labels);
        *self.counters.lock().unwrap().get(&key).unwrap_or(&0)
    }

    fn key(name: &str, labels: &[(&str, &str)]) -> String {
        let mut key = name.to_string();
        for (k, v) in labels {
            key.push('{');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
            key.push('}');
        }
        key
    }
}

impl Metrics for InMemoryMetrics {
    fn incr(&self, name: &str, labels: &[(&str, &str)]) {
        let key = Self::key(name, labels);
        *self.counters.lock().unwrap().entry(key).or_insert(0) += 1;
    }
}
