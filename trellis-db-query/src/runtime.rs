//! Per-operator runtime information.
//!
//! A free-form attribute bag for metrics recorded during result computation
//! (e.g. the time spent building the edge map vs. computing the hull).
//! Read back by callers after the call completes.

use serde_json::{Map, Value};
use std::sync::Mutex;

/// Free-form metrics bag, keyed by attribute name.
#[derive(Default)]
pub struct RuntimeInfo {
    details: Mutex<Map<String, Value>>,
}

impl RuntimeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attribute, replacing any previous value under `key`.
    pub fn add_detail(&self, key: &str, value: impl Into<Value>) {
        if let Ok(mut details) = self.details.lock() {
            details.insert(key.to_string(), value.into());
        }
    }

    /// Snapshot of all recorded attributes.
    pub fn details(&self) -> Map<String, Value> {
        self.details.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Look up a single attribute.
    pub fn detail(&self, key: &str) -> Option<Value> {
        self.details
            .lock()
            .ok()
            .and_then(|d| d.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_read_details() {
        let info = RuntimeInfo::new();
        info.add_detail("Hull time", 12.5);
        info.add_detail("Hull time", 13.0);
        info.add_detail("rows", 42);

        assert_eq!(info.detail("Hull time"), Some(Value::from(13.0)));
        assert_eq!(info.details().len(), 2);
        assert_eq!(info.detail("missing"), None);
    }
}
