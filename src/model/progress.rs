//! Progress event type emitted by the [`crate::progress`] tracker.

use std::collections::HashMap;

/// One progress update emitted during an extraction (`spec.md` §3, §4.12).
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase the event was emitted from (e.g. `"field_extraction"`).
    pub phase: String,
    /// Human-readable message.
    pub message: String,
    /// Overall completion percent, clamped to `[0, 100]`.
    pub percent: u8,
    /// Unix timestamp, milliseconds, when the event was constructed.
    pub timestamp: i64,
    /// Free-form structured attributes (e.g. `cause: "cancelled"`).
    pub attrs: HashMap<String, String>,
}

impl ProgressEvent {
    /// Creates a new progress event with no extra attributes.
    #[must_use]
    pub fn new(phase: impl Into<String>, message: impl Into<String>, percent: u8, timestamp: i64) -> Self {
        Self {
            phase: phase.into(),
            message: message.into(),
            percent: percent.min(100),
            timestamp,
            attrs: HashMap::new(),
        }
    }

    /// Attaches a structured attribute and returns the event.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamped() {
        let event = ProgressEvent::new("init", "starting", 150, 0);
        assert_eq!(event.percent, 100);
    }

    #[test]
    fn test_with_attr() {
        let event = ProgressEvent::new("error", "failed", 0, 0).with_attr("cause", "cancelled");
        assert_eq!(event.attrs.get("cause"), Some(&"cancelled".to_string()));
    }
}
