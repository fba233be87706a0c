//! Core data types for action verbs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pagepilot_core_types::{TabId, WindowId};
use perceiver_structural::LiveDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tunables for the executor.
#[derive(Clone, Debug)]
pub struct ExecutorOptions {
    /// Pause after scrolling an element into view, before acting on it
    pub settle_delay: Duration,

    /// Interval between predicate/element polls in `wait`
    pub poll_interval: Duration,

    /// Default timeout for `wait` with a predicate or element description
    pub wait_timeout: Duration,

    /// Page-load timeout passed to the orchestrator after navigating
    pub load_timeout: Duration,

    /// Maximum number of retained action records
    pub history_capacity: usize,

    /// Search URL template; `{query}` is replaced with the encoded query
    pub search_url_template: String,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(300),
            poll_interval: Duration::from_millis(100),
            wait_timeout: Duration::from_secs(10),
            load_timeout: Duration::from_secs(15),
            history_capacity: 100,
            search_url_template: "https://www.google.com/search?q={query}".to_string(),
        }
    }
}

/// One entry of the action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Verb name
    pub action: String,

    /// Verb argument as given (description, url, query, ...)
    pub target: String,

    pub success: bool,

    /// Verb outcome on success
    pub result: Option<Value>,

    /// Error message on failure
    pub error: Option<String>,

    pub timestamp_ms: i64,

    /// URL of the acting document when the verb finished
    #[serde(rename = "documentURL")]
    pub document_url: String,
}

/// Bounded FIFO of action records; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    records: VecDeque<ActionRecord>,
    capacity: usize,
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: ActionRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&ActionRecord> {
        self.records.back()
    }

    /// Records oldest first.
    pub fn snapshot(&self) -> Vec<ActionRecord> {
        self.records.iter().cloned().collect()
    }
}

/// Scroll direction for the `scroll` verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

pub type DocumentPredicate = Arc<dyn Fn(&LiveDocument) -> bool + Send + Sync>;

/// What `wait` waits for.
#[derive(Clone)]
pub enum WaitTarget {
    /// Fixed pause
    Duration(Duration),

    /// Predicate over the document, polled until true
    Predicate(DocumentPredicate),

    /// Element description, polled until it resolves to a visible element
    Element(String),
}

impl WaitTarget {
    pub fn predicate(check: impl Fn(&LiveDocument) -> bool + Send + Sync + 'static) -> Self {
        WaitTarget::Predicate(Arc::new(check))
    }
}

impl fmt::Debug for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTarget::Duration(duration) => f.debug_tuple("Duration").field(duration).finish(),
            WaitTarget::Predicate(_) => f.write_str("Predicate(..)"),
            WaitTarget::Element(description) => f.debug_tuple("Element").field(description).finish(),
        }
    }
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTarget::Duration(duration) => write!(f, "{}ms", duration.as_millis()),
            WaitTarget::Predicate(_) => f.write_str("predicate"),
            WaitTarget::Element(description) => write!(f, "element `{description}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOutcome {
    pub waited_ms: u64,
}

/// One field of a `fill_form` call: a natural-language field description and
/// the value to put into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub field: String,
    pub value: String,
}

impl FormField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// How a form field was filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMethod {
    Typed,
    Selected,
    Checked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledField {
    pub field: String,
    pub selector: String,
    pub method: FillMethod,
    /// Value as stored by the document (the option value for selects)
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateOutcome {
    pub tab_id: TabId,
    pub window_id: WindowId,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize) -> ActionRecord {
        ActionRecord {
            action: "click".into(),
            target: format!("button {index}"),
            success: true,
            result: None,
            error: None,
            timestamp_ms: index as i64,
            document_url: "about:blank".into(),
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = ActionHistory::new(3);
        for index in 0..5 {
            history.push(record(index));
        }
        assert_eq!(history.len(), 3);
        let targets: Vec<String> = history.snapshot().into_iter().map(|r| r.target).collect();
        assert_eq!(targets, ["button 2", "button 3", "button 4"]);
        assert_eq!(history.last().map(|r| r.timestamp_ms), Some(4));
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(record(7)).unwrap();
        assert_eq!(json["timestampMs"], 7);
        assert_eq!(json["documentURL"], "about:blank");
        assert!(json.get("timestamp_ms").is_none());
        assert!(json.get("document_url").is_none());

        let back: ActionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record(7));
    }

    #[test]
    fn default_options() {
        let options = ExecutorOptions::default();
        assert_eq!(options.settle_delay, Duration::from_millis(300));
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.wait_timeout, Duration::from_secs(10));
        assert_eq!(options.history_capacity, 100);
    }
}
