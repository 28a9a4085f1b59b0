//! Append-only event log (spec.md §4.4).
//!
//! Structured `EventLog` is what a front end consumes programmatically;
//! alongside it, every state-changing engine call also emits a `tracing`
//! event, exactly the way the teacher's `lmsr_api.rs`/`stress.rs` log
//! through `tracing::{debug, info, error}` rather than `println!`. Logging
//! is optional — an engine with no `EventLog` attached is a pure no-op,
//! per spec.md.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    OrderPlaced,
    Trade,
    OrderCancelled,
    BookSnapshot,
    MarketData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: Value,
}

#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EventKind, data: Value) {
        let entry = LogEntry { timestamp: Utc::now(), kind, data };
        tracing::debug!(kind = ?entry.kind, data = %entry.data, "engine event");
        self.entries.push(entry);
    }

    pub fn get_logs(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn export_json(&self) -> Value {
        serde_json::to_value(&self.entries).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_accumulate_in_order() {
        let mut log = EventLog::new();
        log.record(EventKind::OrderPlaced, json!({"orderId": "ORD-00000001"}));
        log.record(EventKind::Trade, json!({"tradeId": "TRD-00000001"}));
        assert_eq!(log.get_logs().len(), 2);
        assert_eq!(log.get_logs()[0].kind, EventKind::OrderPlaced);
        assert_eq!(log.get_logs()[1].kind, EventKind::Trade);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = EventLog::new();
        log.record(EventKind::MarketData, json!({}));
        log.clear();
        assert!(log.get_logs().is_empty());
    }

    #[test]
    fn export_json_is_an_array() {
        let mut log = EventLog::new();
        log.record(EventKind::BookSnapshot, json!({"depth": 3}));
        assert!(log.export_json().is_array());
    }
}
