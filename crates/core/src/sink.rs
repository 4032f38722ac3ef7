//! Telemetry sink — trait for appending analytics records from any module.
//!
//! The tracker accepts an `Arc<dyn TelemetrySink>` and treats every append as
//! fire-and-forget: implementations must never surface errors to the caller.

use crate::types::{StoreTable, TelemetryRecord};
use std::sync::{Arc, Mutex};

/// Trait for appending telemetry records. Implementations route records to
/// the hosted analytics store; the caller never observes delivery failures.
pub trait TelemetrySink: Send + Sync {
    fn append(&self, record: TelemetryRecord);
}

/// No-op sink for tests and contexts that don't record analytics.
pub struct NoOpSink;

impl TelemetrySink for NoOpSink {
    fn append(&self, _record: TelemetryRecord) {}
}

/// In-memory sink that captures records for testing.
#[derive(Default)]
pub struct CaptureSink {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().expect("sink mutex poisoned").len()
    }

    pub fn count_table(&self, table: StoreTable) -> usize {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .iter()
            .filter(|r| r.table() == table)
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().expect("sink mutex poisoned").clear();
    }
}

impl TelemetrySink for CaptureSink {
    fn append(&self, record: TelemetryRecord) {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(record);
    }
}

/// A sink that drops every record after the first `fail_after` appends by
/// pretending the transport failed. Used to verify that emitters swallow
/// store failures without propagating them.
pub struct FailingSink {
    delivered: CaptureSink,
    fail_after: usize,
    seen: Mutex<usize>,
}

impl FailingSink {
    pub fn new(fail_after: usize) -> Self {
        Self {
            delivered: CaptureSink::new(),
            fail_after,
            seen: Mutex::new(0),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.count()
    }
}

impl TelemetrySink for FailingSink {
    fn append(&self, record: TelemetryRecord) {
        let mut seen = self.seen.lock().expect("sink mutex poisoned");
        *seen += 1;
        if *seen <= self.fail_after {
            self.delivered.append(record);
        }
        // Past the threshold the record is silently lost, matching the
        // best-effort contract of the real transport.
    }
}

/// Convenience: create a no-op sink.
pub fn noop_sink() -> Arc<dyn TelemetrySink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EventRecord;

    fn make_event(name: &str) -> TelemetryRecord {
        TelemetryRecord::Event(EventRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            event_name: name.into(),
            event_data: serde_json::json!({}),
            page_path: "/".into(),
            site_id: "efh-website".into(),
        })
    }

    #[test]
    fn test_capture_sink() {
        let sink = capture_sink();
        assert_eq!(sink.count(), 0);

        sink.append(make_event("first"));
        sink.append(make_event("second"));

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.count_table(StoreTable::AnalyticsEvents), 2);
        assert_eq!(sink.count_table(StoreTable::PageViews), 0);

        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_noop_sink() {
        let sink = noop_sink();
        // Should not panic
        sink.append(make_event("ignored"));
    }

    #[test]
    fn test_failing_sink_drops_after_threshold() {
        let sink = FailingSink::new(1);
        sink.append(make_event("kept"));
        sink.append(make_event("dropped"));
        assert_eq!(sink.delivered(), 1);
    }
}
