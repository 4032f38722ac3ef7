//! Asynchronous store writer that batches telemetry records and inserts them
//! over the store's REST API. Uses a channel-based architecture so appends
//! never block the caller.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use efh_core::config::StoreConfig;
use efh_core::error::{SiteError, SiteResult};
use efh_core::sink::TelemetrySink;
use efh_core::types::{StoreTable, TelemetryRecord};

/// Telemetry sink with a background batch writer.
pub struct StoreWriter {
    sender: mpsc::Sender<TelemetryRecord>,
}

impl StoreWriter {
    /// Create the writer and spawn its background flush task. Must be called
    /// from within a tokio runtime.
    pub fn new(config: &StoreConfig) -> SiteResult<Self> {
        let (sender, receiver) = mpsc::channel::<TelemetryRecord>(config.queue_capacity);

        let writer = BatchWriter::new(config)?;
        let batch_size = config.batch_size;
        let flush_interval = std::time::Duration::from_millis(config.flush_interval_ms);

        tokio::spawn(async move {
            writer.run(receiver, batch_size, flush_interval).await;
        });

        info!(base_url = %config.base_url, "store writer initialized");

        Ok(Self { sender })
    }
}

impl TelemetrySink for StoreWriter {
    fn append(&self, record: TelemetryRecord) {
        if let Err(e) = self.sender.try_send(record) {
            metrics::counter!("telemetry.dropped").increment(1);
            warn!("telemetry record dropped: {}", e);
        } else {
            metrics::counter!("telemetry.queued").increment(1);
        }
    }
}

/// Background writer that batches records and inserts them per table.
struct BatchWriter {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl BatchWriter {
    fn new(config: &StoreConfig) -> SiteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SiteError::Store(e.to_string()))?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SiteError::Config(format!("store base_url: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    async fn run(
        self,
        mut receiver: mpsc::Receiver<TelemetryRecord>,
        batch_size: usize,
        flush_interval: std::time::Duration,
    ) {
        let mut buffer: Vec<TelemetryRecord> = Vec::with_capacity(batch_size);
        let mut interval = tokio::time::interval(flush_interval);

        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Some(record) => {
                        buffer.push(record);
                        if buffer.len() >= batch_size {
                            self.flush(&mut buffer).await;
                        }
                    }
                    // Channel closed: flush what's left and stop
                    None => {
                        self.flush(&mut buffer).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    if !buffer.is_empty() {
                        self.flush(&mut buffer).await;
                    }
                }
            }
        }
    }

    async fn flush(&self, buffer: &mut Vec<TelemetryRecord>) {
        if buffer.is_empty() {
            return;
        }
        let grouped = group_rows(buffer);
        buffer.clear();

        for (table, rows) in grouped {
            let count = rows.len();
            debug!(table = table.as_str(), count, "flushing telemetry batch");

            let url = match insert_endpoint(&self.base_url, table) {
                Ok(url) => url,
                Err(e) => {
                    error!(error = %e, table = table.as_str(), "bad store endpoint");
                    continue;
                }
            };

            let result = self
                .client
                .post(url)
                .header("apikey", &self.api_key)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Prefer", "return=minimal")
                .json(&rows)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            match result {
                Ok(_) => {
                    metrics::counter!("telemetry.flushed").increment(count as u64);
                    debug!(table = table.as_str(), count, "telemetry batch flushed");
                }
                Err(e) => {
                    // Best-effort: the batch is lost, no retry
                    metrics::counter!("telemetry.flush_errors").increment(1);
                    error!(error = %e, table = table.as_str(), count, "failed to flush telemetry batch");
                }
            }
        }
    }
}

/// Group buffered records into per-table row arrays.
fn group_rows(records: &[TelemetryRecord]) -> HashMap<StoreTable, Vec<serde_json::Value>> {
    let mut grouped: HashMap<StoreTable, Vec<serde_json::Value>> = HashMap::new();
    for record in records {
        grouped.entry(record.table()).or_default().push(record.to_row());
    }
    grouped
}

/// Insert endpoint for a table: `{base}/rest/v1/{table}`.
fn insert_endpoint(base: &Url, table: StoreTable) -> Result<Url, url::ParseError> {
    base.join(&format!("rest/v1/{}", table.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use efh_core::types::{EventRecord, PageViewRecord};

    fn event(name: &str) -> TelemetryRecord {
        TelemetryRecord::Event(EventRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            event_name: name.into(),
            event_data: serde_json::json!({}),
            page_path: "/".into(),
            site_id: "efh-website".into(),
        })
    }

    fn page_view() -> TelemetryRecord {
        TelemetryRecord::PageView(PageViewRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            page_path: "/".into(),
            page_url: "https://efhconsultinggroup.com/".into(),
            referrer: None,
            device: Default::default(),
            site_id: "efh-website".into(),
        })
    }

    #[test]
    fn test_group_rows_by_table() {
        let records = vec![event("a"), page_view(), event("b")];
        let grouped = group_rows(&records);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&StoreTable::AnalyticsEvents].len(), 2);
        assert_eq!(grouped[&StoreTable::PageViews].len(), 1);
        assert_eq!(grouped[&StoreTable::AnalyticsEvents][0]["event_name"], "a");
    }

    #[test]
    fn test_insert_endpoint() {
        let base = Url::parse("https://abc.supabase.co/").unwrap();
        let url = insert_endpoint(&base, StoreTable::FunnelEvents).unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/funnel_events");
    }

    #[tokio::test]
    async fn test_append_never_blocks_or_errors() {
        // Points at a closed port; flushes will fail and must be swallowed
        let config = StoreConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            queue_capacity: 4,
            batch_size: 2,
            flush_interval_ms: 10,
            ..Default::default()
        };
        let writer = StoreWriter::new(&config).unwrap();
        for _ in 0..100 {
            // Far beyond queue capacity: excess records drop silently
            writer.append(event("burst"));
        }
    }
}
