//! Telemetry record types — the rows written to the hosted analytics store.
//!
//! One struct per store table, serialized with snake_case column names. All
//! records are write-once: the site never updates or deletes analytics rows.

use serde::{Deserialize, Serialize};

/// Logical store tables the telemetry subsystem appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTable {
    PageViews,
    AnalyticsEvents,
    ClickEvents,
    Sessions,
    FunnelEvents,
}

impl StoreTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreTable::PageViews => "page_views",
            StoreTable::AnalyticsEvents => "analytics_events",
            StoreTable::ClickEvents => "click_events",
            StoreTable::Sessions => "sessions",
            StoreTable::FunnelEvents => "funnel_events",
        }
    }
}

/// Browser family classified from the user-agent string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Browser {
    Firefox,
    Chrome,
    Safari,
    Edge,
    Opera,
    Unknown,
}

/// Operating system classified from the user-agent string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Os {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    Unknown,
}

/// Device class derived from viewport width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

/// Device and browser context attached to page-view records.
///
/// `Default` is the empty context emitted when no display environment is
/// available (headless/prerender execution).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceContext {
    pub browser: Browser,
    pub os: Os,
    pub device_type: DeviceType,
    pub screen_width: u32,
    pub screen_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub language: String,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self {
            browser: Browser::Unknown,
            os: Os::Unknown,
            device_type: DeviceType::Unknown,
            screen_width: 0,
            screen_height: 0,
            viewport_width: 0,
            viewport_height: 0,
            language: String::new(),
        }
    }
}

/// One row in `page_views`, emitted per navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewRecord {
    pub visitor_id: String,
    pub session_id: String,
    pub page_path: String,
    pub page_url: String,
    pub referrer: Option<String>,
    #[serde(flatten)]
    pub device: DeviceContext,
    pub site_id: String,
}

/// One row in `analytics_events` — custom interactions and conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub visitor_id: String,
    pub session_id: String,
    pub event_name: String,
    pub event_data: serde_json::Value,
    pub page_path: String,
    pub site_id: String,
}

/// One row in `click_events`, with both normalized and raw coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRecord {
    pub visitor_id: String,
    pub session_id: String,
    pub page_path: String,
    pub x_percent: u8,
    pub y_percent: u8,
    pub x_px: u32,
    pub y_px: u32,
    pub element_tag: String,
    pub element_id: Option<String>,
    pub element_classes: Vec<String>,
    pub element_text: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub site_id: String,
}

/// One row in `sessions`, written at session end.
///
/// Both the unload and tab-hidden paths may write one; duplicates are an
/// accepted cost and carry no dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummaryRecord {
    pub visitor_id: String,
    pub session_id: String,
    pub duration_seconds: u64,
    pub max_scroll_depth: u8,
    pub is_bounce: bool,
    pub exit_page: String,
    pub site_id: String,
}

/// One row in `funnel_events`. `conversion_type`/`conversion_value` are set
/// only on the terminal conversion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelEventRecord {
    pub visitor_id: String,
    pub session_id: String,
    pub funnel_name: String,
    pub step_number: u8,
    pub step_name: String,
    pub page_path: String,
    pub conversion_type: Option<String>,
    pub conversion_value: Option<f64>,
    pub site_id: String,
}

/// Envelope routing a record to its store table.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TelemetryRecord {
    PageView(PageViewRecord),
    Event(EventRecord),
    Click(ClickRecord),
    SessionSummary(SessionSummaryRecord),
    FunnelEvent(FunnelEventRecord),
}

impl TelemetryRecord {
    pub fn table(&self) -> StoreTable {
        match self {
            TelemetryRecord::PageView(_) => StoreTable::PageViews,
            TelemetryRecord::Event(_) => StoreTable::AnalyticsEvents,
            TelemetryRecord::Click(_) => StoreTable::ClickEvents,
            TelemetryRecord::SessionSummary(_) => StoreTable::Sessions,
            TelemetryRecord::FunnelEvent(_) => StoreTable::FunnelEvents,
        }
    }

    /// Serialize to the bare row object inserted into the store.
    pub fn to_row(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_view_row_shape() {
        let record = PageViewRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            page_path: "/services".into(),
            page_url: "https://efhconsultinggroup.com/services".into(),
            referrer: Some("https://google.com".into()),
            device: DeviceContext {
                browser: Browser::Firefox,
                os: Os::MacOs,
                device_type: DeviceType::Desktop,
                screen_width: 2560,
                screen_height: 1440,
                viewport_width: 1440,
                viewport_height: 900,
                language: "en-US".into(),
            },
            site_id: "efh-website".into(),
        };

        let row = TelemetryRecord::PageView(record).to_row();
        assert_eq!(row["page_path"], "/services");
        // Device context flattens into the row rather than nesting
        assert_eq!(row["browser"], "Firefox");
        assert_eq!(row["os"], "macOS");
        assert_eq!(row["device_type"], "Desktop");
        assert_eq!(row["site_id"], "efh-website");
    }

    #[test]
    fn test_record_table_routing() {
        let event = TelemetryRecord::Event(EventRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            event_name: "cta_click".into(),
            event_data: serde_json::json!({}),
            page_path: "/".into(),
            site_id: "efh-website".into(),
        });
        assert_eq!(event.table(), StoreTable::AnalyticsEvents);
        assert_eq!(event.table().as_str(), "analytics_events");

        let summary = TelemetryRecord::SessionSummary(SessionSummaryRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            duration_seconds: 42,
            max_scroll_depth: 80,
            is_bounce: false,
            exit_page: "/pricing".into(),
            site_id: "efh-website".into(),
        });
        assert_eq!(summary.table(), StoreTable::Sessions);
    }

    #[test]
    fn test_click_record_serde() {
        let click = ClickRecord {
            visitor_id: "v-1".into(),
            session_id: "s-1".into(),
            page_path: "/contact".into(),
            x_percent: 50,
            y_percent: 25,
            x_px: 720,
            y_px: 225,
            element_tag: "button".into(),
            element_id: Some("submit-btn".into()),
            element_classes: vec!["btn".into(), "btn-primary".into()],
            element_text: Some("Send Message".into()),
            viewport_width: 1440,
            viewport_height: 900,
            site_id: "efh-website".into(),
        };
        let json = serde_json::to_string(&click).unwrap();
        let parsed: ClickRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.element_tag, "button");
        assert_eq!(parsed.element_classes.len(), 2);
    }
}
