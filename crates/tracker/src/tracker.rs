//! The per-tab tracker — resolves identity, derives context, and appends
//! telemetry records through the injected sink.
//!
//! One `Tracker` is constructed per browser-tab lifetime. All mutable tab
//! state lives on the instance; nothing is process-global, so independent
//! tabs (and tests) never share engagement state.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use tracing::debug;

use efh_core::sink::TelemetrySink;
use efh_core::types::{
    ClickRecord, EventRecord, FunnelEventRecord, PageViewRecord, SessionSummaryRecord,
    TelemetryRecord,
};

use crate::device::device_context;
use crate::engagement::{
    scroll_depth_percent, EngagementState, ENGAGED_SCROLL_DEPTH_PERCENT, MIN_ENGAGED_DWELL_SECONDS,
    SCROLL_DEBOUNCE_MS,
};
use crate::funnel::{funnel_step, CONVERSION_STEP, CONVERSION_STEP_NAME, FUNNEL_NAME};
use crate::identity;
use crate::runtime::RuntimeEnv;

/// Maximum characters of element text carried on a click record.
pub const ELEMENT_TEXT_MAX: usize = 50;

/// Business policy for one tracker instance. `Default` carries the deployed
/// site's values; tests construct variants.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub site_id: String,
    pub funnel_name: String,
    pub session_timeout: Duration,
    pub min_engaged_dwell: Duration,
    pub engaged_scroll_depth_percent: u8,
    pub scroll_debounce: Duration,
    pub element_text_max: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            site_id: "efh-website".to_string(),
            funnel_name: FUNNEL_NAME.to_string(),
            session_timeout: Duration::minutes(identity::SESSION_TIMEOUT_MINUTES),
            min_engaged_dwell: Duration::seconds(MIN_ENGAGED_DWELL_SECONDS),
            engaged_scroll_depth_percent: ENGAGED_SCROLL_DEPTH_PERCENT,
            scroll_debounce: Duration::milliseconds(SCROLL_DEBOUNCE_MS),
            element_text_max: ELEMENT_TEXT_MAX,
        }
    }
}

/// The element a click landed on, as reported by the host integration.
#[derive(Debug, Clone, Default)]
pub struct TargetElement {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: Option<String>,
}

/// A pointer click as reported by the host integration.
#[derive(Debug, Clone)]
pub struct PointerClick {
    pub client_x: f64,
    pub client_y: f64,
    pub target: TargetElement,
}

/// Per-tab tracking context.
pub struct Tracker {
    env: Arc<dyn RuntimeEnv>,
    sink: Arc<dyn TelemetrySink>,
    config: TrackerConfig,
    engagement: EngagementState,
}

impl Tracker {
    pub fn new(env: Arc<dyn RuntimeEnv>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            env,
            sink,
            config: TrackerConfig::default(),
            engagement: EngagementState::new(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Record a page view and, when the path is a funnel milestone, the
    /// corresponding funnel step. The two writes are independent.
    pub fn track_page_view(&mut self, path: &str) {
        let (visitor_id, session_id) = self.ids();
        let page = self.env.page();
        let device = device_context(self.env.device().as_ref());

        let record = PageViewRecord {
            visitor_id,
            session_id,
            page_path: path.to_string(),
            page_url: page.as_ref().map(|p| p.url.clone()).unwrap_or_default(),
            referrer: page.and_then(|p| p.referrer),
            device,
            site_id: self.config.site_id.clone(),
        };
        debug!(page_path = %record.page_path, "page view tracked");
        self.sink.append(TelemetryRecord::PageView(record));

        self.track_funnel_step(path);
    }

    /// Record a custom interaction event. Any explicit event counts as
    /// engagement.
    pub fn track_event(&mut self, name: &str, data: Option<serde_json::Value>) {
        let (visitor_id, session_id) = self.ids();
        self.engagement.mark_engaged();

        let record = EventRecord {
            visitor_id,
            session_id,
            event_name: name.to_string(),
            event_data: data.unwrap_or_else(|| json!({})),
            page_path: self.current_path(),
            site_id: self.config.site_id.clone(),
        };
        debug!(event_name = %record.event_name, "event tracked");
        self.sink.append(TelemetryRecord::Event(record));
    }

    /// Record a click with normalized and raw coordinates plus element
    /// descriptors. Clicks count as engagement.
    pub fn track_click(&mut self, click: &PointerClick) {
        let (visitor_id, session_id) = self.ids();
        self.engagement.mark_engaged();

        let (viewport_width, viewport_height) = self
            .env
            .device()
            .map(|d| (d.viewport_width, d.viewport_height))
            .unwrap_or((0, 0));

        let record = ClickRecord {
            visitor_id,
            session_id,
            page_path: self.current_path(),
            x_percent: coordinate_percent(click.client_x, viewport_width),
            y_percent: coordinate_percent(click.client_y, viewport_height),
            x_px: click.client_x.round().max(0.0) as u32,
            y_px: click.client_y.round().max(0.0) as u32,
            element_tag: click.target.tag.clone(),
            element_id: click.target.id.clone(),
            element_classes: click.target.classes.clone(),
            element_text: click
                .target
                .text
                .as_ref()
                .map(|t| t.chars().take(self.config.element_text_max).collect()),
            viewport_width,
            viewport_height,
            site_id: self.config.site_id.clone(),
        };
        debug!(element_tag = %record.element_tag, "click tracked");
        self.sink.append(TelemetryRecord::Click(record));
    }

    /// Fold the current scroll position into the session's maximum depth.
    ///
    /// Writes nothing to the store; depth feeds the session summary. The
    /// host is expected to debounce scroll events through a
    /// [`crate::ScrollDebouncer`] before calling this.
    pub fn track_scroll(&mut self) {
        let Some(geometry) = self.env.scroll() else {
            return;
        };
        let depth = scroll_depth_percent(geometry);
        self.engagement
            .observe_scroll_depth(depth, self.config.engaged_scroll_depth_percent);
    }

    /// Explicitly mark the session engaged.
    pub fn mark_engaged(&mut self) {
        self.engagement.mark_engaged();
    }

    /// Write the session summary. Wired to both `beforeunload` and the
    /// tab-hidden visibility change; either path may fire first and duplicate
    /// summaries are accepted.
    pub fn track_session_end(&mut self) {
        let now = self.env.now();
        // Duration, dwell rule, and bounce are read from the ending session
        // before the id lookup, which may replace an expired session.
        let duration_seconds = self.engagement.elapsed_seconds(now);
        if duration_seconds > self.config.min_engaged_dwell.num_seconds().max(0) as u64 {
            self.engagement.mark_engaged();
        }
        let is_bounce = !self.engagement.has_engaged();
        let max_scroll_depth = self.engagement.max_scroll_depth();

        let (visitor_id, session_id) = self.ids();
        let record = SessionSummaryRecord {
            visitor_id,
            session_id,
            duration_seconds,
            max_scroll_depth,
            is_bounce,
            exit_page: self.current_path(),
            site_id: self.config.site_id.clone(),
        };
        debug!(
            duration_seconds,
            is_bounce, max_scroll_depth, "session ended"
        );
        self.sink.append(TelemetryRecord::SessionSummary(record));
    }

    /// Record the funnel step for a page path; paths outside the funnel emit
    /// nothing.
    pub fn track_funnel_step(&mut self, path: &str) {
        let Some(step) = funnel_step(path) else {
            return;
        };
        let (visitor_id, session_id) = self.ids();
        let record = FunnelEventRecord {
            visitor_id,
            session_id,
            funnel_name: self.config.funnel_name.clone(),
            step_number: step.number,
            step_name: step.name.to_string(),
            page_path: path.to_string(),
            conversion_type: None,
            conversion_value: None,
            site_id: self.config.site_id.clone(),
        };
        debug!(step = step.number, step_name = step.name, "funnel step");
        self.sink.append(TelemetryRecord::FunnelEvent(record));
    }

    /// Record a goal completion: the terminal funnel step plus a generic
    /// "conversion" event. Double-recorded so the funnel stream and the
    /// general event stream can each be queried on their own.
    pub fn track_conversion(&mut self, conversion_type: &str, value: Option<f64>) {
        let (visitor_id, session_id) = self.ids();
        let record = FunnelEventRecord {
            visitor_id,
            session_id,
            funnel_name: self.config.funnel_name.clone(),
            step_number: CONVERSION_STEP,
            step_name: CONVERSION_STEP_NAME.to_string(),
            page_path: self.current_path(),
            conversion_type: Some(conversion_type.to_string()),
            conversion_value: value,
            site_id: self.config.site_id.clone(),
        };
        debug!(conversion_type, "conversion tracked");
        self.sink.append(TelemetryRecord::FunnelEvent(record));

        let mut payload = serde_json::Map::new();
        payload.insert("type".to_string(), json!(conversion_type));
        if let Some(v) = value {
            payload.insert("value".to_string(), json!(v));
        }
        self.track_event("conversion", Some(serde_json::Value::Object(payload)));
    }

    /// Build a debouncer matching this tracker's scroll policy.
    pub fn scroll_debouncer(&self) -> crate::ScrollDebouncer {
        crate::ScrollDebouncer::new(self.config.scroll_debounce)
    }

    fn ids(&mut self) -> (String, String) {
        let visitor = identity::visitor_id(self.env.as_ref());
        let session = identity::session_id(
            self.env.as_ref(),
            self.config.session_timeout,
            &mut self.engagement,
        );
        (visitor, session)
    }

    fn current_path(&self) -> String {
        self.env.page().map(|p| p.path).unwrap_or_default()
    }
}

fn coordinate_percent(coordinate: f64, viewport_extent: u32) -> u8 {
    if viewport_extent == 0 {
        return 0;
    }
    let pct = (coordinate / f64::from(viewport_extent)) * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}
