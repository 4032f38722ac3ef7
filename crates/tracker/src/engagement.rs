//! Engagement and bounce accounting — per-session mutable state that decides
//! whether a session ended without meaningful interaction.

use chrono::{DateTime, Duration, Utc};

use crate::runtime::ScrollGeometry;

/// Dwell time (seconds) beyond which a session counts as engaged.
pub const MIN_ENGAGED_DWELL_SECONDS: i64 = 10;
/// Max scroll depth (percent) at which a session counts as engaged.
pub const ENGAGED_SCROLL_DEPTH_PERCENT: u8 = 25;
/// Quiet period for scroll-event debouncing.
pub const SCROLL_DEBOUNCE_MS: i64 = 100;

/// Signals accumulated over one session's lifetime.
///
/// Reset only at session renewal (see `identity::session_id`); engagement is
/// never un-set within a session.
#[derive(Debug, Clone, Default)]
pub struct EngagementState {
    session_start: Option<DateTime<Utc>>,
    has_engaged: bool,
    max_scroll_depth: u8,
}

impl EngagementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session at `now`, clearing all accumulated signals.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self {
            session_start: Some(now),
            has_engaged: false,
            max_scroll_depth: 0,
        };
    }

    pub fn mark_engaged(&mut self) {
        self.has_engaged = true;
    }

    pub fn has_engaged(&self) -> bool {
        self.has_engaged
    }

    pub fn max_scroll_depth(&self) -> u8 {
        self.max_scroll_depth
    }

    /// Fold a scroll-depth observation into the running maximum and apply
    /// the depth engagement rule.
    pub fn observe_scroll_depth(&mut self, depth: u8, engaged_threshold: u8) {
        if depth > self.max_scroll_depth {
            self.max_scroll_depth = depth;
        }
        if self.max_scroll_depth >= engaged_threshold {
            self.has_engaged = true;
        }
    }

    /// Whole seconds since session start; 0 when no start was ever recorded.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.session_start
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

/// Scroll depth as an integer percentage of the scrollable range.
///
/// 0 when the content fits the viewport — there is no scrollable range to
/// divide by.
pub fn scroll_depth_percent(geometry: ScrollGeometry) -> u8 {
    let range = geometry.document_height.saturating_sub(geometry.viewport_height);
    if range == 0 {
        return 0;
    }
    let pct = (f64::from(geometry.scroll_y) / f64::from(range)) * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}

/// Trailing-edge debouncer for scroll events.
///
/// `trigger` records that a scroll event arrived; `poll` fires exactly once
/// per burst, after a full quiet period with no further triggers. Rapid
/// scrolling therefore produces at most one depth computation per quiet
/// period, bounding write volume.
#[derive(Debug)]
pub struct ScrollDebouncer {
    quiet_period: Duration,
    pending_since: Option<DateTime<Utc>>,
}

impl ScrollDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending_since: None,
        }
    }

    /// A scroll event arrived; restart the quiet period.
    pub fn trigger(&mut self, now: DateTime<Utc>) {
        self.pending_since = Some(now);
    }

    /// True exactly once, when a trigger is pending and the quiet period has
    /// fully elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.pending_since {
            Some(at) if now - at >= self.quiet_period => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}
