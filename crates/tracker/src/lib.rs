//! Visitor telemetry core — identity/session management, device
//! classification, event emitters, engagement/bounce accounting, and
//! conversion-funnel tracking for the marketing site.
//!
//! # Modules
//!
//! - [`runtime`] — Runtime context provider capability (clock, page, device,
//!   scroll geometry, storage scopes) with an in-memory test implementation
//! - [`identity`] — Durable visitor id and renewable 30-minute session
//! - [`device`] — User-agent and viewport classification
//! - [`engagement`] — Per-session engagement state, scroll depth, debouncing
//! - [`funnel`] — Static page-path → funnel-step mapping
//! - [`tracker`] — The per-tab [`Tracker`] tying everything together
//!
//! The host page integration constructs one [`Tracker`] per tab and routes
//! DOM events into it: route changes call [`Tracker::track_page_view`],
//! clicks call [`Tracker::track_click`], scroll events pass through a
//! [`ScrollDebouncer`] before [`Tracker::track_scroll`], and both
//! `beforeunload` and visibility-hidden call [`Tracker::track_session_end`].
//! Every store write is fire-and-forget; telemetry never surfaces errors to
//! the page.

pub mod device;
pub mod engagement;
pub mod funnel;
pub mod identity;
pub mod runtime;
pub mod tracker;

pub use engagement::ScrollDebouncer;
pub use runtime::{FixedEnv, RuntimeEnv};
pub use tracker::{PointerClick, TargetElement, Tracker, TrackerConfig};
