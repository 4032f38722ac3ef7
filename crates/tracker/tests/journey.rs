//! End-to-end visitor journeys: funnel progression, engagement accounting,
//! conversion double-recording, and session boundaries.

use chrono::Duration;
use std::sync::Arc;

use efh_core::sink::capture_sink;
use efh_core::types::{StoreTable, TelemetryRecord};
use efh_tracker::runtime::FixedEnv;
use efh_tracker::{PointerClick, TargetElement, Tracker};

#[test]
fn test_full_visit_through_funnel_to_conversion() {
    let env = Arc::new(FixedEnv::browser());
    let sink = capture_sink();
    let mut tracker = Tracker::new(env.clone(), sink.clone());

    // Land on the homepage from a search engine
    env.set_page(
        "/",
        "https://efhconsultinggroup.com/",
        Some("https://duckduckgo.com/"),
    );
    tracker.track_page_view("/");

    env.advance(Duration::seconds(20));
    env.set_page("/services", "https://efhconsultinggroup.com/services", None);
    tracker.track_page_view("/services");

    env.advance(Duration::seconds(40));
    env.set_page("/pricing", "https://efhconsultinggroup.com/pricing", None);
    tracker.track_page_view("/pricing");

    env.advance(Duration::seconds(30));
    env.set_page("/contact", "https://efhconsultinggroup.com/contact", None);
    tracker.track_page_view("/contact");

    // Submit the contact form; the success handler records the conversion
    tracker.track_click(&PointerClick {
        client_x: 700.0,
        client_y: 500.0,
        target: TargetElement {
            tag: "button".to_string(),
            id: Some("contact-submit".to_string()),
            classes: vec!["btn".to_string()],
            text: Some("Send Message".to_string()),
        },
    });
    tracker.track_conversion("contact", None);

    env.advance(Duration::seconds(5));
    tracker.track_session_end();

    assert_eq!(sink.count_table(StoreTable::PageViews), 4);
    assert_eq!(sink.count_table(StoreTable::ClickEvents), 1);
    assert_eq!(sink.count_table(StoreTable::AnalyticsEvents), 1);
    assert_eq!(sink.count_table(StoreTable::Sessions), 1);

    // Funnel saw steps 1 through 4 in page order, then the conversion
    let steps: Vec<u8> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            TelemetryRecord::FunnelEvent(f) => Some(f.step_number),
            _ => None,
        })
        .collect();
    assert_eq!(steps, vec![1, 2, 3, 4, 5]);

    // One session covered the whole visit
    let mut session_ids: Vec<String> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            TelemetryRecord::PageView(pv) => Some(pv.session_id),
            TelemetryRecord::SessionSummary(s) => Some(s.session_id),
            _ => None,
        })
        .collect();
    session_ids.dedup();
    assert_eq!(session_ids.len(), 1);

    let summary = sink
        .records()
        .into_iter()
        .find_map(|r| match r {
            TelemetryRecord::SessionSummary(s) => Some(s),
            _ => None,
        })
        .expect("session summary written");
    assert!(!summary.is_bounce);
    assert_eq!(summary.duration_seconds, 95);
    assert_eq!(summary.exit_page, "/contact");
}

#[test]
fn test_returning_visitor_gets_fresh_session() {
    let env = Arc::new(FixedEnv::browser());
    let sink = capture_sink();
    let mut tracker = Tracker::new(env.clone(), sink.clone());

    tracker.track_page_view("/");
    env.advance(Duration::minutes(45));
    tracker.track_page_view("/");

    let views: Vec<_> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            TelemetryRecord::PageView(pv) => Some(pv),
            _ => None,
        })
        .collect();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].visitor_id, views[1].visitor_id);
    assert_ne!(views[0].session_id, views[1].session_id);
}

#[test]
fn test_conversion_without_funnel_path_still_records() {
    let env = Arc::new(FixedEnv::browser());
    let sink = capture_sink();
    let mut tracker = Tracker::new(env.clone(), sink.clone());

    // Booking confirmation lives outside the funnel path map; conversions
    // are not gated on funnel position
    env.set_page("/book", "https://efhconsultinggroup.com/book", None);
    tracker.track_page_view("/book");
    tracker.track_conversion("booking", Some(0.0));

    assert_eq!(sink.count_table(StoreTable::PageViews), 1);
    assert_eq!(sink.count_table(StoreTable::FunnelEvents), 1);

    let funnel = sink
        .records()
        .into_iter()
        .find_map(|r| match r {
            TelemetryRecord::FunnelEvent(f) => Some(f),
            _ => None,
        })
        .expect("funnel event written");
    assert_eq!(funnel.step_number, 5);
    assert_eq!(funnel.conversion_type.as_deref(), Some("booking"));
    assert_eq!(funnel.page_path, "/book");
}
