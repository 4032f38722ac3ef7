//! Runtime context provider — the capability trait through which the tracker
//! observes its host environment.
//!
//! The original integration sniffed globals at every call site; here the
//! environment is injected once and queried per call, so a non-interactive
//! context (prerender, crawler, test) is just an env that answers `None`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// The page currently loaded in the tab.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub path: String,
    pub url: String,
    pub referrer: Option<String>,
}

/// Raw display facts used for device classification.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub language: String,
}

/// Scroll geometry at observation time.
#[derive(Debug, Clone, Copy)]
pub struct ScrollGeometry {
    pub scroll_y: u32,
    pub document_height: u32,
    pub viewport_height: u32,
}

/// A key-value storage scope (durable or tab-lifetime).
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Capability trait supplying everything the tracker reads from its host.
///
/// Queried fresh on every tracking call. `None` answers mean the capability
/// is absent in this execution context; the tracker degrades to empty
/// placeholders rather than failing.
pub trait RuntimeEnv: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Page context, `None` outside a browser tab.
    fn page(&self) -> Option<PageContext>;

    /// Display facts, `None` when no display environment exists.
    fn device(&self) -> Option<DeviceSnapshot>;

    /// Scroll geometry, `None` when no display environment exists.
    fn scroll(&self) -> Option<ScrollGeometry>;

    /// Storage surviving tab and browser restarts (visitor identity).
    fn durable_storage(&self) -> Option<&dyn StorageArea>;

    /// Storage scoped to this tab's lifetime (session state).
    fn tab_storage(&self) -> Option<&dyn StorageArea>;
}

/// In-memory `StorageArea`.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

/// Configurable in-memory environment with a manually advanced clock.
///
/// `browser()` answers like a desktop browser tab; `headless()` answers like
/// a non-interactive context (no page, no display, no storage). Tests mutate
/// it through `&self` so a clone of the `Arc` handed to the tracker stays
/// usable as a remote control.
pub struct FixedEnv {
    now: Mutex<DateTime<Utc>>,
    page: Mutex<Option<PageContext>>,
    device: Mutex<Option<DeviceSnapshot>>,
    scroll: Mutex<Option<ScrollGeometry>>,
    durable: Option<MemoryStorage>,
    tab: Option<MemoryStorage>,
}

impl FixedEnv {
    /// A desktop-browser-like environment.
    pub fn browser() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
            page: Mutex::new(Some(PageContext {
                path: "/".to_string(),
                url: "https://efhconsultinggroup.com/".to_string(),
                referrer: None,
            })),
            device: Mutex::new(Some(DeviceSnapshot {
                user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Chrome/120.0"
                    .to_string(),
                screen_width: 2560,
                screen_height: 1440,
                viewport_width: 1440,
                viewport_height: 900,
                language: "en-US".to_string(),
            })),
            scroll: Mutex::new(Some(ScrollGeometry {
                scroll_y: 0,
                document_height: 2400,
                viewport_height: 900,
            })),
            durable: Some(MemoryStorage::new()),
            tab: Some(MemoryStorage::new()),
        }
    }

    /// A non-interactive context: no page, no display, no storage.
    pub fn headless() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
            page: Mutex::new(None),
            device: Mutex::new(None),
            scroll: Mutex::new(None),
            durable: None,
            tab: None,
        }
    }

    /// Advance the clock.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("env mutex poisoned");
        *now += by;
    }

    pub fn set_page(&self, path: &str, url: &str, referrer: Option<&str>) {
        *self.page.lock().expect("env mutex poisoned") = Some(PageContext {
            path: path.to_string(),
            url: url.to_string(),
            referrer: referrer.map(str::to_string),
        });
    }

    pub fn set_device(&self, device: Option<DeviceSnapshot>) {
        *self.device.lock().expect("env mutex poisoned") = device;
    }

    pub fn set_scroll(&self, scroll: Option<ScrollGeometry>) {
        *self.scroll.lock().expect("env mutex poisoned") = scroll;
    }
}

impl RuntimeEnv for FixedEnv {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("env mutex poisoned")
    }

    fn page(&self) -> Option<PageContext> {
        self.page.lock().expect("env mutex poisoned").clone()
    }

    fn device(&self) -> Option<DeviceSnapshot> {
        self.device.lock().expect("env mutex poisoned").clone()
    }

    fn scroll(&self) -> Option<ScrollGeometry> {
        *self.scroll.lock().expect("env mutex poisoned")
    }

    fn durable_storage(&self) -> Option<&dyn StorageArea> {
        self.durable.as_ref().map(|s| s as &dyn StorageArea)
    }

    fn tab_storage(&self) -> Option<&dyn StorageArea> {
        self.tab.as_ref().map(|s| s as &dyn StorageArea)
    }
}
