//! Conversion funnel — static mapping from page paths to ordered funnel
//! steps, culminating in the terminal conversion step.
//!
//! The funnel is observational only: nothing enforces that a visitor passed
//! steps 1–4 before a conversion is recorded.

/// Name of the single configured funnel.
pub const FUNNEL_NAME: &str = "consulting-pipeline";
/// Step number recorded for goal completion.
pub const CONVERSION_STEP: u8 = 5;
/// Step name recorded for goal completion.
pub const CONVERSION_STEP_NAME: &str = "Conversion";

/// A milestone position within the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelStep {
    pub number: u8,
    pub name: &'static str,
}

/// Map a page path to its funnel step. Paths outside the funnel map to
/// `None` and produce no funnel event.
pub fn funnel_step(path: &str) -> Option<FunnelStep> {
    match path {
        "/" => Some(FunnelStep {
            number: 1,
            name: "Homepage",
        }),
        "/services" => Some(FunnelStep {
            number: 2,
            name: "Services",
        }),
        "/pricing" => Some(FunnelStep {
            number: 3,
            name: "Pricing",
        }),
        "/contact" => Some(FunnelStep {
            number: 4,
            name: "Contact Page",
        }),
        _ => None,
    }
}
