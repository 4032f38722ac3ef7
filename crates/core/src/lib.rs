pub mod config;
pub mod error;
pub mod sink;
pub mod types;

pub use config::AppConfig;
pub use error::{SiteError, SiteResult};
pub use sink::TelemetrySink;
