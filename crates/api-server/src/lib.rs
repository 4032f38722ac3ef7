#![warn(clippy::unwrap_used)]

pub mod crm;
pub mod rest;
pub mod server;

pub use crm::CrmClient;
pub use server::ApiServer;
