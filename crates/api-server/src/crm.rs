//! CRM lead forwarding — best-effort delivery of form submissions to the
//! external CRM's public lead endpoint.
//!
//! A CRM outage never fails the submitting user's request: delivery failures
//! are logged and counted, and the caller only learns a boolean.

use serde::Serialize;
use tracing::{error, info};
use url::Url;

use efh_core::config::CrmConfig;
use efh_core::error::{SiteError, SiteResult};

/// Lead payload accepted by `POST {crm}/api/public/lead`.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub service: String,
    /// Which form produced the lead: "contact" or "booking".
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "bookingDate", skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    #[serde(rename = "bookingTime", skip_serializing_if = "Option::is_none")]
    pub booking_time: Option<String>,
}

/// HTTP client for the external CRM.
pub struct CrmClient {
    client: reqwest::Client,
    lead_endpoint: Url,
}

impl CrmClient {
    pub fn new(config: &CrmConfig) -> SiteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SiteError::Crm(e.to_string()))?;
        let lead_endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("api/public/lead"))
            .map_err(|e| SiteError::Config(format!("crm base_url: {e}")))?;

        Ok(Self {
            client,
            lead_endpoint,
        })
    }

    /// Forward a lead to the CRM. Returns whether delivery succeeded;
    /// failures are logged here and never propagated.
    pub async fn forward_lead(&self, lead: &LeadPayload) -> bool {
        let result = self
            .client
            .post(self.lead_endpoint.clone())
            .json(lead)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(_) => {
                metrics::counter!("crm.leads_forwarded").increment(1);
                info!(source = %lead.source, "lead forwarded to CRM");
                true
            }
            Err(e) => {
                metrics::counter!("crm.forward_errors").increment(1);
                error!(error = %e, source = %lead.source, "failed to forward lead to CRM");
                false
            }
        }
    }
}
