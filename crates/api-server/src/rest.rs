//! REST API handlers for the lead-capture forms and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::crm::{CrmClient, LeadPayload};

/// Maximum length for short string fields (name, email, service, ...).
const MAX_FIELD_LEN: usize = 256;

/// Maximum length for the free-form message body.
const MAX_MESSAGE_LEN: usize = 5000;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<CrmClient>,
    pub start_time: Instant,
}

/// Contact-form submission body.
#[derive(Debug, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub message: String,
}

/// Booking-form submission body.
#[derive(Debug, Deserialize)]
pub struct BookingSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// Validate a contact submission at the API boundary.
fn validate_contact(submission: &ContactSubmission) -> Result<(), &'static str> {
    if submission.name.is_empty()
        || submission.email.is_empty()
        || submission.service.is_empty()
        || submission.message.is_empty()
    {
        return Err("Missing required fields");
    }
    if submission.name.len() > MAX_FIELD_LEN
        || submission.email.len() > MAX_FIELD_LEN
        || submission.service.len() > MAX_FIELD_LEN
    {
        return Err("Field exceeds maximum length");
    }
    if submission.message.len() > MAX_MESSAGE_LEN {
        return Err("Message exceeds maximum length");
    }
    if !is_valid_email(&submission.email) {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate a booking submission at the API boundary.
fn validate_booking(submission: &BookingSubmission) -> Result<(), &'static str> {
    if submission.name.is_empty()
        || submission.email.is_empty()
        || submission.phone.is_empty()
        || submission.service.is_empty()
        || submission.date.is_empty()
        || submission.time.is_empty()
    {
        return Err("Missing required fields");
    }
    if submission.name.len() > MAX_FIELD_LEN
        || submission.email.len() > MAX_FIELD_LEN
        || submission.phone.len() > MAX_FIELD_LEN
        || submission.service.len() > MAX_FIELD_LEN
    {
        return Err("Field exceeds maximum length");
    }
    if !is_valid_email(&submission.email) {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Email shape check: non-empty local part, single `@`, dot-bearing domain,
/// no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// POST /api/contact — contact form submission.
pub async fn handle_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<Json<SubmissionResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_contact(&submission) {
        warn!(error = msg, "contact submission rejected");
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: msg.to_string(),
            }),
        ));
    }

    let lead = LeadPayload {
        name: submission.name,
        email: submission.email,
        phone: None,
        service: submission.service,
        source: "contact".to_string(),
        company: submission.company,
        message: Some(submission.message),
        booking_date: None,
        booking_time: None,
    };
    // A CRM outage must not fail the user's submission
    state.crm.forward_lead(&lead).await;

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Message sent successfully".to_string(),
    }))
}

/// POST /api/booking — booking form submission.
pub async fn handle_booking(
    State(state): State<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> Result<Json<SubmissionResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_booking(&submission) {
        warn!(error = msg, "booking submission rejected");
        metrics::counter!("api.validation_errors").increment(1);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: msg.to_string(),
            }),
        ));
    }

    let lead = LeadPayload {
        name: submission.name,
        email: submission.email,
        phone: Some(submission.phone),
        service: submission.service,
        source: "booking".to_string(),
        company: None,
        message: None,
        booking_date: Some(submission.date),
        booking_time: Some(submission.time),
    };
    state.crm.forward_lead(&lead).await;

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Booking submitted successfully".to_string(),
    }))
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactSubmission {
        ContactSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            company: None,
            service: "strategy".into(),
            message: "Hello".into(),
        }
    }

    fn booking() -> BookingSubmission {
        BookingSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+1-555-0100".into(),
            service: "strategy".into(),
            date: "2026-03-02".into(),
            time: "10:30".into(),
        }
    }

    #[test]
    fn test_valid_submissions_pass() {
        assert!(validate_contact(&contact()).is_ok());
        assert!(validate_booking(&booking()).is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut c = contact();
        c.message = String::new();
        assert_eq!(validate_contact(&c), Err("Missing required fields"));

        let mut b = booking();
        b.phone = String::new();
        assert_eq!(validate_booking(&b), Err("Missing required fields"));
    }

    #[test]
    fn test_company_is_optional() {
        let mut c = contact();
        c.company = Some("Acme".into());
        assert!(validate_contact(&c).is_ok());
        c.company = None;
        assert!(validate_contact(&c).is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        for bad in ["plainaddress", "no@dot", "two@@example.com", "a b@example.com", "@example.com", "user@.com"] {
            let mut c = contact();
            c.email = bad.into();
            assert_eq!(validate_contact(&c), Err("Invalid email format"), "{bad}");
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("first.last+tag@sub.example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@b.c@d"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_oversized_fields_rejected() {
        let mut c = contact();
        c.name = "x".repeat(MAX_FIELD_LEN + 1);
        assert_eq!(validate_contact(&c), Err("Field exceeds maximum length"));

        let mut c = contact();
        c.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(validate_contact(&c), Err("Message exceeds maximum length"));
    }
}
