//! API route handlers for the gateway.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use chrono::{Duration, Utc};
use serde::Deserialize;

use voxlead_channels::ContactInquiry;
use voxlead_core::types::CallRequest;
use voxlead_core::validate::{is_valid_email, is_valid_phone, normalize_phone};

use super::server::AppState;

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "voxlead-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// System information endpoint.
pub async fn system_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "service": "voxlead-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.as_secs(),
        "leads": state.store.count().unwrap_or(0),
        "dispatch": {
            "interval_secs": state.config.dispatch.interval_secs,
            "follow_up_delay_secs": state.config.dispatch.follow_up_delay_secs,
            "cron_secret_set": state.cron_secret.is_some(),
        },
        "smtp_configured": state.mailer.is_smtp_configured(),
        "voice_configured": state.voice.is_configured(),
    }))
}

/// Demo-call booking payload.
#[derive(Debug, Deserialize)]
pub struct CallIntakeBody {
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validate and normalize an intake payload. Returns (phone, email) or a
/// caller-facing error message.
fn validate_intake(body: &CallIntakeBody) -> std::result::Result<(String, Option<String>), String> {
    let phone = normalize_phone(&body.phone);
    if !is_valid_phone(&phone) {
        return Err("Use E.164 phone, e.g. +919876543210".into());
    }
    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(e) = email {
        if !is_valid_email(e) {
            return Err("Invalid email format".into());
        }
    }
    Ok((phone, email.map(String::from)))
}

/// Lead intake — store the booking, then place the demo call.
///
/// The row is written before the vendor call so the follow-up schedule
/// survives a vendor failure.
pub async fn call_intake(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CallIntakeBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (phone, email) = match validate_intake(&body) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": message})),
            );
        }
    };

    if !state.voice.is_configured() {
        tracing::error!("Voice vendor credentials missing — rejecting intake");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Voice vendor not configured"})),
        );
    }

    let delay = Duration::seconds(state.config.dispatch.follow_up_delay_secs as i64);
    let record = CallRequest::new(&body.name, email.as_deref(), &phone, delay);

    if let Err(e) = state.store.insert(&record) {
        tracing::error!("❌ Failed to save call request: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save call request"})),
        );
    }
    tracing::info!("📅 Call request saved: {} ({})", record.id, phone);

    match state.voice.place_call(&phone, record.display_name()).await {
        Ok(vendor) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "id": record.id,
                "call": vendor,
            })),
        ),
        Err(e) => {
            tracing::error!("❌ Outbound call failed for {}: {e}", record.id);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": e.to_string(), "id": record.id})),
            )
        }
    }
}

/// Contact form — validate, log, and notify the ops inbox best-effort.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    Json(inquiry): Json<ContactInquiry>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(message) = validate_inquiry(&inquiry) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        );
    }

    tracing::info!(
        "📬 Contact inquiry from {} {} <{}>",
        inquiry.first_name,
        inquiry.last_name,
        inquiry.email
    );

    if state.mailer.is_smtp_configured() {
        // Notification failure must not fail the submission.
        if let Err(e) = state.mailer.send_contact_inquiry(&inquiry).await {
            tracing::error!("❌ Failed to send inquiry notification: {e}");
        }
    } else {
        tracing::warn!("⚠️ SMTP not configured — skipping inquiry notification");
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "message": "Form submitted successfully",
        })),
    )
}

fn validate_inquiry(inquiry: &ContactInquiry) -> std::result::Result<(), String> {
    if inquiry.first_name.trim().is_empty() {
        return Err("First name is required".into());
    }
    if inquiry.last_name.trim().is_empty() {
        return Err("Last name is required".into());
    }
    if inquiry.email.trim().is_empty() {
        return Err("Email is required".into());
    }
    if inquiry.phone_number.trim().is_empty() {
        return Err("Phone number is required".into());
    }
    if !is_valid_email(inquiry.email.trim()) {
        return Err("Invalid email format".into());
    }
    Ok(())
}

/// Bearer check for the cron trigger. No configured secret = open.
fn bearer_authorized(expected: Option<&str>, header: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(secret) => header.is_some_and(|h| h == format!("Bearer {secret}")),
    }
}

/// Dispatch trigger — runs one fetch-process-mark pass and returns the
/// run report.
pub async fn cron_dispatch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    if !bearer_authorized(state.cron_secret.as_deref(), auth) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Unauthorized"})),
        );
    }

    match state.job.run(Utc::now()).await {
        Ok(report) => {
            let body = serde_json::to_value(&report).unwrap_or_default();
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::error!("❌ Dispatch run failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Dispatch run failed",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(phone: &str, email: Option<&str>) -> CallIntakeBody {
        CallIntakeBody {
            phone: phone.into(),
            name: "Asha".into(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn test_validate_intake_normalizes_phone() {
        let (phone, email) =
            validate_intake(&intake("91 98765 43210", Some("a@example.com"))).unwrap();
        assert_eq!(phone, "+919876543210");
        assert_eq!(email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_validate_intake_rejects_bad_phone() {
        assert!(validate_intake(&intake("012345", None)).is_err());
        assert!(validate_intake(&intake("not-a-phone", None)).is_err());
    }

    #[test]
    fn test_validate_intake_rejects_bad_email() {
        assert!(validate_intake(&intake("+919876543210", Some("nope"))).is_err());
    }

    #[test]
    fn test_validate_intake_blank_email_is_none() {
        let (_, email) = validate_intake(&intake("+919876543210", Some("   "))).unwrap();
        assert!(email.is_none());
    }

    #[test]
    fn test_bearer_authorized() {
        assert!(bearer_authorized(None, None));
        assert!(bearer_authorized(None, Some("Bearer whatever")));
        assert!(bearer_authorized(Some("s3cret"), Some("Bearer s3cret")));
        assert!(!bearer_authorized(Some("s3cret"), Some("Bearer wrong")));
        assert!(!bearer_authorized(Some("s3cret"), Some("s3cret")));
        assert!(!bearer_authorized(Some("s3cret"), None));
    }

    #[test]
    fn test_intake_body_defaults() {
        let body: CallIntakeBody =
            serde_json::from_str(r#"{"phone": "+919876543210"}"#).unwrap();
        assert_eq!(body.phone, "+919876543210");
        assert!(body.name.is_empty());
        assert!(body.email.is_none());
    }

    #[test]
    fn test_validate_inquiry() {
        let inquiry = ContactInquiry {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            phone_number: "+919876543210".into(),
            company: None,
            use_case: String::new(),
            notes: None,
        };
        assert!(validate_inquiry(&inquiry).is_ok());

        let mut missing = inquiry.clone();
        missing.first_name = "  ".into();
        assert!(validate_inquiry(&missing).is_err());

        let mut bad_email = inquiry;
        bad_email.email = "nope".into();
        assert!(validate_inquiry(&bad_email).is_err());
    }
}
