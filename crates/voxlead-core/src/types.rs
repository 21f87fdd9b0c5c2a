//! Lead records and dispatch run reporting — the core data model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A demo-call booking captured by the intake endpoint.
///
/// `email_sent_at` is written exactly once, by the dispatch job, on a
/// confirmed follow-up send. Rows are never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// Unique record ID (UUID v4).
    pub id: String,
    /// Lead's name. May be empty; use [`CallRequest::display_name`] when rendering.
    pub name: String,
    /// Follow-up recipient. A row without an email is never dispatched.
    pub email: Option<String>,
    /// E.164 phone number the demo call was placed to.
    pub phone: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the follow-up email becomes due. None = no follow-up wanted.
    pub scheduled_email_at: Option<DateTime<Utc>>,
    /// When the follow-up email was confirmed sent. None = not yet sent.
    pub email_sent_at: Option<DateTime<Utc>>,
}

impl CallRequest {
    /// Create a new booking. The follow-up is scheduled `delay` after now,
    /// and only when a recipient email was supplied.
    pub fn new(name: &str, email: Option<&str>, phone: &str, delay: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            phone: phone.to_string(),
            created_at: now,
            scheduled_email_at: None,
            email_sent_at: None,
        }
        .with_schedule(now, delay)
    }

    fn with_schedule(mut self, now: DateTime<Utc>, delay: Duration) -> Self {
        self.scheduled_email_at = self.email.as_ref().map(|_| now + delay);
        self
    }

    /// Whether this record is eligible for dispatch at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.email.is_some()
            && self.email_sent_at.is_none()
            && self.scheduled_email_at.is_some_and(|due| due <= now)
    }

    /// Name to use when addressing the lead.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Valued Customer"
        } else {
            &self.name
        }
    }
}

/// One failed record in a dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    pub id: String,
    pub message: String,
}

/// Outcome of one dispatch run — the only output contract the HTTP
/// trigger needs to expose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Due records selected this run.
    pub processed: usize,
    /// Records whose follow-up send succeeded.
    pub succeeded: usize,
    /// Records whose follow-up send failed (retried next run).
    pub failed: usize,
    /// Sends that succeeded but could not be marked sent — the
    /// inconsistent-state case, kept separate from ordinary failures.
    pub mark_failed: usize,
    /// Per-record send errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RecordError>,
    /// Optional operator-facing note (e.g. mailer not configured).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DispatchReport {
    /// Report for a run that was skipped before fetching.
    pub fn skipped(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::default()
        }
    }
}
