//! SMTP email channel — async lettre sending.
//!
//! Two mail shapes: the delayed follow-up to a lead, and the sales-inquiry
//! notification to the ops inbox. Both go out through the same STARTTLS
//! relay; neither retries internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use voxlead_core::config::SmtpConfig;
use voxlead_core::error::{Result, VoxleadError};
use voxlead_core::traits::FollowUpSender;
use voxlead_core::types::CallRequest;

/// A contact-form submission, as composed into the ops notification mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInquiry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub use_case: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// SMTP mailer.
pub struct Mailer {
    smtp: SmtpConfig,
}

impl Mailer {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }

    /// True iff SMTP credentials are present.
    pub fn is_smtp_configured(&self) -> bool {
        !self.smtp.user.is_empty() && !self.smtp.password.is_empty()
    }

    /// Send one HTML email via the configured STARTTLS relay.
    async fn deliver(
        &self,
        to: &str,
        reply_to: &str,
        subject: &str,
        html: String,
    ) -> Result<()> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message, message::Mailbox,
            message::header::ContentType, transport::smtp::authentication::Credentials,
        };

        let from_mailbox: Mailbox = format!("{} <{}>", self.smtp.from_name, self.smtp.user)
            .parse()
            .map_err(|e| VoxleadError::Channel(format!("Invalid from: {e}")))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| VoxleadError::Channel(format!("Invalid to: {e}")))?;
        let reply_mailbox: Mailbox = reply_to
            .parse()
            .map_err(|e| VoxleadError::Channel(format!("Invalid reply-to: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .reply_to(reply_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| VoxleadError::Channel(format!("Build email: {e}")))?;

        let creds = Credentials::new(self.smtp.user.clone(), self.smtp.password.clone());
        let mailer = AsyncSmtpTransport::<lettre::Tokio1Executor>::starttls_relay(&self.smtp.host)
            .map_err(|e| VoxleadError::Channel(format!("SMTP relay: {e}")))?
            .port(self.smtp.port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| VoxleadError::Channel(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent to: {to}");
        Ok(())
    }

    /// Send the delayed follow-up for one booking.
    pub async fn send_follow_up(&self, record: &CallRequest) -> Result<()> {
        let Some(to) = record.email.as_deref() else {
            return Err(VoxleadError::InvalidInput(
                "follow-up record has no email".into(),
            ));
        };
        let subject = format!("Thank you for booking a demo with {}!", self.smtp.from_name);
        let html = follow_up_html(
            &self.smtp.from_name,
            record.display_name(),
            Some(record.phone.as_str()),
        );
        self.deliver(to, &self.smtp.user, &subject, html).await
    }

    /// Send a sales-inquiry notification to the ops inbox. Callers treat
    /// this as best-effort.
    pub async fn send_contact_inquiry(&self, inquiry: &ContactInquiry) -> Result<()> {
        if self.smtp.contact_inbox.is_empty() {
            return Err(VoxleadError::Config("contact_inbox not configured".into()));
        }
        let subject = format!(
            "🔔 New sales inquiry from {} {}",
            inquiry.first_name, inquiry.last_name
        );
        let html = contact_inquiry_html(inquiry);
        // Reply-to the lead so ops can answer directly.
        self.deliver(&self.smtp.contact_inbox, &inquiry.email, &subject, html)
            .await
    }
}

#[async_trait]
impl FollowUpSender for Mailer {
    fn is_configured(&self) -> bool {
        self.is_smtp_configured()
    }

    async fn send(&self, record: &CallRequest) -> Result<()> {
        self.send_follow_up(record).await
    }
}

/// Compose the follow-up body for a lead who booked a demo call.
fn follow_up_html(brand: &str, name: &str, phone: Option<&str>) -> String {
    let phone_line = phone
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p><strong>Phone:</strong> {p}</p>"))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto;">
    <div style="background: #667eea; color: white; padding: 32px 20px; text-align: center;">
      <h1 style="margin: 0;">🎉 Thank You for Booking a Demo!</h1>
      <p style="margin: 10px 0 0 0;">We're excited to show you what {brand} can do</p>
    </div>
    <div style="padding: 32px 24px;">
      <p>Hi {name},</p>
      <p>Thank you for booking a demo with {brand}! Our AI agent should have
      reached out to you shortly. If you haven't received a call yet, don't
      worry — we'll be in touch soon.</p>
      {phone_line}
      <p><strong>What's next?</strong> During your demo you'll see how {brand}
      automates customer conversations, qualifies leads, and schedules
      appointments in multiple languages.</p>
    </div>
    <div style="background: #f3f4f6; padding: 20px; text-align: center; font-size: 13px; color: #6b7280;">
      <p style="margin: 0;"><strong>{brand}</strong></p>
      <p style="margin: 5px 0 0 0;">This email was sent because you booked a demo on our website.</p>
    </div>
  </div>
</body>
</html>"#
    )
}

/// Compose the ops notification body for a contact-form submission.
fn contact_inquiry_html(inquiry: &ContactInquiry) -> String {
    let field = |label: &str, value: &str| {
        format!(
            "<p style=\"margin: 12px 0;\"><strong style=\"color: #667eea;\">{label}</strong><br>{value}</p>"
        )
    };

    let mut body = String::new();
    body.push_str(&field(
        "👤 Name",
        &format!("{} {}", inquiry.first_name, inquiry.last_name),
    ));
    body.push_str(&field("📧 Email", &inquiry.email));
    body.push_str(&field("📱 Phone", &inquiry.phone_number));
    body.push_str(&field(
        "🏢 Company",
        inquiry.company.as_deref().unwrap_or("Not provided"),
    ));
    if !inquiry.use_case.is_empty() {
        body.push_str(&field("🎯 Use case", &inquiry.use_case));
    }
    if let Some(notes) = inquiry.notes.as_deref() {
        if !notes.is_empty() {
            body.push_str(&field("📝 Notes", notes));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto;">
    <div style="background: #667eea; color: white; padding: 20px;">
      <h1 style="margin: 0;">🎯 New Sales Inquiry</h1>
    </div>
    <div style="background: #f9fafb; padding: 24px;">
      {body}
    </div>
  </div>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn smtp(user: &str, password: &str) -> SmtpConfig {
        SmtpConfig {
            user: user.into(),
            password: password.into(),
            ..SmtpConfig::default()
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(Mailer::new(smtp("ops@example.com", "app-pass")).is_smtp_configured());
        assert!(!Mailer::new(smtp("", "")).is_smtp_configured());
        assert!(!Mailer::new(smtp("ops@example.com", "")).is_smtp_configured());
    }

    #[test]
    fn test_follow_up_html_includes_name_and_phone() {
        let html = follow_up_html("Voxlead", "Asha", Some("+919876543210"));
        assert!(html.contains("Hi Asha,"));
        assert!(html.contains("+919876543210"));
        assert!(html.contains("Voxlead"));
    }

    #[test]
    fn test_follow_up_html_omits_empty_phone() {
        let html = follow_up_html("Voxlead", "Asha", Some(""));
        assert!(!html.contains("<strong>Phone:</strong>"));
    }

    #[test]
    fn test_follow_up_uses_display_name_fallback() {
        let record =
            CallRequest::new("", Some("lead@example.com"), "+15551234567", Duration::zero());
        let html = follow_up_html("Voxlead", record.display_name(), Some(&record.phone));
        assert!(html.contains("Hi Valued Customer,"));
    }

    #[test]
    fn test_contact_inquiry_html_optional_fields() {
        let inquiry = ContactInquiry {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            phone_number: "+919876543210".into(),
            company: None,
            use_case: "Lead qualification".into(),
            notes: None,
        };
        let html = contact_inquiry_html(&inquiry);
        assert!(html.contains("Asha Rao"));
        assert!(html.contains("Not provided"));
        assert!(html.contains("Lead qualification"));
        assert!(!html.contains("📝 Notes"));
    }
}
