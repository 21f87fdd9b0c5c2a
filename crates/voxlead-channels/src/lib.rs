//! Outbound side-effects: follow-up/notification email over SMTP, and the
//! voice vendor's outbound-call API.

pub mod email;
pub mod voice;

pub use email::{ContactInquiry, Mailer};
pub use voice::VoiceClient;
