//! Trait seams the dispatch job is built against.
//!
//! The store and the sender are injected handles, constructed at process
//! start (or per invocation) and passed in — never module-global state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::CallRequest;

/// Persistent store of pending follow-up records, as seen by the
/// dispatch job.
#[async_trait]
pub trait FollowUpStore: Send + Sync {
    /// All records with a recipient, no `email_sent_at`, and a due time at
    /// or before `now`, ordered by due time ascending so the oldest-due
    /// records are attempted first.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<CallRequest>>;

    /// Stamp `email_sent_at` for one record. Must be a no-op (not an
    /// error) when the record is already marked — first write wins.
    async fn mark_sent(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()>;
}

/// Outbound follow-up delivery. One invocation attempt per run; retry is
/// deferred to the next run re-selecting the still-unsent record.
#[async_trait]
pub trait FollowUpSender: Send + Sync {
    /// Whether the sender has credentials to actually deliver. An
    /// unconfigured sender short-circuits the run to zero processed.
    fn is_configured(&self) -> bool;

    /// Deliver the follow-up for one record.
    async fn send(&self, record: &CallRequest) -> Result<()>;
}
