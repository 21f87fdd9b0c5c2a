//! The dispatch run — fetch, process, mark.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use voxlead_core::error::Result;
use voxlead_core::traits::{FollowUpSender, FollowUpStore};
use voxlead_core::types::{DispatchReport, RecordError};

/// Phases of one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Processing,
    Done,
}

/// The dispatch job. Store and sender handles are injected at
/// construction; the job itself holds no other state.
#[derive(Clone)]
pub struct DispatchJob {
    store: Arc<dyn FollowUpStore>,
    sender: Arc<dyn FollowUpSender>,
}

impl DispatchJob {
    pub fn new(store: Arc<dyn FollowUpStore>, sender: Arc<dyn FollowUpSender>) -> Self {
        Self { store, sender }
    }

    /// Execute one run at `now`.
    ///
    /// A fetch-phase store failure aborts the run with a run-level error
    /// and zero sender invocations. Per-record failures never abort the
    /// loop: a failed send leaves the record eligible for the next run,
    /// and a failed mark after a successful send is logged as a distinct
    /// inconsistent-state error (the record may be re-sent next run).
    pub async fn run(&self, now: DateTime<Utc>) -> Result<DispatchReport> {
        let mut phase = RunPhase::Idle;
        tracing::trace!("Dispatch run phase: {phase:?}");

        if !self.sender.is_configured() {
            tracing::warn!("⚠️ Email sender not configured — skipping dispatch run");
            return Ok(DispatchReport::skipped("email sender not configured"));
        }

        phase = RunPhase::Fetching;
        tracing::trace!("Dispatch run phase: {phase:?}");
        let records = self.store.find_due(now).await?;

        if records.is_empty() {
            tracing::debug!("No due follow-ups");
            return Ok(DispatchReport {
                message: Some("no due follow-ups".into()),
                ..DispatchReport::default()
            });
        }

        tracing::info!("📧 Found {} due follow-up(s)", records.len());
        phase = RunPhase::Processing;
        tracing::trace!("Dispatch run phase: {phase:?}");

        let mut report = DispatchReport {
            processed: records.len(),
            ..DispatchReport::default()
        };

        for record in &records {
            // find_due already excludes recipient-less rows; a record
            // reaching here without one is a store contract violation.
            if record.email.is_none() {
                tracing::warn!("⚠️ Skipping {} — record has no recipient", record.id);
                continue;
            }

            match self.sender.send(record).await {
                Ok(()) => {
                    report.succeeded += 1;
                    match self.store.mark_sent(&record.id, now).await {
                        Ok(()) => {
                            tracing::info!("✅ Follow-up sent ({})", record.id);
                        }
                        Err(e) => {
                            report.mark_failed += 1;
                            tracing::error!(
                                "❌ Inconsistent state: follow-up {} sent but not marked — may be re-sent next run: {e}",
                                record.id
                            );
                        }
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(RecordError {
                        id: record.id.clone(),
                        message: e.to_string(),
                    });
                    tracing::error!("❌ Follow-up for {} failed: {e}", record.id);
                }
            }
        }

        phase = RunPhase::Done;
        tracing::trace!("Dispatch run phase: {phase:?}");
        tracing::info!(
            "📊 Dispatch run complete: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );
        Ok(report)
    }
}

/// Run the dispatch job on a fixed interval, forever. Spawned as a
/// background tokio task when in-process dispatch is enabled; external
/// schedulers hit the HTTP trigger instead.
pub async fn spawn_dispatch_loop(job: DispatchJob, interval_secs: u64) {
    tracing::info!("⏰ Dispatch loop started (every {interval_secs}s)");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;
        match job.run(Utc::now()).await {
            Ok(report) if report.processed > 0 => {
                tracing::info!(
                    "📣 Dispatch: {}/{} follow-up(s) sent",
                    report.succeeded,
                    report.processed
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!("❌ Dispatch run failed: {e}"),
        }
    }
}
