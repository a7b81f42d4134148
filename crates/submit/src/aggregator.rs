//! Vote tally batch job.
//!
//! Drains a full table scan, hands the records to the pure planner in
//! `submit_core::ranking`, then writes one `SubmissionRank` per ranked
//! submission. A scan failure aborts before anything is written; a failed
//! rank write is recorded and the remaining ranks are still written.

use std::sync::Arc;

use chrono::Utc;
use serde::{Serialize, Serializer};

use submit_core::entity::{Entity, Record};
use submit_core::ranking::plan_tally;
use submit_core::storage::{EntityStore, Result, StoreError};

use crate::cancellation::Cancellation;

/// A rank that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankFailure {
    pub submission_id: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: StoreError,
}

/// Outcome of one tally run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TallyReport {
    /// Records read by the scan.
    pub scanned: usize,
    /// Scan pages fetched.
    pub pages: usize,
    /// Ranks written.
    pub ranked: usize,
    /// Submissions with votes but no submission record.
    pub orphaned: usize,
    /// Submission ids that matched more than one submission record.
    pub conflicting: usize,
    /// Vote records that could not be decoded.
    pub malformed_votes: usize,
    pub failed: Vec<RankFailure>,
}

impl TallyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn serialize_display<S>(error: &StoreError, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

/// Recomputes every submission's rank from its votes.
///
/// Every run is a full recompute over a non-isolated scan: votes written
/// while the scan is in progress may or may not be counted, and the whole
/// table is held in memory until the run ends.
pub struct VoteAggregator<S> {
    store: Arc<S>,
    cancel: Cancellation,
}

impl<S> VoteAggregator<S>
where
    S: EntityStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cancel: Cancellation::never(),
        }
    }

    /// Binds a cancellation token that interrupts the scan and rank writes.
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self) -> Result<TallyReport> {
        let mut report = TallyReport::default();

        let records = match self.drain_scan(&mut report).await {
            Ok(records) => records,
            Err(StoreError::Cancelled) => {
                tracing::info!(pages = report.pages, "Tally cancelled during scan");
                return Err(StoreError::Cancelled);
            }
            Err(err) => {
                tracing::error!(error = %err, pages = report.pages, "Tally aborted during scan");
                return Err(err);
            }
        };
        report.scanned = records.len();

        let plan = plan_tally(&records, Utc::now());
        report.orphaned = plan.orphaned.len();
        report.conflicting = plan.conflicting.len();
        report.malformed_votes = plan.malformed_votes;

        for submission_id in &plan.orphaned {
            tracing::debug!(submission_id = %submission_id, "Skipping votes without submission");
        }
        for submission_id in &plan.conflicting {
            tracing::warn!(
                submission_id = %submission_id,
                "Skipping votes whose submission id is not unique"
            );
        }
        if plan.malformed_votes > 0 {
            tracing::warn!(count = plan.malformed_votes, "Ignored malformed votes");
        }

        for rank in &plan.ranks {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    ranked = report.ranked,
                    remaining = plan.ranks.len() - report.ranked - report.failed.len(),
                    "Tally cancelled"
                );
                return Err(StoreError::Cancelled);
            }

            let written = match rank.to_record() {
                Ok(record) => tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
                    written = self.store.put(&record) => written,
                },
                Err(err) => Err(err),
            };
            match written {
                Err(StoreError::Cancelled) => {
                    tracing::info!(
                        ranked = report.ranked,
                        submission_id = %rank.submission_id,
                        "Tally cancelled during rank write"
                    );
                    return Err(StoreError::Cancelled);
                }
                Ok(()) => report.ranked += 1,
                Err(err) => {
                    tracing::warn!(
                        submission_id = %rank.submission_id,
                        error = %err,
                        "Failed to write rank"
                    );
                    report.failed.push(RankFailure {
                        submission_id: rank.submission_id.clone(),
                        error: err,
                    });
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            pages = report.pages,
            ranked = report.ranked,
            orphaned = report.orphaned,
            conflicting = report.conflicting,
            failed = report.failed.len(),
            "Tally finished"
        );
        Ok(report)
    }

    /// Reads the whole table, page by page.
    async fn drain_scan(&self, report: &mut TallyReport) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut cursor = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            let page = tokio::select! {
                _ = self.cancel.cancelled() => return Err(StoreError::Cancelled),
                page = self.store.scan_all(cursor.as_ref()) => page?,
            };
            report.pages += 1;
            records.extend(page.items);
            tracing::debug!(pages = report.pages, records = records.len(), "Scanned page");

            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(records),
            }
        }
    }
}
