use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::domain::{CheckRequest, LeadSubmission, ScreeningStatus, SubmissionId};
use super::repository::{ReportStore, ScreeningRecord, StoreError};
use crate::batch::{BatchError, BatchOrchestrator, PipelineSettings, TargetRow};
use crate::eligibility::Thresholds;
use crate::fetcher::RenderFetcher;

/// Service joining the batch orchestrator with the report store.
///
/// Every pipeline run, whether an ad-hoc check or a lead screening, holds `session` for its
/// whole duration, so at most one browser session is open per service.
pub struct ScreeningService<F, S> {
    fetcher: Arc<F>,
    store: Arc<S>,
    settings: PipelineSettings,
    session: Mutex<()>,
}

/// Attempts at persisting a finished report before the lead is left pending.
const REPORT_WRITE_ATTEMPTS: usize = 3;

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("lead-{id:06}"))
}

impl<F, S> ScreeningService<F, S>
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    pub fn new(fetcher: Arc<F>, store: Arc<S>, settings: PipelineSettings) -> Self {
        Self {
            fetcher,
            store,
            settings,
            session: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Check free-text identifiers, applying any per-request threshold overrides.
    pub async fn check_targets(
        &self,
        request: CheckRequest,
    ) -> Result<(Vec<TargetRow>, Thresholds), ScreeningError> {
        let settings = PipelineSettings {
            thresholds: request.thresholds.apply(self.settings.thresholds),
            ..self.settings
        };
        let orchestrator = BatchOrchestrator::new(Arc::clone(&self.fetcher), settings);

        let _session = self.session.lock().await;
        let rows = orchestrator
            .run_inputs(&request.targets, |progress| {
                debug!(
                    index = progress.index,
                    total = progress.total,
                    percent = progress.percent,
                    "check progress"
                );
            })
            .await?;
        Ok((rows, settings.thresholds))
    }

    /// Store a lead. Leads without any platform link are recorded as excluded.
    pub fn submit(&self, submission: LeadSubmission) -> Result<ScreeningRecord, ScreeningError> {
        let applicant = submission.into_applicant();
        let status = if applicant.has_submissions() {
            ScreeningStatus::Pending
        } else {
            ScreeningStatus::Excluded
        };

        let record = ScreeningRecord {
            submission_id: next_submission_id(),
            applicant,
            status,
            submitted_at: Utc::now(),
            report: None,
        };
        let stored = self.store.insert(record)?;
        info!(
            submission_id = %stored.submission_id.0,
            status = stored.status.label(),
            "lead stored"
        );
        Ok(stored)
    }

    /// Run the joint check for a pending lead and persist the report.
    pub async fn screen(&self, id: &SubmissionId) -> Result<ScreeningRecord, ScreeningError> {
        let mut record = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        if record.status != ScreeningStatus::Pending {
            return Ok(record);
        }

        let orchestrator = BatchOrchestrator::new(Arc::clone(&self.fetcher), self.settings);
        let batch = {
            let _session = self.session.lock().await;
            orchestrator
                .run_applicants(vec![record.applicant.clone()], |_| {})
                .await?
        };

        record.report = batch.reports.into_iter().next();
        record.status = ScreeningStatus::Completed;
        self.persist_report(&record)?;
        info!(
            submission_id = %id.0,
            final_status = record.report.as_ref().map(|report| report.final_status.label()),
            "lead screened"
        );
        Ok(record)
    }

    fn persist_report(&self, record: &ScreeningRecord) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match self.store.update(record.clone()) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < REPORT_WRITE_ATTEMPTS => {
                    warn!(
                        submission_id = %record.submission_id.0,
                        attempt,
                        error = %err,
                        "report write failed, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn get(&self, id: &SubmissionId) -> Result<ScreeningRecord, ScreeningError> {
        let record = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
