use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ScreeningStatus, SubmissionId};
use crate::batch::{Applicant, ApplicantReport, TargetStatus};
use crate::platform::PlatformTag;

/// Stored lead plus the joint report once the check has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningRecord {
    pub submission_id: SubmissionId,
    pub applicant: Applicant,
    pub status: ScreeningStatus,
    pub submitted_at: DateTime<Utc>,
    pub report: Option<ApplicantReport>,
}

impl ScreeningRecord {
    pub fn status_view(&self) -> ScreeningStatusView {
        let platforms = match &self.report {
            Some(report) => report
                .verdicts
                .iter()
                .map(|(platform, verdict)| {
                    let view = match verdict {
                        Some(verdict) => PlatformCheckView {
                            metric: verdict.metric.value,
                            threshold: Some(verdict.threshold),
                            status: if verdict.passed {
                                TargetStatus::Passed.label()
                            } else {
                                TargetStatus::Failed.label()
                            },
                        },
                        None => PlatformCheckView {
                            metric: 0,
                            threshold: None,
                            status: TargetStatus::Error.label(),
                        },
                    };
                    (*platform, view)
                })
                .collect(),
            None => BTreeMap::new(),
        };

        ScreeningStatusView {
            submission_id: self.submission_id.clone(),
            name: self.applicant.name.clone(),
            status: self.status.label(),
            final_status: self
                .report
                .as_ref()
                .map(|report| report.final_status.label()),
            platforms,
        }
    }
}

/// Storage seam for lead records so the service can run against any backend.
pub trait ReportStore: Send + Sync {
    fn insert(&self, record: ScreeningRecord) -> Result<ScreeningRecord, StoreError>;
    fn update(&self, record: ScreeningRecord) -> Result<(), StoreError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<ScreeningRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("report store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformCheckView {
    pub metric: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    pub status: &'static str,
}

/// Public shape of a lead's screening state.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningStatusView {
    pub submission_id: SubmissionId,
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_status: Option<&'static str>,
    pub platforms: BTreeMap<PlatformTag, PlatformCheckView>,
}
