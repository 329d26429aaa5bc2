use crate::batch::{Applicant, TargetRow, TargetStatus};
use crate::eligibility::{ThresholdOverrides, Thresholds};
use crate::platform::PlatformTag;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for lead-form submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Payload produced by the public lead form. Required fields are validated upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub threads_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub blog_url: Option<String>,
}

impl LeadSubmission {
    pub fn into_applicant(self) -> Applicant {
        let LeadSubmission {
            name,
            contact,
            threads_url,
            instagram_url,
            blog_url,
        } = self;

        let mut applicant = Applicant::new(name.trim());
        if let Some(contact) = contact {
            applicant = applicant.with_contact(contact);
        }
        for (platform, link) in [
            (PlatformTag::Threads, threads_url),
            (PlatformTag::Instagram, instagram_url),
            (PlatformTag::Blog, blog_url),
        ] {
            if let Some(link) = link {
                applicant = applicant.with_link(platform, &link);
            }
        }
        applicant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    Pending,
    Completed,
    /// Nothing to check: the lead carried no platform links.
    Excluded,
}

impl ScreeningStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScreeningStatus::Pending => "pending",
            ScreeningStatus::Completed => "completed",
            ScreeningStatus::Excluded => "excluded",
        }
    }
}

/// Ad-hoc check of free-text identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub targets: Vec<String>,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

/// Flattened row for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct TargetRowView {
    pub index: usize,
    pub input: String,
    pub url: String,
    pub platform: Option<PlatformTag>,
    pub metric: u64,
    pub threshold: Option<u64>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetRowView {
    pub fn from_row(row: &TargetRow, thresholds: &Thresholds) -> Self {
        let error = match &row.outcome {
            crate::batch::TargetOutcome::FetchFailed { reason } => Some(reason.clone()),
            crate::batch::TargetOutcome::Unsupported => Some("unsupported platform".to_string()),
            crate::batch::TargetOutcome::Checked(_) => None,
        };
        Self {
            index: row.index,
            input: row.target.raw_input.clone(),
            url: row.target.url.clone(),
            platform: row.target.platform,
            metric: row.outcome.metric_value(),
            threshold: row.threshold(thresholds),
            status: row.outcome.status().label(),
            strategy: row
                .outcome
                .verdict()
                .and_then(|verdict| verdict.metric.strategy_used),
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub thresholds: Thresholds,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub rows: Vec<TargetRowView>,
}

impl CheckResponse {
    pub fn new(rows: &[TargetRow], thresholds: Thresholds) -> Self {
        let count = |status: TargetStatus| {
            rows.iter()
                .filter(|row| row.outcome.status() == status)
                .count()
        };
        Self {
            thresholds,
            passed: count(TargetStatus::Passed),
            failed: count(TargetStatus::Failed),
            errored: count(TargetStatus::Error),
            rows: rows
                .iter()
                .map(|row| TargetRowView::from_row(row, &thresholds))
                .collect(),
        }
    }
}
