//! Sequential batch runs: one target at a time, paced, in submission order.

pub mod applicants;

pub use applicants::{fold_report, Applicant, ApplicantReport, FinalStatus};

use crate::eligibility::{evaluate, Thresholds, Verdict};
use crate::extractor::extract;
use crate::fetcher::{FetchError, RenderFetcher};
use crate::platform::PlatformTag;
use crate::resolver::{resolve, CanonicalTarget};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Knobs that apply to every target of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub thresholds: Thresholds,
    /// Wait between finishing one target and starting the next.
    pub pacing: Duration,
    /// Overall budget for one render, including browser start-up.
    pub target_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            pacing: Duration::from_secs(2),
            target_timeout: Duration::from_secs(60),
        }
    }
}

/// How one target ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetOutcome {
    Checked(Verdict),
    Unsupported,
    FetchFailed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Passed,
    Failed,
    Error,
}

impl TargetStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TargetStatus::Passed => "passed",
            TargetStatus::Failed => "failed",
            TargetStatus::Error => "error",
        }
    }
}

impl TargetOutcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            TargetOutcome::Checked(verdict) => Some(verdict),
            _ => None,
        }
    }

    pub fn status(&self) -> TargetStatus {
        match self {
            TargetOutcome::Checked(verdict) if verdict.passed => TargetStatus::Passed,
            TargetOutcome::Checked(_) => TargetStatus::Failed,
            TargetOutcome::Unsupported | TargetOutcome::FetchFailed { .. } => TargetStatus::Error,
        }
    }

    /// Metric value, zero for errored targets.
    pub fn metric_value(&self) -> u64 {
        self.verdict().map(|verdict| verdict.metric.value).unwrap_or(0)
    }
}

/// One result row, carrying its position in the submitted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRow {
    pub index: usize,
    pub target: CanonicalTarget,
    pub outcome: TargetOutcome,
}

impl TargetRow {
    /// Threshold that applied to this row, if the platform is known.
    pub fn threshold(&self, thresholds: &Thresholds) -> Option<u64> {
        match &self.outcome {
            TargetOutcome::Checked(verdict) => Some(verdict.threshold),
            _ => self
                .target
                .platform
                .map(|platform| thresholds.for_platform(platform)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// 1-based position of the target just finished.
    pub index: usize,
    pub total: usize,
    pub percent: u8,
}

impl BatchProgress {
    fn new(index: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((index * 100) / total).min(100) as u8
        };
        Self {
            index,
            total,
            percent,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("batch contains no targets")]
    Empty,
}

/// Rows for every submitted link plus one report per applicant with submissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantBatch {
    pub rows: Vec<TargetRow>,
    pub reports: Vec<ApplicantReport>,
}

/// Run the full pipeline for a single resolved target.
pub async fn check_target<F>(
    fetcher: &F,
    target: &CanonicalTarget,
    settings: &PipelineSettings,
) -> TargetOutcome
where
    F: RenderFetcher + ?Sized,
{
    if target.platform.is_none() {
        warn!(input = %target.raw_input, "unsupported platform");
        return TargetOutcome::Unsupported;
    }

    let document = match fetcher.fetch(target, settings.target_timeout).await {
        Ok(document) => document,
        Err(FetchError::Unsupported(_)) => return TargetOutcome::Unsupported,
        Err(err) => {
            warn!(url = %target.url, error = %err, "fetch failed");
            return TargetOutcome::FetchFailed {
                reason: err.to_string(),
            };
        }
    };

    match extract(&document) {
        Some(metric) => TargetOutcome::Checked(evaluate(metric, &settings.thresholds)),
        None => TargetOutcome::Unsupported,
    }
}

/// Drives targets through resolve, fetch, extract, and evaluate, strictly one at a time.
pub struct BatchOrchestrator<F: ?Sized> {
    fetcher: Arc<F>,
    settings: PipelineSettings,
}

impl<F> BatchOrchestrator<F>
where
    F: RenderFetcher + ?Sized,
{
    pub fn new(fetcher: Arc<F>, settings: PipelineSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Check one free-text identifier with no pacing.
    pub async fn check(&self, input: &str) -> TargetRow {
        let target = resolve(input);
        let outcome = check_target(self.fetcher.as_ref(), &target, &self.settings).await;
        TargetRow {
            index: 0,
            target,
            outcome,
        }
    }

    /// Begin a run over already resolved targets.
    pub fn start(&self, targets: Vec<CanonicalTarget>) -> Result<BatchRun<'_, F>, BatchError> {
        if targets.is_empty() {
            return Err(BatchError::Empty);
        }
        Ok(BatchRun {
            orchestrator: self,
            targets,
            next: 0,
        })
    }

    /// Resolve and check a flat list of identifiers. Blank entries are skipped.
    pub async fn run_inputs<P>(
        &self,
        inputs: &[String],
        on_progress: P,
    ) -> Result<Vec<TargetRow>, BatchError>
    where
        P: FnMut(&BatchProgress),
    {
        let targets: Vec<CanonicalTarget> = inputs
            .iter()
            .filter(|input| !input.trim().is_empty())
            .map(|input| resolve(input))
            .collect();
        Ok(self.start(targets)?.run_to_end(on_progress).await)
    }

    /// Check every applicant's links and fold the results into reports.
    ///
    /// The applicant list is owned by this call; nothing is shared between runs.
    pub async fn run_applicants<P>(
        &self,
        applicants: Vec<Applicant>,
        on_progress: P,
    ) -> Result<ApplicantBatch, BatchError>
    where
        P: FnMut(&BatchProgress),
    {
        let mut owners: Vec<(usize, PlatformTag)> = Vec::new();
        let mut targets = Vec::new();
        for (applicant_index, applicant) in applicants.iter().enumerate() {
            for platform in PlatformTag::ALL {
                if let Some(target) = applicant.submissions.get(&platform) {
                    owners.push((applicant_index, platform));
                    targets.push(target.clone());
                }
            }
        }

        let rows = self.start(targets)?.run_to_end(on_progress).await;

        let mut outcomes: Vec<BTreeMap<PlatformTag, TargetOutcome>> =
            vec![BTreeMap::new(); applicants.len()];
        for (row, (applicant_index, platform)) in rows.iter().zip(&owners) {
            outcomes[*applicant_index].insert(*platform, row.outcome.clone());
        }

        let reports = applicants
            .into_iter()
            .zip(outcomes)
            .filter_map(|(applicant, outcomes)| fold_report(applicant, outcomes))
            .collect();

        Ok(ApplicantBatch { rows, reports })
    }
}

/// An in-progress batch. Each call to [`BatchRun::next`] processes exactly one target, so a
/// caller stops early simply by not asking for more.
pub struct BatchRun<'a, F: ?Sized> {
    orchestrator: &'a BatchOrchestrator<F>,
    targets: Vec<CanonicalTarget>,
    next: usize,
}

impl<F> BatchRun<'_, F>
where
    F: RenderFetcher + ?Sized,
{
    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn remaining(&self) -> usize {
        self.targets.len() - self.next
    }

    /// Process the next target. Pacing is applied before every target but the first, which
    /// spaces consecutive renders without delaying a caller that stops early.
    pub async fn next(&mut self) -> Option<(TargetRow, BatchProgress)> {
        let target = self.targets.get(self.next)?.clone();
        let settings = &self.orchestrator.settings;
        if self.next > 0 && !settings.pacing.is_zero() {
            tokio::time::sleep(settings.pacing).await;
        }

        let index = self.next;
        self.next += 1;

        let outcome = check_target(self.orchestrator.fetcher.as_ref(), &target, settings).await;
        let progress = BatchProgress::new(self.next, self.targets.len());
        info!(
            index = progress.index,
            total = progress.total,
            percent = progress.percent,
            url = %target.url,
            status = outcome.status().label(),
            metric = outcome.metric_value(),
            "target processed"
        );

        Some((
            TargetRow {
                index,
                target,
                outcome,
            },
            progress,
        ))
    }

    pub async fn run_to_end<P>(mut self, mut on_progress: P) -> Vec<TargetRow>
    where
        P: FnMut(&BatchProgress),
    {
        let mut rows = Vec::with_capacity(self.remaining());
        while let Some((row, progress)) = self.next().await {
            on_progress(&progress);
            rows.push(row);
        }
        rows
    }
}
