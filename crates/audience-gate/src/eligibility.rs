//! Threshold comparison, kept apart from extraction so limits stay run-time configuration.

use crate::extractor::MetricResult;
use crate::platform::PlatformTag;
use serde::{Deserialize, Serialize};

/// Minimum audience per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub instagram: u64,
    pub threads: u64,
    pub blog: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            instagram: 1_000,
            threads: 500,
            blog: 300,
        }
    }
}

impl Thresholds {
    pub const fn for_platform(&self, platform: PlatformTag) -> u64 {
        match platform {
            PlatformTag::Instagram => self.instagram,
            PlatformTag::Threads => self.threads,
            PlatformTag::Blog => self.blog,
        }
    }
}

/// Per-request overrides; missing fields fall back to the configured thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub instagram: Option<u64>,
    #[serde(default)]
    pub threads: Option<u64>,
    #[serde(default)]
    pub blog: Option<u64>,
}

impl ThresholdOverrides {
    pub fn apply(&self, base: Thresholds) -> Thresholds {
        Thresholds {
            instagram: self.instagram.unwrap_or(base.instagram),
            threads: self.threads.unwrap_or(base.threads),
            blog: self.blog.unwrap_or(base.blog),
        }
    }
}

/// Pass/fail outcome for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub metric: MetricResult,
    pub threshold: u64,
    pub passed: bool,
}

/// Compare a metric against its platform threshold. Equality passes.
pub fn evaluate(metric: MetricResult, thresholds: &Thresholds) -> Verdict {
    let threshold = thresholds.for_platform(metric.platform);
    evaluate_against(metric, threshold)
}

/// An unmatched metric never passes, even against a zero threshold.
pub fn evaluate_against(metric: MetricResult, threshold: u64) -> Verdict {
    let passed = metric.is_match() && metric.value >= threshold;
    Verdict {
        metric,
        threshold,
        passed,
    }
}
