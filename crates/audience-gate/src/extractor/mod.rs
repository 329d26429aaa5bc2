//! Metric extraction: one ordered strategy cascade per platform.
//!
//! Every strategy is an independent function over captured markup. The first strategy that
//! yields a positive value wins; results are never merged across strategies. A page that no
//! strategy understands produces a zero metric with no strategy name, which callers treat
//! as a legitimate "unknown" rather than an error.

mod blog;
mod instagram;
pub mod numeric;
mod page;
mod threads;

pub use page::Page;

use crate::fetcher::RenderedDocument;
use crate::platform::PlatformTag;
use serde::Serialize;
use tracing::debug;

/// One named rule in a platform cascade.
pub struct Strategy {
    pub name: &'static str,
    run: fn(&Page<'_>) -> Option<u64>,
}

impl Strategy {
    pub(crate) const fn new(name: &'static str, run: fn(&Page<'_>) -> Option<u64>) -> Self {
        Self { name, run }
    }

    /// Apply the rule; non-positive values count as no match.
    pub fn apply(&self, page: &Page<'_>) -> Option<u64> {
        (self.run)(page).filter(|value| *value > 0)
    }
}

/// The audience number read for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricResult {
    pub platform: PlatformTag,
    pub value: u64,
    pub strategy_used: Option<&'static str>,
}

impl MetricResult {
    pub fn unmatched(platform: PlatformTag) -> Self {
        Self {
            platform,
            value: 0,
            strategy_used: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.strategy_used.is_some()
    }
}

/// Ordered cascade for a platform.
pub fn strategies(platform: PlatformTag) -> &'static [Strategy] {
    match platform {
        PlatformTag::Instagram => instagram::STRATEGIES,
        PlatformTag::Threads => threads::STRATEGIES,
        PlatformTag::Blog => blog::STRATEGIES,
    }
}

/// Run the platform cascade over raw markup.
pub fn extract_markup(platform: PlatformTag, markup: &str) -> MetricResult {
    let page = Page::new(markup);
    for strategy in strategies(platform) {
        if let Some(value) = strategy.apply(&page) {
            debug!(%platform, strategy = strategy.name, value, "metric extracted");
            return MetricResult {
                platform,
                value,
                strategy_used: Some(strategy.name),
            };
        }
    }
    debug!(%platform, "no extraction strategy matched");
    MetricResult::unmatched(platform)
}

/// Extract the metric for a rendered document.
///
/// Returns `None` only when the document's target carries no platform, which the fetcher
/// never produces.
pub fn extract(document: &RenderedDocument) -> Option<MetricResult> {
    let platform = document.target.platform?;
    Some(extract_markup(platform, &document.markup))
}
