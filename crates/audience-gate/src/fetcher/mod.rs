//! Rendered-page capture through a real browser engine.

pub mod markers;
mod webdriver;

pub use markers::{find_neighbor_marker, MarkerVariant, NeighborMarker};
pub use webdriver::{BrowserSettings, WebDriverFetcher};

use crate::resolver::CanonicalTarget;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Markup captured for one target, possibly carrying in-page markers.
///
/// Never cached: audience numbers move continuously, so a stale capture is worthless.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub target: CanonicalTarget,
    pub markup: String,
    pub captured_at: DateTime<Utc>,
}

impl RenderedDocument {
    pub fn new(target: CanonicalTarget, markup: String) -> Self {
        Self {
            target,
            markup,
            captured_at: Utc::now(),
        }
    }
}

/// Failures that abort a single target's render.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("target has no supported platform: {0}")]
    Unsupported(String),
    #[error("browser session could not be started: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("render of {url} exceeded {}s", .timeout.as_secs())]
    Timeout { url: String, timeout: Duration },
}

/// Anything that can turn a canonical target into rendered markup.
///
/// Implementations own their browser session for the duration of one call and must tear
/// it down before returning, whatever the outcome.
#[async_trait]
pub trait RenderFetcher: Send + Sync {
    async fn fetch(
        &self,
        target: &CanonicalTarget,
        timeout: Duration,
    ) -> Result<RenderedDocument, FetchError>;
}
