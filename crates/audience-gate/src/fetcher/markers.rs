//! Synthetic markers carrying values read from a live page into captured markup.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*audience-gate:neighbors:(mobile|desktop)=(\d+)\s*-->")
        .expect("marker pattern compiles")
});

/// Which in-page vantage point produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerVariant {
    Mobile,
    Desktop,
}

impl MarkerVariant {
    pub const fn label(self) -> &'static str {
        match self {
            MarkerVariant::Mobile => "mobile",
            MarkerVariant::Desktop => "desktop",
        }
    }
}

/// Neighbor count read in-page by the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborMarker {
    pub variant: MarkerVariant,
    pub count: u64,
}

impl NeighborMarker {
    pub fn new(variant: MarkerVariant, count: u64) -> Self {
        Self { variant, count }
    }

    /// Append the marker to a captured document.
    pub fn append_to(&self, markup: &mut String) {
        markup.push('\n');
        markup.push_str(&self.to_string());
    }
}

impl fmt::Display for NeighborMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<!-- audience-gate:neighbors:{}={} -->",
            self.variant.label(),
            self.count
        )
    }
}

/// Find the first neighbor marker in a document.
pub fn find_neighbor_marker(markup: &str) -> Option<NeighborMarker> {
    let captures = MARKER_RE.captures(markup)?;
    let variant = match &captures[1] {
        "mobile" => MarkerVariant::Mobile,
        _ => MarkerVariant::Desktop,
    };
    let count = captures[2].parse().ok()?;
    Some(NeighborMarker { variant, count })
}
