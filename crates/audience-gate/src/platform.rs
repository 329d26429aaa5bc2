use serde::{Deserialize, Serialize};
use std::fmt;

/// Platforms whose public profile pages the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformTag {
    Instagram,
    Threads,
    Blog,
}

impl PlatformTag {
    /// Column order used by the spreadsheet intake and the applicant export.
    pub const ALL: [PlatformTag; 3] = [
        PlatformTag::Threads,
        PlatformTag::Instagram,
        PlatformTag::Blog,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PlatformTag::Instagram => "instagram",
            PlatformTag::Threads => "threads",
            PlatformTag::Blog => "blog",
        }
    }

    /// Human readable name for exports.
    pub const fn display_name(self) -> &'static str {
        match self {
            PlatformTag::Instagram => "Instagram",
            PlatformTag::Threads => "Threads",
            PlatformTag::Blog => "Naver Blog",
        }
    }

    /// Name of the audience metric on this platform.
    pub const fn metric_name(self) -> &'static str {
        match self {
            PlatformTag::Instagram | PlatformTag::Threads => "followers",
            PlatformTag::Blog => "neighbors",
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
