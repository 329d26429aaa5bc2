//! Turns free-text identifiers into canonical profile URLs.

use crate::platform::PlatformTag;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("handle pattern compiles"));

/// Resolved form of one submitted identifier.
///
/// `platform` is `None` when the input could not be classified; such targets are never
/// fetched and surface as an unsupported-platform outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTarget {
    pub raw_input: String,
    pub url: String,
    pub platform: Option<PlatformTag>,
}

impl CanonicalTarget {
    fn unsupported(raw_input: &str) -> Self {
        Self {
            raw_input: raw_input.to_string(),
            url: raw_input.to_string(),
            platform: None,
        }
    }

    /// True when the URL points at the mobile Naver Blog layout.
    pub fn is_mobile_blog(&self) -> bool {
        self.platform == Some(PlatformTag::Blog) && self.url.contains("m.blog.naver.com")
    }
}

/// Resolve free text into a canonical target, trying the rules in a fixed order.
pub fn resolve(input: &str) -> CanonicalTarget {
    let trimmed = input.trim();

    if is_absolute_url(trimmed) {
        return CanonicalTarget {
            raw_input: trimmed.to_string(),
            url: trimmed.to_string(),
            platform: platform_for_url(trimmed),
        };
    }

    if let Some(handle) = trimmed.strip_prefix('@') {
        if handle.is_empty() {
            return CanonicalTarget::unsupported(trimmed);
        }
        return CanonicalTarget {
            raw_input: trimmed.to_string(),
            url: threads_profile_url(handle),
            platform: Some(PlatformTag::Threads),
        };
    }

    if HANDLE_RE.is_match(trimmed) {
        return CanonicalTarget {
            raw_input: trimmed.to_string(),
            url: instagram_profile_url(trimmed),
            platform: Some(PlatformTag::Instagram),
        };
    }

    if trimmed.chars().count() > 2 && !trimmed.contains(['.', '@']) {
        return CanonicalTarget {
            raw_input: trimmed.to_string(),
            url: blog_profile_url(trimmed),
            platform: Some(PlatformTag::Blog),
        };
    }

    CanonicalTarget::unsupported(trimmed)
}

/// Resolve a link that arrived in a column dedicated to `expected`.
///
/// A link that classifies as a different platform is kept for reporting but marked
/// unsupported so it cannot satisfy the wrong platform's threshold.
pub fn resolve_for_platform(input: &str, expected: PlatformTag) -> CanonicalTarget {
    let mut target = resolve(input);
    match target.platform {
        Some(platform) if platform != expected => {
            warn!(
                input = %target.raw_input,
                expected = %expected,
                resolved = %platform,
                "link submitted under the wrong platform"
            );
            target.platform = None;
        }
        _ => {}
    }
    target
}

fn is_absolute_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn platform_for_url(url: &str) -> Option<PlatformTag> {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| url.to_ascii_lowercase());

    if host.contains("blog.naver.com") {
        Some(PlatformTag::Blog)
    } else if host.contains("instagram.com") {
        Some(PlatformTag::Instagram)
    } else if host.contains("threads.net") || host.contains("threads.com") {
        Some(PlatformTag::Threads)
    } else {
        None
    }
}

fn instagram_profile_url(handle: &str) -> String {
    format!("https://www.instagram.com/{handle}/")
}

fn threads_profile_url(handle: &str) -> String {
    format!("https://www.threads.net/@{handle}")
}

fn blog_profile_url(blog_id: &str) -> String {
    format!("https://blog.naver.com/{blog_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ascii_handle_resolves_to_instagram() {
        let target = resolve("johndoe");
        assert_eq!(target.platform, Some(PlatformTag::Instagram));
        assert_eq!(target.url, "https://www.instagram.com/johndoe/");
    }

    #[test]
    fn dotted_handle_is_still_instagram() {
        let target = resolve("john.doe_99");
        assert_eq!(target.platform, Some(PlatformTag::Instagram));
    }

    #[test]
    fn leading_at_resolves_to_threads() {
        let target = resolve("  @johndoe ");
        assert_eq!(target.platform, Some(PlatformTag::Threads));
        assert_eq!(target.url, "https://www.threads.net/@johndoe");
        assert_eq!(target.raw_input, "@johndoe");
    }

    #[test]
    fn non_ascii_id_resolves_to_blog() {
        let target = resolve("블로그아이디");
        assert_eq!(target.platform, Some(PlatformTag::Blog));
        assert_eq!(target.url, "https://blog.naver.com/블로그아이디");
    }

    #[test]
    fn embedded_at_is_unsupported() {
        let target = resolve("john@doe");
        assert_eq!(target.platform, None);
        assert_eq!(target.url, "john@doe");
    }

    #[test]
    fn short_non_ascii_is_unsupported() {
        assert_eq!(resolve("블로").platform, None);
        assert_eq!(resolve("").platform, None);
        assert_eq!(resolve("@").platform, None);
    }

    #[test]
    fn urls_are_classified_by_host() {
        assert_eq!(
            resolve("https://m.blog.naver.com/someone").platform,
            Some(PlatformTag::Blog)
        );
        assert_eq!(
            resolve("https://blog.naver.com/someone").platform,
            Some(PlatformTag::Blog)
        );
        assert_eq!(
            resolve("https://www.instagram.com/someone/").platform,
            Some(PlatformTag::Instagram)
        );
        assert_eq!(
            resolve("https://www.threads.net/@someone").platform,
            Some(PlatformTag::Threads)
        );
        assert_eq!(
            resolve("https://www.threads.com/@someone").platform,
            Some(PlatformTag::Threads)
        );
        assert_eq!(resolve("https://example.com/someone").platform, None);
    }

    #[test]
    fn urls_pass_through_verbatim() {
        let target = resolve("HTTPS://www.instagram.com/SomeOne/?hl=ko");
        assert_eq!(target.url, "HTTPS://www.instagram.com/SomeOne/?hl=ko");
        assert_eq!(target.platform, Some(PlatformTag::Instagram));
    }

    #[test]
    fn mobile_blog_is_detected() {
        assert!(resolve("https://m.blog.naver.com/someone").is_mobile_blog());
        assert!(!resolve("https://blog.naver.com/someone").is_mobile_blog());
    }

    #[test]
    fn column_mismatch_is_marked_unsupported() {
        let target = resolve_for_platform("https://www.instagram.com/someone/", PlatformTag::Threads);
        assert_eq!(target.platform, None);

        let target = resolve_for_platform("https://www.threads.net/@someone", PlatformTag::Threads);
        assert_eq!(target.platform, Some(PlatformTag::Threads));
    }
}
