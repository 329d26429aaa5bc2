use super::numeric::{normalize_count, COUNT_PATTERN};
use super::{Page, Strategy};
use regex::Regex;
use std::sync::LazyLock;

const ATTRIBUTE_MIN: u64 = 1_000;
const ATTRIBUTE_MAX: u64 = 100_000_000;

/// `1,234 Followers` / `12.5K followers` / `1.2만 팔로워`
static COUNT_BEFORE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){COUNT_PATTERN}\s*(?:followers|팔로워)"))
        .expect("count-before-label pattern compiles")
});
/// `팔로워 1,234명` as rendered in the Korean description.
static LABEL_BEFORE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"팔로워\s*{COUNT_PATTERN}")).expect("label-before-count pattern compiles")
});
static BODY_FOLLOWERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){COUNT_PATTERN}\s*followers\b"))
        .expect("body followers pattern compiles")
});
static JSON_FOLLOWERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""(?:follower_count|followers_count|edge_followed_by)"\s*:\s*(?:\{\s*"count"\s*:\s*)?(\d+)"#,
    )
    .expect("json follower pattern compiles")
});

pub(super) const STRATEGIES: &[Strategy] = &[
    Strategy::new("description_meta", description_meta),
    Strategy::new("title_attribute", title_attribute),
    Strategy::new("body_text", body_text),
    Strategy::new("embedded_json", embedded_json),
];

/// Description metadata phrase, in either word order.
pub(super) fn follower_phrase(text: &str) -> Option<u64> {
    [&*COUNT_BEFORE_LABEL, &*LABEL_BEFORE_COUNT]
        .into_iter()
        .filter_map(|pattern| pattern.captures(text))
        .find_map(|captures| normalize_count(&captures[1]))
}

fn description_meta(page: &Page<'_>) -> Option<u64> {
    page.description_meta()
        .into_iter()
        .find_map(follower_phrase)
}

fn title_attribute(page: &Page<'_>) -> Option<u64> {
    page.title_integers()
        .into_iter()
        .filter(|value| (ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(value))
        .max()
}

fn body_text(page: &Page<'_>) -> Option<u64> {
    BODY_FOLLOWERS
        .captures_iter(page.visible_text())
        .find_map(|captures| normalize_count(&captures[1]))
}

fn embedded_json(page: &Page<'_>) -> Option<u64> {
    JSON_FOLLOWERS
        .captures_iter(page.markup())
        .find_map(|captures| captures[1].parse().ok())
}
