use super::instagram::follower_phrase;
use super::numeric::{parse_exact, EXACT_PATTERN};
use super::{Page, Strategy};
use regex::Regex;
use std::sync::LazyLock;

const ATTRIBUTE_MIN: u64 = 100;
const ATTRIBUTE_MAX: u64 = 10_000_000;

/// Threads renders `팔로워 <span title="12,345">1.2만</span>` on Korean profiles.
static FOLLOWER_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"팔로워\s*<span[^>]*\btitle="{EXACT_PATTERN}""#))
        .expect("follower span pattern compiles")
});

pub(super) const STRATEGIES: &[Strategy] = &[
    Strategy::new("follower_span_title", follower_span_title),
    Strategy::new("description_meta", description_meta),
    Strategy::new("title_attribute", title_attribute),
];

fn follower_span_title(page: &Page<'_>) -> Option<u64> {
    FOLLOWER_SPAN
        .captures_iter(page.markup())
        .find_map(|captures| parse_exact(&captures[1]))
}

fn description_meta(page: &Page<'_>) -> Option<u64> {
    page.description_meta()
        .into_iter()
        .find_map(follower_phrase)
}

/// Only trusted when the page talks about followers at all.
fn title_attribute(page: &Page<'_>) -> Option<u64> {
    if !page.mentions_any(&["팔로워", "follower"]) {
        return None;
    }
    page.title_integers()
        .into_iter()
        .filter(|value| (ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(value))
        .max()
}
