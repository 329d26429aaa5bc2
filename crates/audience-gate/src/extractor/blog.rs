use super::numeric::{first_integer, parse_exact, EXACT_PATTERN};
use super::{Page, Strategy};
use crate::fetcher::find_neighbor_marker;
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

const EMPHASIS_MIN: u64 = 100;
const EMPHASIS_MAX: u64 = 100_000;
const NEIGHBOR_WORD: &str = "이웃";

static NEIGHBOR_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // mobile: "1,234명의 이웃"
        format!(r"{EXACT_PATTERN}\s*명의\s*이웃"),
        // desktop: "이웃 1,234명"
        format!(r"이웃\s*{EXACT_PATTERN}\s*명"),
        // desktop widget: "이웃 <em>1,234</em>"
        format!(r"이웃\s*(?:<[^>]+>\s*)+{EXACT_PATTERN}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("neighbor phrase compiles"))
    .collect()
});
static BUDDY_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href*='BuddyList'], a[href*='buddyList'], a[href*='buddy']")
        .expect("buddy link selector parses")
});
static EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("em, strong, b").expect("emphasis selector parses"));

pub(super) const STRATEGIES: &[Strategy] = &[
    Strategy::new("neighbor_marker", neighbor_marker),
    Strategy::new("neighbor_phrase", neighbor_phrase),
    Strategy::new("buddy_link", buddy_link),
    Strategy::new("emphasis_numeral", emphasis_numeral),
];

fn neighbor_marker(page: &Page<'_>) -> Option<u64> {
    find_neighbor_marker(page.markup()).map(|marker| marker.count)
}

fn neighbor_phrase(page: &Page<'_>) -> Option<u64> {
    NEIGHBOR_PHRASES.iter().find_map(|pattern| {
        pattern
            .captures_iter(page.markup())
            .find_map(|captures| parse_exact(&captures[1]).filter(|count| *count > 0))
    })
}

fn buddy_link(page: &Page<'_>) -> Option<u64> {
    page.html()
        .select(&BUDDY_LINKS)
        .filter_map(|link| first_integer(&link.text().collect::<String>()))
        .find(|count| *count > 0)
}

/// Last resort: bold numerals, preferring one that sits next to the word for neighbors.
fn emphasis_numeral(page: &Page<'_>) -> Option<u64> {
    let mut best_overall = None;
    for element in page.html().select(&EMPHASIS) {
        let text = element.text().collect::<String>();
        let Some(value) = parse_exact(&text) else {
            continue;
        };
        if !(EMPHASIS_MIN..=EMPHASIS_MAX).contains(&value) {
            continue;
        }

        let near_neighbor_word = element
            .parent()
            .and_then(scraper::ElementRef::wrap)
            .map(|parent| parent.text().collect::<String>().contains(NEIGHBOR_WORD))
            .unwrap_or(false);
        if near_neighbor_word {
            return Some(value);
        }
        best_overall = best_overall.max(Some(value));
    }
    best_overall
}
