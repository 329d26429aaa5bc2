//! Count normalization for abbreviated, locale-specific audience numbers.

/// Regex fragment for a possibly abbreviated count such as `1,234`, `2.4만`, or `12.5K`.
pub(crate) const COUNT_PATTERN: &str = r"([0-9][0-9.,]*\s*[KkMm만천]?)";

/// Regex fragment for an exact, optionally comma-grouped integer.
pub(crate) const EXACT_PATTERN: &str = r"([0-9][0-9,]*)";

const FRACTION_DIGITS_KEPT: usize = 9;

/// Normalize an abbreviated count into an integer, truncating fractional results.
///
/// Separators, whitespace, and a trailing `명` are ignored. Returns `None` for anything that
/// is not numeric or does not normalize to a positive value.
pub fn normalize_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let cleaned = cleaned.strip_suffix('명').unwrap_or(&cleaned);

    let (number, multiplier) = split_suffix(cleaned);
    let value = scale_decimal(number, multiplier)?;
    (value > 0).then_some(value)
}

/// Parse an exact integer such as `12,345`. Abbreviations are rejected.
pub fn parse_exact(raw: &str) -> Option<u64> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// First comma-grouped integer appearing anywhere in `text`.
pub fn first_integer(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    run.parse().ok()
}

fn split_suffix(value: &str) -> (&str, u64) {
    const SUFFIXES: [(&str, u64); 6] = [
        ("K", 1_000),
        ("k", 1_000),
        ("M", 1_000_000),
        ("m", 1_000_000),
        ("만", 10_000),
        ("천", 1_000),
    ];

    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = value.strip_suffix(suffix) {
            return (number, multiplier);
        }
    }
    (value, 1)
}

/// Multiply a decimal string by `multiplier` using integer arithmetic only.
fn scale_decimal(number: &str, multiplier: u64) -> Option<u64> {
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = whole.parse().ok()?;
    let mut value = whole.checked_mul(multiplier)?;

    let fraction = &fraction[..fraction.len().min(FRACTION_DIGITS_KEPT)];
    if !fraction.is_empty() {
        let numerator: u64 = fraction.parse().ok()?;
        let denominator = 10u64.pow(fraction.len() as u32);
        value = value.checked_add(numerator.checked_mul(multiplier)? / denominator)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_scale_the_value() {
        assert_eq!(normalize_count("2.4만"), Some(24_000));
        assert_eq!(normalize_count("1.2M"), Some(1_200_000));
        assert_eq!(normalize_count("800"), Some(800));
        assert_eq!(normalize_count("24K"), Some(24_000));
        assert_eq!(normalize_count("5천"), Some(5_000));
    }

    #[test]
    fn separators_and_counters_are_ignored() {
        assert_eq!(normalize_count("1,234"), Some(1_234));
        assert_eq!(normalize_count(" 12.5 k "), Some(12_500));
        assert_eq!(normalize_count("1.5만명"), Some(15_000));
    }

    #[test]
    fn fractional_results_truncate() {
        assert_eq!(normalize_count("1.2345K"), Some(1_234));
        assert_eq!(normalize_count("3.7"), Some(3));
    }

    #[test]
    fn non_numeric_and_zero_are_rejected() {
        assert_eq!(normalize_count("만"), None);
        assert_eq!(normalize_count("abc"), None);
        assert_eq!(normalize_count("0"), None);
        assert_eq!(normalize_count("0.0001K"), None);
        assert_eq!(normalize_count("1.2.3"), None);
    }

    #[test]
    fn exact_parsing_rejects_abbreviations() {
        assert_eq!(parse_exact("12,345"), Some(12_345));
        assert_eq!(parse_exact("12.3K"), None);
        assert_eq!(parse_exact(""), None);
    }

    #[test]
    fn first_integer_skips_leading_text() {
        assert_eq!(first_integer("1,523명의 이웃"), Some(1_523));
        assert_eq!(first_integer("이웃 87"), Some(87));
        assert_eq!(first_integer("none"), None);
    }
}
