//! Standard-points text parsing.

use std::sync::OnceLock;

use regex::Regex;

// Fractional part is assumed to be 1-3 digits immediately preceding the end
// of the string, after a comma or dot; every other separator is a thousands
// marker.
fn decimal_tail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)[.,](\d{1,3})$").unwrap())
}

/// Parse free-form point text across European numeric conventions: decimal
/// comma (`792,89`), thousands separators with apostrophe, dot or underscore
/// (`1'044.06`, `1.044,06`, `1_044`).
///
/// Disqualified, empty or unparsable input yields `0.0`, which downstream
/// code treats as the disqualification sentinel for scores.
pub fn parse_score(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\'' | '_'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return 0.0;
    }

    if let Some(caps) = decimal_tail().captures(&cleaned) {
        let integer: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        let fraction = &caps[2];
        let normalized = format!(
            "{}.{}",
            if integer.is_empty() { "0" } else { &integer },
            fraction
        );
        return normalized.parse().unwrap_or(0.0);
    }

    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0.0)
}
