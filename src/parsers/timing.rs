//! Race-time text parsing.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A race timing in minutes, seconds and hundredths.
///
/// `Timing::parse` returning `None` is "no timing found", which is distinct
/// from a parsed zero timing (e.g. a 0.00 placeholder row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timing {
    pub minutes: u32,
    pub seconds: u32,
    pub hundredths: u32,
}

// Grammar (a): optional minutes delimited by apostrophe/colon/dot, seconds,
// then a dot/quote-delimited hundredths group.
fn compact_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?:(\d{1,3})\s*['":.])?\s*(\d{1,2})\s*[."](\d{1,2})$"#).unwrap()
    })
}

// Grammar (b): three tokens separated by colon or whitespace.
fn token_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,3})[:\s]+(\d{1,2})[:\s]+(\d{1,2})$").unwrap())
}

impl Timing {
    pub fn new(minutes: u32, seconds: u32, hundredths: u32) -> Self {
        Self {
            minutes,
            seconds,
            hundredths,
        }
    }

    /// Parse free-form race-time text.
    ///
    /// Accepts either grammar: `1'23.45`, `1:23.45`, `12.34`, `12"34` or the
    /// token form `12:34:56` / `12 34 56`. A single-digit trailing hundredths
    /// fragment is a truncated tenths digit and is padded with a trailing
    /// zero (`.5` means 50 hundredths, not 5). Unparsable text yields `None`.
    pub fn parse(text: &str) -> Option<Timing> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(caps) = compact_format().captures(text) {
            let minutes = caps
                .get(1)
                .map(|m| m.as_str().parse().unwrap_or(0))
                .unwrap_or(0);
            let seconds = caps[2].parse().unwrap_or(0);
            let hundredths = pad_hundredths(&caps[3]);
            return Some(Timing::new(minutes, seconds, hundredths));
        }

        if let Some(caps) = token_format().captures(text) {
            let minutes = caps[1].parse().unwrap_or(0);
            let seconds = caps[2].parse().unwrap_or(0);
            let hundredths = pad_hundredths(&caps[3]);
            return Some(Timing::new(minutes, seconds, hundredths));
        }

        None
    }

    /// Total timing expressed in hundredths of a second.
    pub fn to_hundredths(&self) -> u32 {
        self.minutes * 6000 + self.seconds * 100 + self.hundredths
    }

    pub fn is_zero(&self) -> bool {
        self.to_hundredths() == 0
    }
}

fn pad_hundredths(fragment: &str) -> u32 {
    let value: u32 = fragment.parse().unwrap_or(0);
    if fragment.len() == 1 {
        value * 10
    } else {
        value
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}'{:02}\"{:02}",
            self.minutes, self.seconds, self.hundredths
        )
    }
}
