//! Meeting-title edition classification.
//!
//! Classifies a meeting title into an edition type plus number using ordered
//! keyword precedence: championship / special-distances keywords win over the
//! seasonal round/final phrasing, which wins over a plain leading numeral
//! (arabic or roman). Overlapping phrasings resolve by this order.

use std::sync::OnceLock;

use regex::Regex;

/// How a meeting numbers its editions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditionKind {
    /// Championship or special-distances meeting, one edition per year
    Yearly,
    /// Round or final of a regional championship, numbered within the season
    Seasonal,
    /// Plain sequence-numbered meeting ("12° Trofeo ...")
    Ordinal,
    /// No edition information in the title
    None,
}

/// Edition classification for one meeting title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    pub kind: EditionKind,
    /// Edition number when the title carries one: the year for yearly
    /// editions, the round number for seasonal ones, the sequence number for
    /// ordinal ones
    pub number: Option<u32>,
}

fn yearly_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(campionat\w*|championship|distanze\s+speciali|special\s+distances)\b")
            .unwrap()
    })
}

fn seasonal_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(prova|tappa|round|finale?)\b.*\b(regional[ei]|regional)\b").unwrap()
    })
}

fn leading_arabic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,3})\s*(?:[°ªa^]|st|nd|rd|th)?\s+\S").unwrap())
}

fn leading_roman() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([IVXLCDM]+)[°ªa^]?\s+\S").unwrap())
}

fn four_digit_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap())
}

impl Edition {
    /// Classify a meeting title. Never fails: an unrecognizable title is
    /// simply `EditionKind::None` with no number.
    pub fn parse(title: &str) -> Edition {
        if yearly_keywords().is_match(title) {
            let number = four_digit_year()
                .captures(title)
                .and_then(|caps| caps[1].parse().ok());
            return Edition {
                kind: EditionKind::Yearly,
                number,
            };
        }

        if seasonal_keywords().is_match(title) {
            let number = leading_arabic()
                .captures(title)
                .and_then(|caps| caps[1].parse().ok());
            return Edition {
                kind: EditionKind::Seasonal,
                number,
            };
        }

        if let Some(caps) = leading_arabic().captures(title) {
            if let Ok(number) = caps[1].parse() {
                return Edition {
                    kind: EditionKind::Ordinal,
                    number: Some(number),
                };
            }
        }

        if let Some(caps) = leading_roman().captures(title) {
            if let Some(number) = roman_to_u32(&caps[1]) {
                return Edition {
                    kind: EditionKind::Ordinal,
                    number: Some(number),
                };
            }
        }

        Edition {
            kind: EditionKind::None,
            number: None,
        }
    }
}

/// Decode a roman numeral in standard subtractive notation.
fn roman_to_u32(text: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        match c {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    }

    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for c in text.chars().rev() {
        let value = digit(c)?;
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }
    if total == 0 {
        None
    } else {
        Some(total)
    }
}
