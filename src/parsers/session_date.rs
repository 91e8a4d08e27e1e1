//! Session date extraction.
//!
//! Builds ISO dates from the day / month-name / year tokens that layouts
//! capture separately, and scavenges the same tokens out of free-form
//! date-range labels ("Desenzano, 28-29 Febbraio 2020").

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

// Month lookup is by the first three letters, case-insensitive.
const MONTHS_IT: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];
const MONTHS_EN: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn month_number(name: &str) -> Option<u32> {
    let abbr: String = name.trim().to_lowercase().chars().take(3).collect();
    if abbr.chars().count() < 3 {
        return None;
    }
    for table in [&MONTHS_IT, &MONTHS_EN] {
        if let Some(index) = table.iter().position(|m| *m == abbr) {
            return Some(index as u32 + 1);
        }
    }
    None
}

fn normalize_year(year: i32) -> i32 {
    if year >= 100 {
        year
    } else if year <= 69 {
        2000 + year
    } else {
        1900 + year
    }
}

/// Build a date from separately captured day, month-name and year tokens.
/// Any unrecognizable token yields `None`.
pub fn date_from_tokens(day: &str, month_name: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month = month_number(month_name)?;
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(normalize_year(year), month, day)
}

fn day_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})\b").unwrap())
}

fn year_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4}|\d{2})\s*$").unwrap())
}

fn word_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-zÀ-ÖØ-öø-ÿ]{3,}").unwrap())
}

/// Extract day / month / year from a free-form date-range label, preferring
/// the last date mentioned when several days are listed
/// ("28-29 Febbraio 2020" resolves to February 29th).
pub fn date_from_range_label(label: &str) -> Option<NaiveDate> {
    // Month: the last word that resolves through the abbreviation table.
    let mut month = None;
    let mut month_end = 0;
    for word in word_token().find_iter(label) {
        if let Some(number) = month_number(word.as_str()) {
            month = Some(number);
            month_end = word.end();
        }
    }
    let month = month?;

    // Year: trailing 2- or 4-digit token.
    let year: i32 = year_token().captures(label)?.get(1)?.as_str().parse().ok()?;

    // Day: the last 1-2 digit token before the month name.
    let mut day = None;
    for caps in day_token().captures_iter(&label[..month_end]) {
        if let Ok(value) = caps[1].parse::<u32>() {
            if (1..=31).contains(&value) {
                day = Some(value);
            }
        }
    }
    let day = day?;

    NaiveDate::from_ymd_opt(normalize_year(year), month, day)
}
