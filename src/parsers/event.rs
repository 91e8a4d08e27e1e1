//! Event and category parsing from section titles.
//!
//! Section titles look like `"50 Stile Libero - M25"` or
//! `"4x50m Stile Libero Master Maschi"`: an optional relay `NxM` prefix, a
//! distance, a stroke spelled out in Italian or English, optional trailing
//! gender keywords, and an optional category code valid for a given season.

use std::sync::OnceLock;

use regex::Regex;

use super::ParseArgsError;

/// Stroke resolved from a title keyword. Relay medleys carry a code distinct
/// from individual medleys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    IndividualMedley,
    RelayMedley,
}

impl Stroke {
    pub fn code(&self) -> &'static str {
        match self {
            Stroke::Freestyle => "FS",
            Stroke::Backstroke => "BK",
            Stroke::Breaststroke => "BR",
            Stroke::Butterfly => "FL",
            Stroke::IndividualMedley => "IM",
            Stroke::RelayMedley => "MR",
        }
    }
}

/// Season scope for category resolution: the set of category codes valid in
/// the season the report belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    category_codes: Vec<String>,
}

impl Season {
    /// Build a season from its valid category codes (e.g. `M25`, `M30`, ...).
    ///
    /// # Errors
    /// An empty code set is an invalid argument: category lookup would be
    /// meaningless without a season context.
    pub fn new<I, S>(category_codes: I) -> Result<Self, ParseArgsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let category_codes: Vec<String> = category_codes
            .into_iter()
            .map(|c| c.into().trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        if category_codes.is_empty() {
            return Err(ParseArgsError::InvalidArgs(
                "season has no category codes".to_string(),
            ));
        }
        Ok(Self { category_codes })
    }

    pub fn category_codes(&self) -> &[String] {
        &self.category_codes
    }

    fn find_category(&self, title: &str) -> Option<String> {
        for token in title.split(|c: char| !c.is_ascii_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let token = token.to_uppercase();
            if self.category_codes.iter().any(|code| *code == token) {
                return Some(token);
            }
        }
        None
    }
}

/// Parsed event section title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTitle {
    /// Relay event (`NxM` prefix present)
    pub relay: bool,

    /// Number of legs; 1 for individual events
    pub phases: u32,

    /// Length of one leg in metres
    pub phase_length: u32,

    /// Total distance in metres (phases x phase length)
    pub distance: u32,

    /// Stroke keyword resolution; unset when no keyword is recognized
    pub stroke: Option<Stroke>,

    /// Mixed-gender relay flag from trailing keywords
    pub mixed_gender: bool,

    /// Category code valid for the given season; absence is not a failure
    pub category: Option<String>,
}

fn relay_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:staffetta\s+)?(\d{1,2})\s*[x×]\s*(\d{2,4})").unwrap())
}

fn distance_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{2,4})").unwrap())
}

fn mixed_gender_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(mist[ae]|mixed|mix)\b\s*$").unwrap())
}

impl EventTitle {
    /// Parse a section title within a season's category scope.
    ///
    /// Tolerant of malformed titles: missing pieces come back as zero/unset
    /// rather than an error.
    pub fn parse(title: &str, season: &Season) -> EventTitle {
        let (relay, phases, phase_length) = match relay_prefix().captures(title) {
            Some(caps) => {
                let phases = caps[1].parse().unwrap_or(0);
                let length = caps[2].parse().unwrap_or(0);
                (true, phases, length)
            }
            None => match distance_prefix().captures(title) {
                Some(caps) => (false, 1, caps[1].parse().unwrap_or(0)),
                None => (false, 1, 0),
            },
        };

        EventTitle {
            relay,
            phases,
            phase_length,
            distance: phases * phase_length,
            stroke: resolve_stroke(title, relay),
            mixed_gender: mixed_gender_suffix().is_match(title),
            category: season.find_category(title),
        }
    }
}

/// Resolve the stroke from title keywords, Italian or English. Medley
/// resolves to the relay-medley code when the title carries a relay prefix.
fn resolve_stroke(title: &str, relay: bool) -> Option<Stroke> {
    let lower = title.to_lowercase();
    let contains_any =
        |keywords: &[&str]| keywords.iter().any(|keyword| lower.contains(keyword));

    if contains_any(&["misti", "medley"]) {
        return Some(if relay {
            Stroke::RelayMedley
        } else {
            Stroke::IndividualMedley
        });
    }
    if contains_any(&["farfalla", "delfino", "fly", "dolphin"]) {
        return Some(Stroke::Butterfly);
    }
    if contains_any(&["rana", "breast"]) {
        return Some(Stroke::Breaststroke);
    }
    if contains_any(&["dorso", "back"]) {
        return Some(Stroke::Backstroke);
    }
    if contains_any(&["stile", "libero", "free", "crawl"]) {
        return Some(Stroke::Freestyle);
    }
    None
}
