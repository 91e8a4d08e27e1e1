//! City and address splitting.
//!
//! Venue addresses in report headers mix a city name, an optional bracketed
//! area/province code and the rest of the address in vendor-specific orders:
//! `"Stadio Comunale - Milano (MI)"`, `"(BS) Desenzano, Via Foo 1"`.

use std::sync::OnceLock;

use regex::Regex;

/// City split out of a free-form address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityName {
    /// City name, empty when the address yields no usable token
    pub name: String,

    /// Bracketed area/province code adjacent to the city name
    pub area_code: Option<String>,

    /// The remaining address tokens, rejoined
    pub remainder: String,
}

fn area_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([A-Za-z]{2,3})\)").unwrap())
}

impl CityName {
    /// Split a free-form address into (city, area code, remaining address).
    ///
    /// The address is split on separators; the token carrying a bracketed
    /// area code is the city token, whether it sits at the start or the end
    /// of the sequence. Without a code the last token is taken as the city.
    /// Never fails: a blank address yields an empty `CityName`.
    pub fn parse(address: &str) -> CityName {
        // Spaced hyphens act as separators; hyphens inside names do not.
        let normalized = address.replace(" - ", ", ");
        let tokens: Vec<&str> = normalized
            .split(|c| matches!(c, ',' | ';' | '/'))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return CityName::default();
        }

        // The city token carries the bracketed code, at either end.
        let city_index = tokens
            .iter()
            .position(|t| area_code_pattern().is_match(t))
            .unwrap_or(tokens.len() - 1);
        let city_token = tokens[city_index];

        let area_code = area_code_pattern()
            .captures(city_token)
            .map(|caps| caps[1].to_uppercase());
        let name = area_code_pattern()
            .replace_all(city_token, "")
            .trim()
            .to_string();

        let remainder = tokens
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != city_index)
            .map(|(_, t)| *t)
            .collect::<Vec<_>>()
            .join(", ");

        CityName {
            name,
            area_code,
            remainder,
        }
    }
}
