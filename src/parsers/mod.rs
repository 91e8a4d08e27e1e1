//! Semantic value parsers.
//!
//! Independent, stateless converters from raw extracted report text to typed
//! domain values. Malformed input yields `None`/zero/empty rather than an
//! error; only invalid caller-supplied arguments (e.g. an empty season
//! category set) are reported as [`ParseArgsError`].

pub mod city;
pub mod edition;
pub mod event;
pub mod score;
pub mod session_date;
pub mod timing;

use std::fmt;

/// Invalid caller-supplied argument to a semantic parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseArgsError {
    InvalidArgs(String),
}

impl fmt::Display for ParseArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseArgsError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for ParseArgsError {}

pub use city::CityName;
pub use edition::{Edition, EditionKind};
pub use event::{EventTitle, Season, Stroke};
pub use score::parse_score;
pub use session_date::{date_from_range_label, date_from_tokens};
pub use timing::Timing;
