//! # Meetparse: layout matching for swim-meet result reports
//!
//! Meetparse turns irregular, column-aligned, vendor-specific swim-meet
//! report text into structured per-result records using one generic,
//! data-driven mechanism: hand-authored YAML layouts describing each known
//! report template.
//!
//! ## Components
//!
//! - **Field extraction** ([`field`]): one scalar value out of one text line,
//!   optionally popped out of the line so later fields read the shrunk rest
//! - **Context matching** ([`context`]): validates whether a window of
//!   one-or-more lines matches a named record shape, producing a value map
//! - **Layout library** ([`layout`]): loads and validates a named layout once;
//!   matching never raises for ordinary non-matches
//! - **Semantic parsers** ([`parsers`]): stateless converters from raw
//!   extracted strings to typed values (timings, scores, events, editions,
//!   dates, addresses)
//!
//! ## Example layout
//!
//! ```yaml
//! layout: ficr-100m
//! contexts:
//!   - name: event
//!     starts_with: "Event"
//!     fields:
//!       - name: event_title
//!         format: 'Event\s+\d+\s+(.+)$'
//!         lambda: [trim]
//!   - name: results
//!     parent: event
//!     row_span: 2
//!     fields:
//!       - name: rank
//!         format: '^\s*(\d{1,3})\s'
//!       - name: timing
//!         format: '(\d{1,2}[:.]\d{2}\.\d{2})'
//! ```
//!
//! Walking a whole report, choosing which layout applies and assembling
//! matched contexts into a record tree are the scanning driver's job and live
//! outside this crate.

// Core modules
pub mod context;
pub mod field;
pub mod layout;

// Semantic value parsers consumed downstream of extraction
pub mod parsers;

// Re-export key types
pub use context::{ContextDef, ContextMatcher, MatchResult};
pub use field::{FieldCapture, FieldDef, FieldExtractor, Lambda};
pub use layout::{Layout, LayoutDef, LayoutError, LayoutLibrary};
pub use parsers::{
    date_from_range_label, date_from_tokens, parse_score, CityName, Edition, EditionKind,
    EventTitle, ParseArgsError, Season, Stroke, Timing,
};
