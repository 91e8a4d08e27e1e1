//! Field definitions and single-field extraction.
//!
//! A [`FieldDef`] describes how one scalar value is located inside one text
//! line of a report; a [`FieldExtractor`] is its compiled form and performs
//! the actual extraction.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

/// Text transform applied, in declared order, to a raw extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lambda {
    Trim,
    Uppercase,
    Lowercase,
}

impl Lambda {
    /// Apply this transform to a value, returning the transformed string.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Lambda::Trim => value.trim().to_string(),
            Lambda::Uppercase => value.to_uppercase(),
            Lambda::Lowercase => value.to_lowercase(),
        }
    }
}

/// Field definition from a layout YAML.
///
/// Exactly one value is extracted per field. The three location mechanisms
/// compose as follows: `starts_with`/`ends_with` narrow the search window,
/// `token_start`/`token_end` slice fixed character columns out of the window,
/// and `format` matches a pattern (with at most one capture group) inside
/// whatever the previous steps produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name (key in the resulting value map)
    pub name: String,

    /// Pattern with at most one capture group; the group is the value,
    /// no group means the full match is the value
    #[serde(default)]
    pub format: Option<String>,

    /// Remove the matched span from the working line (default true)
    #[serde(default = "default_true")]
    pub pop_out: bool,

    /// Physical line within the context's row span this field reads
    #[serde(default)]
    pub row: usize,

    /// Fixed start column (character offset) within the search window
    #[serde(default)]
    pub token_start: Option<usize>,

    /// Fixed end column (exclusive) within the search window
    #[serde(default)]
    pub token_end: Option<usize>,

    /// Narrow the window to begin after the last occurrence of this marker
    #[serde(default)]
    pub starts_with: Option<String>,

    /// Narrow the window to end before the first occurrence of this marker
    #[serde(default)]
    pub ends_with: Option<String>,

    /// Ordered transform chain applied to the raw value
    #[serde(default)]
    pub lambda: Vec<Lambda>,

    /// A missing value fails the whole context (default true)
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Outcome of one field extraction attempt.
///
/// `value` is `None` only for optional fields that did not match; a required
/// field that fails to match yields no `FieldCapture` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCapture {
    /// Final transformed value, unset when an optional field did not match
    pub value: Option<String>,

    /// The working line after extraction: shortened when `pop_out` removed
    /// the matched span, otherwise identical to the input
    pub remainder: String,
}

/// Compiled form of a [`FieldDef`].
///
/// Pattern compilation and bounds checks happen here once, so matching never
/// has to report configuration problems.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    def: FieldDef,
    format: Option<Regex>,
}

impl FieldExtractor {
    /// Compile a field definition, validating its pattern and token bounds.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] if the pattern does not compile, has more
    /// than one capture group, or `token_start >= token_end`.
    pub fn compile(def: FieldDef) -> Result<Self, LayoutError> {
        let format = match &def.format {
            Some(pattern) => {
                let re = Regex::new(pattern).map_err(|e| LayoutError::InvalidPattern {
                    field: def.name.clone(),
                    message: e.to_string(),
                })?;
                // captures_len() counts the implicit whole-match group 0
                let groups = re.captures_len() - 1;
                if groups > 1 {
                    return Err(LayoutError::TooManyCaptures {
                        field: def.name.clone(),
                        found: groups,
                    });
                }
                Some(re)
            }
            None => None,
        };

        if let (Some(token_start), Some(token_end)) = (def.token_start, def.token_end) {
            if token_start >= token_end {
                return Err(LayoutError::InvalidTokenBounds {
                    field: def.name.clone(),
                    token_start,
                    token_end,
                });
            }
        }

        Ok(Self { def, format })
    }

    /// The underlying definition.
    pub fn def(&self) -> &FieldDef {
        &self.def
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Physical line within the context span this field reads.
    pub fn row(&self) -> usize {
        self.def.row
    }

    /// Whether a failed match fails the whole context.
    pub fn is_required(&self) -> bool {
        self.def.required
    }

    /// Extract this field's value from one working line.
    ///
    /// Returns `None` when a required field finds no match (the caller's
    /// signal to abort the context attempt). Optional misses return a capture
    /// with an unset value and the line untouched. The input line is never
    /// mutated; `pop_out` produces a fresh shortened `String`.
    pub fn extract(&self, line: &str) -> Option<FieldCapture> {
        // Narrow the search window between the bounding markers.
        let mut win_start = 0usize;
        let mut win_end = line.len();
        if let Some(marker) = &self.def.starts_with {
            match line.rfind(marker.as_str()) {
                Some(pos) => win_start = pos + marker.len(),
                None => return self.miss(line),
            }
        }
        if let Some(marker) = &self.def.ends_with {
            match line[win_start..win_end].find(marker.as_str()) {
                Some(pos) => win_end = win_start + pos,
                None => return self.miss(line),
            }
        }
        let window = &line[win_start..win_end];

        // Locate the value span, relative to the window.
        let located = if let (Some(token_start), Some(token_end)) =
            (self.def.token_start, self.def.token_end)
        {
            match char_span(window, token_start, token_end) {
                Some((slice_start, slice_end)) => {
                    let slice = &window[slice_start..slice_end];
                    match &self.format {
                        Some(re) => locate(re, slice)
                            .map(|(s, e, raw)| (slice_start + s, slice_start + e, raw)),
                        None => Some((slice_start, slice_end, slice.to_string())),
                    }
                }
                None => None,
            }
        } else if let Some(re) = &self.format {
            locate(re, window)
        } else {
            // No pattern and no columns: the whole window is the value.
            Some((0, window.len(), window.to_string()))
        };

        let (span_start, span_end, raw) = match located {
            Some(found) => found,
            None => return self.miss(line),
        };

        let mut value = raw;
        for lambda in &self.def.lambda {
            value = lambda.apply(&value);
        }

        let remainder = if self.def.pop_out {
            let abs_start = win_start + span_start;
            let abs_end = win_start + span_end;
            let mut rest = String::with_capacity(line.len());
            rest.push_str(&line[..abs_start]);
            rest.push_str(&line[abs_end..]);
            rest
        } else {
            line.to_string()
        };

        Some(FieldCapture {
            value: Some(value),
            remainder,
        })
    }

    fn miss(&self, line: &str) -> Option<FieldCapture> {
        if self.def.required {
            None
        } else {
            Some(FieldCapture {
                value: None,
                remainder: line.to_string(),
            })
        }
    }
}

/// Match `re` against `text`, returning the byte span to pop out and the raw
/// value. The value (and the popped span) is capture group 1 when the pattern
/// has one, otherwise the full match.
fn locate(re: &Regex, text: &str) -> Option<(usize, usize, String)> {
    let caps = re.captures(text)?;
    let span = match caps.get(1) {
        Some(group) => group,
        None => caps.get(0)?,
    };
    Some((span.start(), span.end(), span.as_str().to_string()))
}

/// Convert character columns to a byte span within `window`, clamping the end
/// column to the window length. Returns `None` when the start column lies
/// beyond the window.
fn char_span(window: &str, start_col: usize, end_col: usize) -> Option<(usize, usize)> {
    let mut start_byte = None;
    let mut end_byte = window.len();
    for (col, (byte, _)) in window.char_indices().enumerate() {
        if col == start_col {
            start_byte = Some(byte);
        }
        if col == end_col {
            end_byte = byte;
            break;
        }
    }
    start_byte.map(|start| (start, end_byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(def: FieldDef) -> FieldExtractor {
        FieldExtractor::compile(def).unwrap()
    }

    fn base_def(name: &str) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            format: None,
            pop_out: true,
            row: 0,
            token_start: None,
            token_end: None,
            starts_with: None,
            ends_with: None,
            lambda: vec![],
            required: true,
        }
    }

    #[test]
    fn test_extract_with_capture_group() {
        let mut def = base_def("rank");
        def.format = Some(r"^\s*(\d{1,3})\s".to_string());

        let capture = field(def).extract("7 ROSSI MARIO 6 ITA").unwrap();

        assert_eq!(capture.value.as_deref(), Some("7"));
        assert_eq!(capture.remainder, " ROSSI MARIO 6 ITA");
    }

    #[test]
    fn test_extract_without_group_pops_full_match() {
        let mut def = base_def("marker");
        def.format = Some(r"ITA\s".to_string());

        let capture = field(def).extract("ROSSI ITA 30.20").unwrap();

        assert_eq!(capture.value.as_deref(), Some("ITA "));
        assert_eq!(capture.remainder, "ROSSI 30.20");
    }

    #[test]
    fn test_pop_out_round_trip() {
        // Reinserting the raw value at its original position reconstructs
        // the line.
        let line = "7 ROSSI MARIO 6 ITA";
        let mut def = base_def("rank");
        def.format = Some(r"^\s*(\d{1,3})\s".to_string());

        let capture = field(def).extract(line).unwrap();
        let value = capture.value.unwrap();
        let rebuilt = format!("{}{}", value, capture.remainder);

        assert_eq!(rebuilt, line);
    }

    #[test]
    fn test_non_pop_out_is_identity() {
        let line = "7 ROSSI MARIO 6 ITA";
        let mut def = base_def("rank");
        def.format = Some(r"(\d{1,3})".to_string());
        def.pop_out = false;

        let capture = field(def).extract(line).unwrap();

        assert_eq!(capture.value.as_deref(), Some("7"));
        assert_eq!(capture.remainder, line);
    }

    #[test]
    fn test_non_pop_out_identity_on_optional_miss() {
        let line = "no digits here";
        let mut def = base_def("rank");
        def.format = Some(r"(\d+)".to_string());
        def.pop_out = false;
        def.required = false;

        let capture = field(def).extract(line).unwrap();

        assert_eq!(capture.value, None);
        assert_eq!(capture.remainder, line);
    }

    #[test]
    fn test_required_miss_signals_failure() {
        let mut def = base_def("rank");
        def.format = Some(r"(\d+)".to_string());

        assert!(field(def).extract("no digits here").is_none());
    }

    #[test]
    fn test_window_markers_narrow_search() {
        // Between the last '(' and the first ')' after it.
        let mut def = base_def("delta");
        def.starts_with = Some("(".to_string());
        def.ends_with = Some(")".to_string());
        def.format = Some(r"(\d{1,2}[\.:]\d{1,2})".to_string());

        let capture = field(def)
            .extract("TEAM (A) 1998 (31.72) 787,62")
            .unwrap();

        assert_eq!(capture.value.as_deref(), Some("31.72"));
        assert_eq!(capture.remainder, "TEAM (A) 1998 () 787,62");
    }

    #[test]
    fn test_missing_window_marker_is_a_miss() {
        let mut def = base_def("delta");
        def.starts_with = Some("(".to_string());
        def.format = Some(r"(\d+)".to_string());

        assert!(field(def).extract("no parens 123").is_none());
    }

    #[test]
    fn test_token_columns_slice_without_pattern() {
        let mut def = base_def("lane");
        def.token_start = Some(3);
        def.token_end = Some(5);
        def.lambda = vec![Lambda::Trim];

        let capture = field(def).extract("07 L4 ROSSI").unwrap();

        assert_eq!(capture.value.as_deref(), Some("L4"));
        assert_eq!(capture.remainder, "07  ROSSI");
    }

    #[test]
    fn test_token_columns_clamped_to_line_end() {
        let mut def = base_def("tail");
        def.token_start = Some(3);
        def.token_end = Some(80);
        def.pop_out = false;

        let capture = field(def).extract("07 L4").unwrap();

        assert_eq!(capture.value.as_deref(), Some("L4"));
    }

    #[test]
    fn test_token_columns_beyond_line_miss() {
        let mut def = base_def("tail");
        def.token_start = Some(40);
        def.token_end = Some(50);

        assert!(field(def).extract("short").is_none());
    }

    #[test]
    fn test_token_columns_with_format_alongside() {
        let mut def = base_def("year");
        def.token_start = Some(6);
        def.token_end = Some(12);
        def.format = Some(r"(\d{4})".to_string());

        let capture = field(def).extract("TEAM  1998  (31.72)").unwrap();

        assert_eq!(capture.value.as_deref(), Some("1998"));
        assert_eq!(capture.remainder, "TEAM    (31.72)");
    }

    #[test]
    fn test_lambda_chain_in_order() {
        let mut def = base_def("name");
        def.format = Some(r"([a-z ]+)".to_string());
        def.lambda = vec![Lambda::Trim, Lambda::Uppercase];

        let capture = field(def).extract("  rossi mario ").unwrap();

        assert_eq!(capture.value.as_deref(), Some("ROSSI MARIO"));
    }

    #[test]
    fn test_case_lambdas_are_idempotent() {
        let once = Lambda::Uppercase.apply("Rossi Mario");
        let twice = Lambda::Uppercase.apply(&once);
        assert_eq!(once, twice);

        let once = Lambda::Lowercase.apply("Rossi Mario");
        let twice = Lambda::Lowercase.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_compile_rejects_two_capture_groups() {
        let mut def = base_def("bad");
        def.format = Some(r"(\d+)\s+(\w+)".to_string());

        let err = FieldExtractor::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::TooManyCaptures { found: 2, .. }));
    }

    #[test]
    fn test_compile_rejects_invalid_pattern() {
        let mut def = base_def("bad");
        def.format = Some(r"([unclosed".to_string());

        let err = FieldExtractor::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPattern { .. }));
    }

    #[test]
    fn test_compile_rejects_inverted_token_bounds() {
        let mut def = base_def("bad");
        def.token_start = Some(10);
        def.token_end = Some(5);

        let err = FieldExtractor::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidTokenBounds { .. }));
    }

    #[test]
    fn test_lambda_yaml_names() {
        let lambdas: Vec<Lambda> =
            serde_yaml::from_str("[trim, uppercase, lowercase]").unwrap();
        assert_eq!(
            lambdas,
            vec![Lambda::Trim, Lambda::Uppercase, Lambda::Lowercase]
        );
    }
}
