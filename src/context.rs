//! Context definitions, window matching and the per-match value map.
//!
//! A context is a named shape of one or more text lines representing one
//! record type in a layout (a result row, a relay-team header, a page
//! footer). The [`ContextMatcher`] validates a single window of lines at a
//! time; walking a whole report and assembling matched contexts into a record
//! tree belongs to the external scanning driver.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::{FieldDef, FieldExtractor};
use crate::layout::LayoutError;

/// Context definition from a layout YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDef {
    /// Context name, unique within its layout
    pub name: String,

    /// Name of the parent context (weak reference, resolved at load time)
    #[serde(default)]
    pub parent: Option<String>,

    /// The first line of the span must begin with this prefix (after trimming)
    #[serde(default)]
    pub starts_with: Option<String>,

    /// The last line of the span must end with this suffix (after trimming)
    #[serde(default)]
    pub ends_with: Option<String>,

    /// Number of physical lines this record occupies (default 1)
    #[serde(default = "default_row_span")]
    pub row_span: usize,

    /// Anchored end-of-page footer: `starts_with` must hold and the remaining
    /// span lines are matched positionally, with no following sibling
    #[serde(default)]
    pub eop: bool,

    /// Fixed line-offset override hint for the scanning driver
    #[serde(default)]
    pub starts_at_row: Option<usize>,

    /// Ordered field list; order matters because pop-out fields shrink the
    /// working line read by later fields
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

fn default_row_span() -> usize {
    1
}

/// Value map for exactly one successful context match.
///
/// Field values appear in declaration order. Optional fields that did not
/// match are simply unset. A failed attempt produces no `MatchResult` at all,
/// so partial values never leak out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    context_name: String,
    values: IndexMap<String, String>,
}

impl MatchResult {
    fn new(context_name: &str) -> Self {
        Self {
            context_name: context_name.to_string(),
            values: IndexMap::new(),
        }
    }

    /// Name of the context that produced this match.
    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    /// Get a field value by name; `None` for unset optional fields.
    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.values.get(field_name).map(|s| s.as_str())
    }

    /// Check whether a field produced a value.
    pub fn has_field(&self, field_name: &str) -> bool {
        self.values.contains_key(field_name)
    }

    /// Number of set fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate field name/value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize the value map for the driver/CLI boundary.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "context".to_string(),
            serde_json::Value::String(self.context_name.clone()),
        );
        let mut fields = serde_json::Map::new();
        for (name, value) in &self.values {
            fields.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        map.insert("fields".to_string(), serde_json::Value::Object(fields));
        serde_json::Value::Object(map)
    }

    fn insert(&mut self, field_name: &str, value: String) {
        self.values.insert(field_name.to_string(), value);
    }
}

/// Compiled context, validating one window of lines at a time.
///
/// Stateless between calls apart from the retained last successful match;
/// each `valid` attempt works on its own copies of the span lines, so a
/// driver retrying other offsets after a failure never observes contamination
/// from the prior attempt.
#[derive(Debug, Clone)]
pub struct ContextMatcher {
    def: ContextDef,
    fields: Vec<FieldExtractor>,
    last_match: Option<MatchResult>,
}

impl ContextMatcher {
    /// Compile a context definition, validating span and field configuration.
    ///
    /// # Errors
    /// Returns a [`LayoutError`] when `row_span` is zero, a field addresses a
    /// row outside the span, an `eop` footer lacks its `starts_with` anchor,
    /// or any field fails to compile.
    pub fn compile(def: ContextDef) -> Result<Self, LayoutError> {
        if def.row_span < 1 {
            return Err(LayoutError::InvalidRowSpan {
                context: def.name.clone(),
                row_span: def.row_span,
            });
        }
        if def.eop && def.starts_with.is_none() {
            return Err(LayoutError::FooterMissingPrefix {
                context: def.name.clone(),
            });
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        for field_def in &def.fields {
            if field_def.row >= def.row_span {
                return Err(LayoutError::FieldRowOutOfSpan {
                    context: def.name.clone(),
                    field: field_def.name.clone(),
                    row: field_def.row,
                    row_span: def.row_span,
                });
            }
            fields.push(FieldExtractor::compile(field_def.clone())?);
        }

        Ok(Self {
            def,
            fields,
            last_match: None,
        })
    }

    /// Context name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Parent context name, if any.
    pub fn parent(&self) -> Option<&str> {
        self.def.parent.as_deref()
    }

    /// Number of physical lines one record occupies.
    pub fn row_span(&self) -> usize {
        self.def.row_span
    }

    /// Whether this context is an anchored end-of-page footer.
    pub fn is_eop(&self) -> bool {
        self.def.eop
    }

    /// Fixed line-offset override hint for the driver.
    pub fn starts_at_row(&self) -> Option<usize> {
        self.def.starts_at_row
    }

    /// The underlying definition.
    pub fn def(&self) -> &ContextDef {
        &self.def
    }

    /// Validate the window of `row_span` lines starting at `start_index`.
    ///
    /// Returns `false` for any ordinary non-match; never an error. On `true`
    /// the value map is retrievable through [`match_result`]. On `false` any
    /// previously retained result is discarded.
    ///
    /// [`match_result`]: ContextMatcher::match_result
    pub fn valid<S: AsRef<str>>(&mut self, lines: &[S], start_index: usize) -> bool {
        self.last_match = self.try_match(lines, start_index);
        self.last_match.is_some()
    }

    /// Value map of the last successful [`valid`] call.
    ///
    /// [`valid`]: ContextMatcher::valid
    pub fn match_result(&self) -> Option<&MatchResult> {
        self.last_match.as_ref()
    }

    /// Pure matching primitive: validate the window and return its value map
    /// without touching the retained state.
    pub fn try_match<S: AsRef<str>>(
        &self,
        lines: &[S],
        start_index: usize,
    ) -> Option<MatchResult> {
        let end = start_index.checked_add(self.def.row_span)?;
        if end > lines.len() {
            return None;
        }
        let span = &lines[start_index..end];

        // Cheap guards first: O(prefix/suffix length), no field work.
        if let Some(prefix) = &self.def.starts_with {
            if !span[0].as_ref().trim_start().starts_with(prefix.as_str()) {
                return None;
            }
        }
        if let Some(suffix) = &self.def.ends_with {
            let last = span[span.len() - 1].as_ref().trim_end();
            if !last.ends_with(suffix.as_str()) {
                return None;
            }
        }

        // Per-attempt working copies; pop-out fields shrink the copy read by
        // later fields on the same row.
        let mut work: Vec<String> = span.iter().map(|l| l.as_ref().to_string()).collect();
        let mut result = MatchResult::new(&self.def.name);

        for field in &self.fields {
            let capture = field.extract(&work[field.row()])?;
            work[field.row()] = capture.remainder;
            if let Some(value) = capture.value {
                result.insert(field.name(), value);
            }
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Lambda;

    fn field_def(name: &str, format: &str) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            format: Some(format.to_string()),
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

    fn context_def(name: &str, fields: Vec<FieldDef>) -> ContextDef {
        ContextDef {
            name: name.to_string(),
            parent: None,
            starts_with: None,
            ends_with: None,
            row_span: 1,
            eop: false,
            starts_at_row: None,
            fields,
        }
    }

    #[test]
    fn test_single_line_match() {
        let def = context_def(
            "result",
            vec![
                field_def("rank", r"^\s*(\d{1,3})\s"),
                field_def("timing", r"(\d{1,2}[\.:]\d{2})"),
            ],
        );
        let mut matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["3 ROSSI 31.70".to_string()];

        assert!(matcher.valid(&lines, 0));
        let result = matcher.match_result().unwrap();
        assert_eq!(result.context_name(), "result");
        assert_eq!(result.get("rank"), Some("3"));
        assert_eq!(result.get("timing"), Some("31.70"));
    }

    #[test]
    fn test_pop_out_order_dependency() {
        // The second field only matches because the first popped its span.
        let def = context_def(
            "row",
            vec![
                field_def("first", r"^(\d+)\s"),
                field_def("second", r"^\s*(\d+)$"),
            ],
        );
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["12 34".to_string()];

        let result = matcher.try_match(&lines, 0).unwrap();
        assert_eq!(result.get("first"), Some("12"));
        assert_eq!(result.get("second"), Some("34"));
    }

    #[test]
    fn test_required_field_failure_discards_result() {
        let def = context_def(
            "row",
            vec![
                field_def("rank", r"^(\d+)"),
                field_def("missing", r"(XYZ)"),
            ],
        );
        let mut matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["3 ROSSI".to_string()];

        assert!(!matcher.valid(&lines, 0));
        assert!(matcher.match_result().is_none());
    }

    #[test]
    fn test_failure_clears_previous_result() {
        let def = context_def("row", vec![field_def("rank", r"^(\d+)")]);
        let mut matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["3 ROSSI".to_string(), "no digits".to_string()];

        assert!(matcher.valid(&lines, 0));
        assert!(matcher.match_result().is_some());

        assert!(!matcher.valid(&lines, 1));
        assert!(matcher.match_result().is_none());
    }

    #[test]
    fn test_optional_field_absence_is_unset() {
        let mut optional = field_def("category", r"\s(M\d{2})\b");
        optional.required = false;
        let def = context_def(
            "row",
            vec![field_def("rank", r"^(\d+)"), optional],
        );
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["3 ROSSI".to_string()];

        let result = matcher.try_match(&lines, 0).unwrap();
        assert_eq!(result.get("rank"), Some("3"));
        assert_eq!(result.get("category"), None);
        assert!(!result.has_field("category"));
    }

    #[test]
    fn test_starts_with_short_circuit() {
        // The field pattern would match, but the prefix guard fails first.
        let mut def = context_def("header", vec![field_def("any", r"(\w+)")]);
        def.starts_with = Some("CLASSIFICA".to_string());
        let mut matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["  RISULTATI 100 SL".to_string()];

        assert!(!matcher.valid(&lines, 0));
        assert!(matcher.match_result().is_none());
    }

    #[test]
    fn test_starts_with_trims_leading_whitespace() {
        let mut def = context_def("header", vec![]);
        def.starts_with = Some("CLASSIFICA".to_string());
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["   CLASSIFICA FINALE".to_string()];

        assert!(matcher.try_match(&lines, 0).is_some());
    }

    #[test]
    fn test_ends_with_guard() {
        let mut def = context_def("footer", vec![]);
        def.ends_with = Some("Pagina".to_string());
        let matcher = ContextMatcher::compile(def).unwrap();

        assert!(matcher
            .try_match(&["Elaborazione dati a cura di Pagina  ".to_string()], 0)
            .is_some());
        assert!(matcher
            .try_match(&["Elaborazione dati".to_string()], 0)
            .is_none());
    }

    #[test]
    fn test_multi_line_span_merges_rows() {
        let mut name_field = field_def("swimmer", r"^([A-Z ]+?)\s*$");
        name_field.row = 0;
        let mut team_field = field_def("team", r"^([A-Z ]+?)\s*$");
        team_field.row = 1;

        let mut def = context_def("entry", vec![name_field, team_field]);
        def.row_span = 2;
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["ROSSI MARIO".to_string(), "NUOTO CLUB".to_string()];

        let result = matcher.try_match(&lines, 0).unwrap();
        assert_eq!(result.get("swimmer"), Some("ROSSI MARIO"));
        assert_eq!(result.get("team"), Some("NUOTO CLUB"));
    }

    #[test]
    fn test_span_beyond_buffer_fails() {
        let mut def = context_def("entry", vec![]);
        def.row_span = 2;
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["only one line".to_string()];

        assert!(matcher.try_match(&lines, 0).is_none());
    }

    #[test]
    fn test_attempts_do_not_contaminate_input() {
        let def = context_def("row", vec![field_def("rank", r"^(\d+)")]);
        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec!["3 ROSSI".to_string()];

        let _ = matcher.try_match(&lines, 0);
        let _ = matcher.try_match(&lines, 0);

        assert_eq!(lines[0], "3 ROSSI");
    }

    #[test]
    fn test_eop_footer_anchored_by_prefix() {
        let mut def = context_def(
            "footer",
            vec![field_def("page", r"Page\s+(\d+)")],
        );
        def.eop = true;
        def.starts_with = Some("Results by".to_string());
        def.row_span = 2;
        let mut page = def.fields.pop().unwrap();
        page.row = 1;
        def.fields.push(page);

        let matcher = ContextMatcher::compile(def).unwrap();
        let lines = vec![
            "Results by MeetSoft".to_string(),
            "   Page 4".to_string(),
        ];

        let result = matcher.try_match(&lines, 0).unwrap();
        assert_eq!(result.get("page"), Some("4"));
    }

    #[test]
    fn test_compile_rejects_zero_row_span() {
        let mut def = context_def("bad", vec![]);
        def.row_span = 0;

        let err = ContextMatcher::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidRowSpan { .. }));
    }

    #[test]
    fn test_compile_rejects_field_row_outside_span() {
        let mut out_of_span = field_def("late", r"(\d+)");
        out_of_span.row = 1;
        let def = context_def("bad", vec![out_of_span]);

        let err = ContextMatcher::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::FieldRowOutOfSpan { .. }));
    }

    #[test]
    fn test_compile_rejects_footer_without_prefix() {
        let mut def = context_def("bad", vec![]);
        def.eop = true;

        let err = ContextMatcher::compile(def).unwrap_err();
        assert!(matches!(err, LayoutError::FooterMissingPrefix { .. }));
    }

    #[test]
    fn test_match_result_to_json() {
        let mut upper = field_def("name", r"([a-z]+)");
        upper.lambda = vec![Lambda::Uppercase];
        let def = context_def("row", vec![upper]);
        let matcher = ContextMatcher::compile(def).unwrap();

        let result = matcher.try_match(&["rossi".to_string()], 0).unwrap();
        let json = result.to_json();

        assert_eq!(json["context"], "row");
        assert_eq!(json["fields"]["name"], "ROSSI");
    }
}
