//! Layout loading and one-time validation.
//!
//! A layout is the complete ordered set of contexts describing one known
//! report template, authored as a YAML document. All structural checks run
//! here, once, at load time; matching never reports configuration problems.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::{ContextDef, ContextMatcher};

/// Configuration error raised while loading a layout. Fatal and not
/// retryable: the definition itself must be fixed.
#[derive(Debug, Clone)]
pub enum LayoutError {
    Io {
        path: PathBuf,
        message: String,
    },
    Yaml {
        name: String,
        message: String,
    },
    EmptyLayout {
        name: String,
    },
    DuplicateContext {
        name: String,
        context: String,
    },
    UnknownParent {
        name: String,
        context: String,
        parent: String,
    },
    InvalidPattern {
        field: String,
        message: String,
    },
    TooManyCaptures {
        field: String,
        found: usize,
    },
    InvalidRowSpan {
        context: String,
        row_span: usize,
    },
    FieldRowOutOfSpan {
        context: String,
        field: String,
        row: usize,
        row_span: usize,
    },
    InvalidTokenBounds {
        field: String,
        token_start: usize,
        token_end: usize,
    },
    FooterMissingPrefix {
        context: String,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Io { path, message } => {
                write!(f, "Failed to read layout file {}: {}", path.display(), message)
            }
            LayoutError::Yaml { name, message } => {
                write!(f, "Failed to parse layout '{}': {}", name, message)
            }
            LayoutError::EmptyLayout { name } => {
                write!(f, "Layout '{}' defines no contexts", name)
            }
            LayoutError::DuplicateContext { name, context } => {
                write!(f, "Layout '{}' defines context '{}' more than once", name, context)
            }
            LayoutError::UnknownParent {
                name,
                context,
                parent,
            } => write!(
                f,
                "Context '{}' in layout '{}' references unknown parent '{}'",
                context, name, parent
            ),
            LayoutError::InvalidPattern { field, message } => {
                write!(f, "Field '{}' has an invalid pattern: {}", field, message)
            }
            LayoutError::TooManyCaptures { field, found } => write!(
                f,
                "Field '{}' pattern has {} capture groups (at most 1 allowed)",
                field, found
            ),
            LayoutError::InvalidRowSpan { context, row_span } => {
                write!(f, "Context '{}' has invalid row_span {}", context, row_span)
            }
            LayoutError::FieldRowOutOfSpan {
                context,
                field,
                row,
                row_span,
            } => write!(
                f,
                "Field '{}' in context '{}' addresses row {} outside row_span {}",
                field, context, row, row_span
            ),
            LayoutError::InvalidTokenBounds {
                field,
                token_start,
                token_end,
            } => write!(
                f,
                "Field '{}' has token_start {} >= token_end {}",
                field, token_start, token_end
            ),
            LayoutError::FooterMissingPrefix { context } => write!(
                f,
                "Footer context '{}' declares eop without a starts_with anchor",
                context
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Layout definition as authored in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDef {
    /// Layout name (one per distinct vendor/format variant)
    pub layout: String,

    /// Ordered contexts; parent references are by name within this list
    pub contexts: Vec<ContextDef>,
}

/// Compiled, validated layout: an ordered collection of context matchers.
/// Read-only after load aside from each matcher's retained last result.
#[derive(Debug, Clone)]
pub struct Layout {
    name: String,
    contexts: Vec<ContextMatcher>,
}

impl Layout {
    /// Layout name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contexts in declaration order.
    pub fn contexts(&self) -> &[ContextMatcher] {
        &self.contexts
    }

    /// Mutable access for drivers that call `valid` through the layout.
    pub fn contexts_mut(&mut self) -> &mut [ContextMatcher] {
        &mut self.contexts
    }

    /// Look up a context by name.
    pub fn context(&self, name: &str) -> Option<&ContextMatcher> {
        self.contexts.iter().find(|c| c.name() == name)
    }

    /// Look up a context by name, mutably.
    pub fn context_mut(&mut self, name: &str) -> Option<&mut ContextMatcher> {
        self.contexts.iter_mut().find(|c| c.name() == name)
    }

    /// All context names in declaration order.
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Loads named layouts from a directory of YAML definitions, one file per
/// known report template.
#[derive(Debug, Clone)]
pub struct LayoutLibrary {
    root: PathBuf,
}

impl LayoutLibrary {
    /// Create a library rooted at a directory of `<name>.yaml` files.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and validate the named layout from `<root>/<name>.yaml` (or
    /// `.yml`).
    ///
    /// # Errors
    /// Any structural problem in the definition is a fatal [`LayoutError`];
    /// validation is never deferred to match time.
    pub fn load(&self, layout_name: &str) -> Result<Layout, LayoutError> {
        let path = self.layout_path(layout_name)?;
        let contents = fs::read_to_string(&path).map_err(|e| LayoutError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::load_str(layout_name, &contents)
    }

    /// Parse and validate a layout from an in-memory YAML document.
    pub fn load_str(layout_name: &str, yaml: &str) -> Result<Layout, LayoutError> {
        let def: LayoutDef = serde_yaml::from_str(yaml).map_err(|e| LayoutError::Yaml {
            name: layout_name.to_string(),
            message: e.to_string(),
        })?;
        compile(def)
    }

    /// Names of all layouts available in the library root, sorted.
    pub fn layout_names(&self) -> Result<Vec<String>, LayoutError> {
        let entries = fs::read_dir(&self.root).map_err(|e| LayoutError::Io {
            path: self.root.clone(),
            message: e.to_string(),
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LayoutError::Io {
                path: self.root.clone(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn layout_path(&self, layout_name: &str) -> Result<PathBuf, LayoutError> {
        let yaml = self.root.join(format!("{}.yaml", layout_name));
        if yaml.exists() {
            return Ok(yaml);
        }
        let yml = self.root.join(format!("{}.yml", layout_name));
        if yml.exists() {
            return Ok(yml);
        }
        Err(LayoutError::Io {
            path: yaml,
            message: "no such layout definition".to_string(),
        })
    }
}

/// Validate and compile a parsed layout definition.
fn compile(def: LayoutDef) -> Result<Layout, LayoutError> {
    if def.contexts.is_empty() {
        return Err(LayoutError::EmptyLayout { name: def.layout });
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for context in &def.contexts {
        if !seen.insert(context.name.as_str()) {
            return Err(LayoutError::DuplicateContext {
                name: def.layout.clone(),
                context: context.name.clone(),
            });
        }
    }

    // Parents are weak name references within the same layout.
    for context in &def.contexts {
        if let Some(parent) = &context.parent {
            if !seen.contains(parent.as_str()) {
                return Err(LayoutError::UnknownParent {
                    name: def.layout.clone(),
                    context: context.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let mut contexts = Vec::with_capacity(def.contexts.len());
    for context_def in def.contexts {
        contexts.push(ContextMatcher::compile(context_def)?);
    }

    Ok(Layout {
        name: def.layout,
        contexts,
    })
}
