//! Row filtering.
//!
//! A [`Filter`] tests the cached text of a row's enabled columns against a
//! pattern. Four matching modes are supported:
//!
//! | Mode       | A cell matches when…                                  |
//! |------------|-------------------------------------------------------|
//! | `Contains` | the text contains the pattern                         |
//! | `Wildcard` | the glob (`*`, `?`) matches anywhere in the text      |
//! | `Regex`    | the regular expression matches the whole text         |
//! | `Fixed`    | the text equals the pattern                           |
//!
//! An empty pattern, or an empty column set, disables filtering.

use regex::Regex;
use serde::Deserialize;
use variant_tree_core::{Column, ContainerRef, TreeError, Variant};

use super::row::RowCache;

/// How a pattern is matched against cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Contains,
    Wildcard,
    Regex,
    Fixed,
}

/// The columns a filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterColumns {
    pub key: bool,
    pub value: bool,
    #[serde(rename = "type")]
    pub type_name: bool,
}

impl Default for FilterColumns {
    fn default() -> Self {
        Self::ALL
    }
}

impl FilterColumns {
    pub const ALL: FilterColumns = FilterColumns {
        key: true,
        value: true,
        type_name: true,
    };
    pub const KEY: FilterColumns = FilterColumns {
        key: true,
        value: false,
        type_name: false,
    };
    pub const VALUE: FilterColumns = FilterColumns {
        key: false,
        value: true,
        type_name: false,
    };
    pub const TYPE: FilterColumns = FilterColumns {
        key: false,
        value: false,
        type_name: true,
    };

    pub fn contains(&self, column: Column) -> bool {
        match column {
            Column::Key => self.key,
            Column::Value => self.value,
            Column::Type => self.type_name,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.key || self.value || self.type_name)
    }
}

/// A compiled filter.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pattern: String,
    mode: FilterMode,
    columns: FilterColumns,
    regex: Option<Regex>,
}

impl Filter {
    /// Compile a filter.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPattern`] if a `Regex` or `Wildcard` pattern does
    /// not compile.
    pub fn new(pattern: impl Into<String>, mode: FilterMode, columns: FilterColumns) -> Result<Self, TreeError> {
        let pattern = pattern.into();
        let source = match mode {
            _ if pattern.is_empty() => None,
            FilterMode::Regex => Some(format!("^(?:{})$", pattern)),
            FilterMode::Wildcard => Some(format!("^.*{}.*$", glob_to_regex(&pattern))),
            FilterMode::Contains | FilterMode::Fixed => None,
        };
        let regex = source
            .map(|source| {
                Regex::new(&source).map_err(|e| TreeError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            pattern,
            mode,
            columns,
            regex,
        })
    }

    /// A filter that accepts everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn columns(&self) -> FilterColumns {
        self.columns
    }

    /// Whether the filter hides anything at all.
    pub fn is_active(&self) -> bool {
        !self.pattern.is_empty() && !self.columns.is_empty()
    }

    /// Whether one cell's text satisfies the pattern.
    ///
    /// A leading and a trailing double quote are dropped first, so string
    /// cells are matched on their content.
    pub fn matches_text(&self, text: &str) -> bool {
        let text = unquote(text);
        match self.mode {
            FilterMode::Contains => text.contains(self.pattern.as_str()),
            FilterMode::Fixed => text == self.pattern,
            FilterMode::Regex | FilterMode::Wildcard => self.regex.as_ref().is_some_and(|re| re.is_match(text)),
        }
    }

    /// Whether a row is accepted on its own merit.
    pub fn accepts_row(&self, row: &RowCache) -> bool {
        if !self.is_active() {
            return true;
        }
        Column::ALL
            .into_iter()
            .any(|column| self.columns.contains(column) && self.matches_text(row.text(column)))
    }

    /// Whether any descendant of a container would be accepted.
    ///
    /// Used for containers whose children are not materialized yet, so a
    /// match deep inside an unloaded subtree still keeps its path visible.
    pub fn matches_descendants(&self, value: &Variant, depth: usize) -> bool {
        let Some(container) = ContainerRef::new(value) else {
            return false;
        };
        container.entries().into_iter().any(|(key, child)| {
            let accepted = (self.columns.key && self.matches_text(&key.display_text()))
                || (self.columns.value && self.matches_text(&child.display_text(depth)))
                || (self.columns.type_name && self.matches_text(child.type_tag().name()));
            accepted || self.matches_descendants(child, depth)
        })
    }
}

fn unquote(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                // Character classes pass through unchanged.
                out.push('[');
                for c in chars.by_ref() {
                    if c == '\\' {
                        out.push_str("\\\\");
                        continue;
                    }
                    out.push(c);
                    if c == ']' {
                        break;
                    }
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out
}
