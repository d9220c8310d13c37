//! Logging targets and debugging helpers.
//!
//! All diagnostics are emitted through the `tracing` crate under the
//! targets in [`targets`]. The library never installs a subscriber; enable
//! output in an application with, for example:
//!
//! ```text
//! RUST_LOG=variant_tree::loader=debug,variant_tree::model=trace
//! ```
//!
//! [`PerfSpan`] measures whole-tree passes, and [`TreeFormatOptions`]
//! configures the tree dumps produced by the model crate.

/// Target names used by the variant tree crates.
pub mod targets {
    /// Value tree edits.
    pub const TREE: &str = "variant_tree::tree";
    /// Background node construction.
    pub const LOADER: &str = "variant_tree::loader";
    /// Filter recomputation.
    pub const FILTER: &str = "variant_tree::filter";
    /// Model façade and node graph.
    pub const MODEL: &str = "variant_tree::model";
    /// Stream encoding and decoding.
    pub const CODEC: &str = "variant_tree::codec";
    /// Signal emission.
    pub const SIGNAL: &str = "variant_tree::signal";
    /// Performance spans.
    pub const PERF: &str = "variant_tree::perf";
}

/// Connector style for tree dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// `+--` and `|` connectors.
    Ascii,
    /// Box-drawing connectors.
    #[default]
    Unicode,
    /// Indentation with a leading dash.
    Compact,
}

/// Options for tree dumps.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Spaces added per nesting level.
    pub indent_size: usize,
    /// Stop descending below this depth.
    pub max_depth: Option<usize>,
    /// Append the type column.
    pub show_types: bool,
    /// Append load state and visibility.
    pub show_state: bool,
    /// Include rows hidden by the filter.
    pub show_hidden: bool,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::Unicode,
            indent_size: 2,
            max_depth: None,
            show_types: true,
            show_state: false,
            show_hidden: false,
        }
    }
}

impl TreeFormatOptions {
    /// Everything, including hidden rows and load state.
    pub fn detailed() -> Self {
        Self {
            show_state: true,
            show_hidden: true,
            ..Default::default()
        }
    }

    /// Keys and values only.
    pub fn minimal() -> Self {
        Self {
            show_types: false,
            ..Default::default()
        }
    }

    /// Connector strings for a row: (continuation, branch, last branch).
    pub fn connectors(&self) -> (&'static str, &'static str, &'static str) {
        match self.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectors_per_style() {
        let ascii = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        assert_eq!(ascii.connectors().1, "+-- ");
        assert_eq!(TreeFormatOptions::default().connectors().2, "\u{2514}\u{2500}\u{2500} ");
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
