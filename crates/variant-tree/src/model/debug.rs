//! Text dumps of the materialized node graph.

use variant_tree_core::TreeFormatOptions;

use super::node::{LoadState, NodeId};
use super::row::LOADING_TEXT;
use super::variant_model::VariantModel;

impl VariantModel {
    /// Render the materialized nodes as an indented tree.
    ///
    /// Only materialized nodes appear; an unexpanded container is a single
    /// line. A container still loading ends with a placeholder line.
    pub fn dump_tree(&self, options: &TreeFormatOptions) -> String {
        let mut output = String::new();
        let root = self.arena.root();
        self.format_node_into(root, 0, true, &mut Vec::new(), options, &mut output);
        output
    }

    fn format_node_into(
        &self,
        id: NodeId,
        depth: usize,
        is_last: bool,
        open: &mut Vec<bool>,
        options: &TreeFormatOptions,
        output: &mut String,
    ) {
        let node = self.arena.node(id);
        output.push_str(&build_prefix(open, depth, is_last, options));

        match &node.key {
            Some(_) => {
                output.push_str(&node.row.key_text);
                output.push_str(": ");
            }
            None => output.push_str("(root) "),
        }
        output.push_str(&node.row.value_text);
        if options.show_types {
            output.push_str(&format!(" ({})", node.row.type_text));
        }
        if options.show_state {
            output.push_str(&format!(" [{}]", state_label(node.load)));
            if node.parent.is_some() && !node.shown {
                output.push_str(" [hidden]");
            }
        }
        output.push('\n');

        if options.max_depth.is_some_and(|max| depth >= max) {
            return;
        }

        let children = if options.show_hidden {
            &node.children
        } else {
            &node.visible
        };
        let placeholder = node.load.shows_placeholder();

        if depth > 0 {
            open.push(!is_last);
        }
        for (position, &child) in children.iter().enumerate() {
            let last = position + 1 == children.len() && !placeholder;
            self.format_node_into(child, depth + 1, last, open, options, output);
        }
        if placeholder {
            output.push_str(&build_prefix(open, depth + 1, true, options));
            output.push_str(LOADING_TEXT);
            output.push('\n');
        }
        if depth > 0 {
            open.pop();
        }
    }
}

/// Prefix of a line at `depth`. `open` tells, per ancestor level below the
/// root, whether that level still has siblings to come.
fn build_prefix(open: &[bool], depth: usize, is_last: bool, options: &TreeFormatOptions) -> String {
    if depth == 0 {
        return String::new();
    }
    let (continuation, branch, last) = options.connectors();

    let mut prefix = String::new();
    for &more in open {
        if more {
            prefix.push_str(continuation);
        } else {
            prefix.push_str(&" ".repeat(continuation.chars().count()));
        }
        prefix.push_str(&" ".repeat(options.indent_size));
    }
    prefix.push_str(if is_last { last } else { branch });
    prefix
}

fn state_label(state: LoadState) -> String {
    match state {
        LoadState::NotRequested => "collapsed".to_string(),
        LoadState::Loading => "loading".to_string(),
        LoadState::PartiallyLoaded(count) => format!("loading {}", count),
        LoadState::Loaded => "loaded".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterColumns, FilterMode, ItemModel};
    use variant_tree_core::{Column, TreeStyle, Variant, address};

    fn sample() -> VariantModel {
        let mut model = VariantModel::with_root(Variant::ordered_map([
            ("name", Variant::from("report")),
            ("tags", Variant::list(["a", "b"])),
        ]))
        .unwrap();
        let tags = model.index_for_address(&address!["tags"], Column::Key).unwrap();
        model.fetch_more(&tags);
        model
    }

    #[test]
    fn test_ascii_dump() {
        let model = sample();
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            show_types: false,
            ..Default::default()
        };
        let expected = "\
(root) {\"name\": \"report\", \"tags\": [2]}
+-- \"name\": \"report\"
`-- \"tags\": [\"a\", \"b\"]
   +-- 0: \"a\"
   `-- 1: \"b\"
";
        assert_eq!(model.dump_tree(&options), expected);
    }

    #[test]
    fn test_max_depth_and_types() {
        let model = sample();
        let options = TreeFormatOptions {
            style: TreeStyle::Compact,
            max_depth: Some(1),
            ..Default::default()
        };
        let dump = model.dump_tree(&options);
        assert_eq!(dump.lines().count(), 3);
        assert!(dump.contains("- \"tags\": [\"a\", \"b\"] (List)"));
    }

    #[test]
    fn test_hidden_rows_only_when_asked() {
        let mut model = sample();
        model.set_filter("name", FilterMode::Contains, FilterColumns::KEY).unwrap();

        let visible = model.dump_tree(&TreeFormatOptions::default());
        assert!(visible.contains("\"name\": "));
        assert!(!visible.contains("\"tags\": [\"a\""));

        let detailed = model.dump_tree(&TreeFormatOptions::detailed());
        assert!(detailed.contains("\"tags\": [\"a\""));
        assert!(detailed.contains("[hidden]"));
        assert!(detailed.contains("[loaded]"));
    }
}
