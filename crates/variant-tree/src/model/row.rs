//! Cached display rows.
//!
//! Every node keeps a [`RowCache`] with the text and flags of its three
//! cells, so views never stringify values themselves. Rows are recomputed
//! only when the node or one of its descendants changes.

use variant_tree_core::{Column, ContainerKind, Key, Variant};

use super::traits::ItemFlags;

/// Text shown in the value cell of a placeholder row.
pub const LOADING_TEXT: &str = "loading\u{2026}";

/// Inputs a row depends on besides the node's own key and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowContext {
    /// How many container levels to expand in the value text.
    pub depth: usize,
    /// The parent accepts key edits and every ancestor accepts writes.
    pub keys_editable: bool,
    /// Every ancestor accepts writes.
    pub values_editable: bool,
}

impl RowContext {
    /// Context of the root row, which has no parent.
    pub fn root(depth: usize) -> Self {
        Self {
            depth,
            keys_editable: false,
            values_editable: true,
        }
    }

    /// Context of the children of a container.
    ///
    /// `parent_writable` tells whether every ancestor of the parent accepts
    /// writes into the parent.
    pub fn for_children(depth: usize, parent: ContainerKind, parent_writable: bool) -> Self {
        Self {
            depth,
            keys_editable: parent_writable && parent.editable_keys(),
            values_editable: parent_writable && parent.editable_values(),
        }
    }
}

/// Flags of one cell, without rendering any text.
pub fn cell_flags(key: Option<&Key>, value: &Variant, context: &RowContext, column: Column) -> ItemFlags {
    let editable = match column {
        Column::Key => key.is_some() && context.keys_editable,
        Column::Value => value.is_atomic() && context.values_editable,
        Column::Type => key.is_some(),
    };
    ItemFlags::new()
        .with_never_has_children(value.is_atomic())
        .with_editable(editable)
}

/// Flags of every cell of a placeholder row.
pub fn loading_hint_flags() -> ItemFlags {
    ItemFlags::new()
        .with_selectable(false)
        .with_never_has_children(true)
}

/// Text and flags of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCache {
    pub key_text: String,
    pub value_text: String,
    pub type_text: String,
    pub key_flags: ItemFlags,
    pub value_flags: ItemFlags,
    pub type_flags: ItemFlags,
}

impl RowCache {
    /// Derive the row of a node.
    pub fn compute(key: Option<&Key>, value: &Variant, context: &RowContext) -> Self {
        Self {
            key_text: key.map(Key::display_text).unwrap_or_default(),
            value_text: value.display_text(context.depth),
            type_text: value.type_tag().name().to_string(),
            key_flags: cell_flags(key, value, context, Column::Key),
            value_flags: cell_flags(key, value, context, Column::Value),
            type_flags: cell_flags(key, value, context, Column::Type),
        }
    }

    /// The row shown while a container is still loading.
    pub fn loading_hint() -> Self {
        let flags = loading_hint_flags();
        Self {
            key_text: String::new(),
            value_text: LOADING_TEXT.to_string(),
            type_text: String::new(),
            key_flags: flags,
            value_flags: flags,
            type_flags: flags,
        }
    }

    pub fn text(&self, column: Column) -> &str {
        match column {
            Column::Key => &self.key_text,
            Column::Value => &self.value_text,
            Column::Type => &self.type_text,
        }
    }

    pub fn flags(&self, column: Column) -> ItemFlags {
        match column {
            Column::Key => self.key_flags,
            Column::Value => self.value_flags,
            Column::Type => self.type_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_child_context() -> RowContext {
        RowContext::for_children(1, ContainerKind::OrderedMap, true)
    }

    #[test]
    fn test_atomic_row() {
        let row = RowCache::compute(Some(&Key::from("a")), &Variant::from(-1), &map_child_context());
        assert_eq!(row.key_text, "\"a\"");
        assert_eq!(row.value_text, "-1");
        assert_eq!(row.type_text, "Integer");
        assert!(row.key_flags.editable);
        assert!(row.value_flags.editable);
        assert!(row.type_flags.editable);
        assert!(row.value_flags.never_has_children);
    }

    #[test]
    fn test_container_value_not_editable() {
        let value = Variant::list([1, 2, 3]);
        let row = RowCache::compute(Some(&Key::from(0)), &value, &RowContext::for_children(0, ContainerKind::List, true));
        assert_eq!(row.value_text, "[3]");
        assert!(!row.value_flags.editable);
        assert!(row.type_flags.editable);
        assert!(!row.value_flags.never_has_children);
    }

    #[test]
    fn test_read_only_chain() {
        let context = RowContext::for_children(1, ContainerKind::List, false);
        let row = RowCache::compute(Some(&Key::from(0)), &Variant::from(true), &context);
        assert!(!row.key_flags.editable);
        assert!(!row.value_flags.editable);
    }

    #[test]
    fn test_root_row() {
        let row = RowCache::compute(None, &Variant::list([1]), &RowContext::root(1));
        assert_eq!(row.key_text, "");
        assert!(!row.key_flags.editable);
        assert!(!row.type_flags.editable);
    }

    #[test]
    fn test_loading_hint() {
        let row = RowCache::loading_hint();
        assert_eq!(row.text(Column::Value), LOADING_TEXT);
        assert!(!row.flags(Column::Value).editable);
        assert!(!row.flags(Column::Key).selectable);
    }
}
