//! Cell addressing for views.

use super::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum IndexTarget {
    #[default]
    Invalid,
    Node(NodeId),
    /// The "loading…" row of the given parent.
    LoadingHint(NodeId),
}

/// Identifies one cell of the model: a row under a parent, and a column.
///
/// Indexes are cheap handles. They stay valid as long as the node they
/// point at exists; an index whose node was discarded behaves like the
/// invalid index. Row numbers are not updated when siblings move, so views
/// should re-request indexes after structural changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    target: IndexTarget,
}

impl ModelIndex {
    /// The invalid index, which also stands for the root.
    pub fn invalid() -> Self {
        Self::default()
    }

    pub(crate) fn for_node(row: usize, column: usize, node: NodeId) -> Self {
        Self {
            row,
            column,
            target: IndexTarget::Node(node),
        }
    }

    pub(crate) fn for_loading_hint(row: usize, column: usize, parent: NodeId) -> Self {
        Self {
            row,
            column,
            target: IndexTarget::LoadingHint(parent),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.target, IndexTarget::Invalid)
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// The node this cell shows, if it is a real row.
    pub fn node_id(&self) -> Option<NodeId> {
        match self.target {
            IndexTarget::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Whether this cell belongs to a "loading…" placeholder row.
    pub fn is_loading_hint(&self) -> bool {
        matches!(self.target, IndexTarget::LoadingHint(_))
    }

    /// The parent whose placeholder row this is.
    pub(crate) fn hint_parent(&self) -> Option<NodeId> {
        match self.target {
            IndexTarget::LoadingHint(parent) => Some(parent),
            _ => None,
        }
    }

    /// The same row in another column.
    pub fn with_column(&self, column: usize) -> Self {
        Self { column, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_invalid_index() {
        let index = ModelIndex::invalid();
        assert!(!index.is_valid());
        assert_eq!(index.node_id(), None);
        assert!(!index.is_loading_hint());
    }

    #[test]
    fn test_node_and_hint_indexes() {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let id = ids.insert(());

        let index = ModelIndex::for_node(3, 1, id);
        assert!(index.is_valid());
        assert_eq!(index.node_id(), Some(id));
        assert_eq!(index.with_column(2).column(), 2);
        assert_eq!(index.with_column(2).row(), 3);

        let hint = ModelIndex::for_loading_hint(0, 0, id);
        assert!(hint.is_valid());
        assert!(hint.is_loading_hint());
        assert_eq!(hint.node_id(), None);
        assert_eq!(hint.hint_parent(), Some(id));
    }
}
