//! The materialized node graph.
//!
//! Nodes live in a [`SlotMap`] arena and refer to each other by [`NodeId`].
//! The parent owns its children top-down: freeing a node frees its whole
//! subtree, and a stale id simply stops resolving.

use slotmap::{SlotMap, new_key_type};
use variant_tree_core::{AddressPath, Key, Variant};

use super::loader::LoaderHandle;
use super::row::RowCache;

new_key_type! {
    /// Stable identifier of a materialized node.
    pub struct NodeId;
}

/// Progress of child materialization for a container node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nobody asked for the children yet.
    #[default]
    NotRequested,
    /// A background build is running and nothing was drained yet.
    Loading,
    /// A background build is running; this many children are materialized.
    PartiallyLoaded(usize),
    /// Every child is materialized.
    Loaded,
}

impl LoadState {
    /// Whether a "loading…" row is shown after the children.
    pub fn shows_placeholder(self) -> bool {
        matches!(self, LoadState::Loading | LoadState::PartiallyLoaded(_))
    }

    /// Whether children were requested at some point.
    pub fn is_requested(self) -> bool {
        self != LoadState::NotRequested
    }
}

/// One materialized value.
#[derive(Debug)]
pub(crate) struct TreeNode {
    /// Snapshot of the value; the tree is the authority.
    pub value: Variant,
    pub parent: Option<NodeId>,
    /// Key in the parent container; `None` only for the root.
    pub key: Option<Key>,
    /// Materialized children in container order.
    pub children: Vec<NodeId>,
    /// Children that pass the filter, in display order.
    pub visible: Vec<NodeId>,
    /// Whether this node is in its parent's visible list.
    pub shown: bool,
    /// The node or one of its descendants passes the filter.
    pub matches_filter: bool,
    pub load: LoadState,
    pub row: RowCache,
    /// Incremented on every row recomputation.
    pub row_revision: u64,
    pub loader: Option<LoaderHandle>,
}

impl TreeNode {
    fn new(parent: Option<NodeId>, key: Option<Key>, value: Variant, row: RowCache) -> Self {
        Self {
            value,
            parent,
            key,
            children: Vec::new(),
            visible: Vec::new(),
            shown: false,
            matches_filter: true,
            load: LoadState::NotRequested,
            row,
            row_revision: 1,
            loader: None,
        }
    }
}

/// Panics with a coherency message. Reaching this is a bug in the model.
#[track_caller]
pub(crate) fn invariant_violated(message: std::fmt::Arguments<'_>) -> ! {
    panic!("variant model invariant violated: {}", message)
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: SlotMap<NodeId, TreeNode>,
    root: Option<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node and install a fresh root.
    pub fn reset(&mut self, value: Variant, row: RowCache) -> NodeId {
        self.nodes.clear();
        let root = self.nodes.insert(TreeNode::new(None, None, value, row));
        self.root = Some(root);
        root
    }

    #[track_caller]
    pub fn root(&self) -> NodeId {
        match self.root {
            Some(root) => root,
            None => invariant_violated(format_args!("node graph has no root")),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id)
    }

    #[track_caller]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        match self.nodes.get(id) {
            Some(node) => node,
            None => invariant_violated(format_args!("node {:?} is not in the arena", id)),
        }
    }

    #[track_caller]
    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => invariant_violated(format_args!("node {:?} is not in the arena", id)),
        }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.keys().collect()
    }

    /// Create a detached child node. The caller places it in `children`.
    pub fn create_child(&mut self, parent: NodeId, key: Key, value: Variant, row: RowCache) -> NodeId {
        self.nodes.insert(TreeNode::new(Some(parent), Some(key), value, row))
    }

    /// Free `id` and all its descendants. In-flight loads are detached.
    pub fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(current) {
                pending.extend(node.children);
            }
        }
    }

    /// Address of a node, built from the keys on its way up.
    pub fn address_of(&self, id: NodeId) -> AddressPath {
        let mut keys = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            if let Some(key) = &node.key {
                keys.push(key.clone());
            }
            current = node.parent.and_then(|parent| self.get(parent));
        }
        keys.reverse();
        AddressPath::from(keys)
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            path.push(node_id);
            current = self.node(node_id).parent;
        }
        path
    }

    /// Whether a view can currently see the node's rows: it is the root, or
    /// shown under an attached parent.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let node = self.node(current);
            match node.parent {
                None => return true,
                Some(_) if !node.shown => return false,
                Some(parent) => current = parent,
            }
        }
    }

    /// The materialized child of `parent` reached by `key`.
    pub fn child_by_key(&self, parent: NodeId, key: &Key) -> Option<NodeId> {
        let children = &self.node(parent).children;
        // List children are materialized in index order.
        let guess = key
            .as_index()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| children.get(i).copied());
        if let Some(id) = guess
            && self.node(id).key.as_ref() == Some(key)
        {
            return Some(id);
        }
        children
            .iter()
            .copied()
            .find(|&child| self.node(child).key.as_ref() == Some(key))
    }

    /// Walk `address` down the materialized nodes.
    ///
    /// Returns the deepest node reached and how many keys it consumed.
    pub fn deepest_along(&self, address: &AddressPath) -> (NodeId, usize) {
        let mut current = self.root();
        for (depth, key) in address.iter().enumerate() {
            match self.child_by_key(current, key) {
                Some(child) => current = child,
                None => return (current, depth),
            }
        }
        (current, address.len())
    }

    /// The node at `address`, if it is materialized.
    pub fn find(&self, address: &AddressPath) -> Option<NodeId> {
        let (id, consumed) = self.deepest_along(address);
        (consumed == address.len()).then_some(id)
    }

    /// Position of a shown node among its parent's visible rows.
    pub fn visible_row(&self, id: NodeId) -> Option<usize> {
        let node = self.get(id)?;
        let parent = self.get(node.parent?)?;
        parent.visible.iter().position(|&child| child == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_children(keys: &[&str]) -> (NodeArena, NodeId, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let root = arena.reset(Variant::Invalid, RowCache::default());
        let children: Vec<NodeId> = keys
            .iter()
            .map(|k| arena.create_child(root, Key::from(*k), Variant::from(1), RowCache::default()))
            .collect();
        arena.node_mut(root).children = children.clone();
        (arena, root, children)
    }

    #[test]
    fn test_address_and_lookup() {
        let (mut arena, root, children) = arena_with_children(&["a", "b"]);
        let grandchild = arena.create_child(children[1], Key::from(0), Variant::from(2), RowCache::default());
        arena.node_mut(children[1]).children.push(grandchild);

        let address = AddressPath::from_keys([Key::from("b"), Key::from(0)]);
        assert_eq!(arena.address_of(grandchild), address);
        assert_eq!(arena.find(&address), Some(grandchild));
        assert_eq!(arena.find(&AddressPath::root()), Some(root));
        assert_eq!(arena.path_to_root(grandchild), vec![grandchild, children[1], root]);

        let missing = AddressPath::from_keys([Key::from("b"), Key::from(4)]);
        assert_eq!(arena.find(&missing), None);
        assert_eq!(arena.deepest_along(&missing), (children[1], 1));
    }

    #[test]
    fn test_attachment_follows_shown() {
        let (mut arena, root, children) = arena_with_children(&["a"]);
        assert!(arena.is_attached(root));
        assert!(!arena.is_attached(children[0]));
        arena.node_mut(children[0]).shown = true;
        arena.node_mut(root).visible.push(children[0]);
        assert!(arena.is_attached(children[0]));
        assert_eq!(arena.visible_row(children[0]), Some(0));
    }

    #[test]
    fn test_free_subtree() {
        let (mut arena, _root, children) = arena_with_children(&["a", "b"]);
        let grandchild = arena.create_child(children[0], Key::from(0), Variant::from(2), RowCache::default());
        arena.node_mut(children[0]).children.push(grandchild);
        assert_eq!(arena.len(), 4);

        arena.free_subtree(children[0]);
        assert_eq!(arena.len(), 2);
        assert!(!arena.contains(grandchild));
        assert!(arena.contains(children[1]));
    }

    #[test]
    fn test_load_state_placeholder() {
        assert!(!LoadState::NotRequested.shows_placeholder());
        assert!(LoadState::Loading.shows_placeholder());
        assert!(LoadState::PartiallyLoaded(3).shows_placeholder());
        assert!(!LoadState::Loaded.shows_placeholder());
        assert!(LoadState::Loaded.is_requested());
    }
}
