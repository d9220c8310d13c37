//! Mutations through the model.
//!
//! Each operation validates and applies the change on the tree first. A
//! failure there returns before the node graph is touched, so nothing is
//! emitted. On success the graph is patched in place:
//!
//! - value snapshots are refreshed along the path to the root
//! - the rows of the changed node and of every ancestor are recomputed
//! - structural changes re-key the affected siblings only
//! - a container still loading in the background is restarted

use std::collections::HashMap;

use variant_tree_core::logging::targets;
use variant_tree_core::{AddressPath, Column, ContainerKind, ContainerRef, Key, TreeError, Variant, VariantType, convert};

use super::index::ModelIndex;
use super::node::{LoadState, NodeId, invariant_violated};
use super::row::{RowCache, RowContext, cell_flags};
use super::traits::{ItemFlags, ModelEvent};
use super::variant_model::VariantModel;

type Result<T> = std::result::Result<T, TreeError>;

impl VariantModel {
    // ---- values ----

    /// Replace the value at `address`.
    ///
    /// A new map key, or the index one past the end of a list, adds a row.
    pub fn set_value(&mut self, address: &AddressPath, value: Variant) -> Result<()> {
        let existed = self.tree.contains(address);
        self.tree.set(address, value)?;

        let mut events = Vec::new();
        match address.split_last() {
            Some((parent, key)) if !existed => self.child_inserted(&parent, key.clone(), &mut events),
            _ => self.value_changed(address, &mut events),
        }
        self.emit(events);
        Ok(())
    }

    /// Remove the value at `address`. Removing the root clears the model.
    pub fn delete(&mut self, address: &AddressPath) -> Result<Variant> {
        let Some((parent, key)) = address.split_last() else {
            let removed = self.root_value().clone();
            self.clear();
            return Ok(removed);
        };
        let removed = self.tree.delete(address)?;

        let mut events = Vec::new();
        self.child_removed(&parent, key.clone(), &mut events);
        self.emit(events);
        Ok(removed)
    }

    /// Convert the value at `address` to another type.
    pub fn convert_value(&mut self, address: &AddressPath, target: VariantType) -> Result<()> {
        let converted = convert(self.tree.get_ref(address)?, target)?;
        self.set_value(address, converted)
    }

    // ---- lists ----

    /// Insert into a list. A negative or too large index appends.
    pub fn list_insert(&mut self, address: &AddressPath, index: i64, value: Variant) -> Result<usize> {
        let position = self.tree.list_insert(address, index, value)?;
        let mut events = Vec::new();
        self.child_inserted(address, Key::from(position), &mut events);
        self.emit(events);
        Ok(position)
    }

    pub fn list_append(&mut self, address: &AddressPath, value: Variant) -> Result<usize> {
        self.list_insert(address, -1, value)
    }

    /// Remove a list element. A negative index removes the last one.
    pub fn list_remove_at(&mut self, address: &AddressPath, index: i64) -> Result<Variant> {
        let len = self.tree.list_len(address)?;
        let removed = self.tree.list_remove_at(address, index)?;
        let position = usize::try_from(index).unwrap_or(len - 1);

        let mut events = Vec::new();
        self.child_removed(address, Key::from(position), &mut events);
        self.emit(events);
        Ok(removed)
    }

    /// Move a list element; returns its final index.
    pub fn list_move(&mut self, address: &AddressPath, from: i64, to: i64) -> Result<usize> {
        let len = self.tree.list_len(address)?;
        let to = self.tree.list_move(address, from, to)?;
        let from = usize::try_from(from).unwrap_or(len - 1);

        let mut events = Vec::new();
        self.structural_change(address, &mut events, |model, parent, events| {
            model.move_list_child(parent, from, to, events);
        });
        self.emit(events);
        Ok(to)
    }

    // ---- maps ----

    pub fn map_set(&mut self, address: &AddressPath, key: &str, value: Variant) -> Result<()> {
        self.set_value(&address.child(key), value)
    }

    pub fn map_remove(&mut self, address: &AddressPath, key: &str) -> Result<Variant> {
        let removed = self.tree.map_remove(address, key)?;
        let mut events = Vec::new();
        self.child_removed(address, Key::from(key), &mut events);
        self.emit(events);
        Ok(removed)
    }

    /// Rename a map key. An entry already stored under `new` is replaced.
    pub fn map_rename_key(&mut self, address: &AddressPath, old: &str, new: &str) -> Result<()> {
        self.tree.map_rename_key(address, old, new)?;
        if old == new {
            return Ok(());
        }

        let mut events = Vec::new();
        self.structural_change(address, &mut events, |model, parent, events| {
            model.rename_map_child(parent, old, new, events);
        });
        self.emit(events);
        Ok(())
    }

    /// Add an entry under a fresh key and return the key.
    pub fn map_insert_new_key(&mut self, address: &AddressPath, base: Option<&str>, value: Variant) -> Result<String> {
        let name = self.tree.map_insert_new_key(address, base, value)?;
        let mut events = Vec::new();
        self.child_inserted(address, Key::from(name.as_str()), &mut events);
        self.emit(events);
        Ok(name)
    }

    // ---- rows ----

    /// Add an empty row under `parent`.
    ///
    /// Lists get an invalid value at position `row` (appending past the end);
    /// maps get a fresh key. Returns the new row's address.
    pub fn insert_row(&mut self, parent: &AddressPath, row: usize) -> Result<AddressPath> {
        let container = self.tree.get_ref(parent)?;
        let found = container.type_tag();
        match ContainerKind::of(container) {
            Some(ContainerKind::List) => {
                let index = i64::try_from(row).unwrap_or(-1);
                let position = self.list_insert(parent, index, Variant::Invalid)?;
                Ok(parent.child(position))
            }
            Some(_) => {
                let name = self.map_insert_new_key(parent, None, Variant::Invalid)?;
                Ok(parent.child(name))
            }
            None => Err(TreeError::not_a_container(parent, found)),
        }
    }

    /// Remove the visible row `row` under `parent`.
    pub fn remove_row(&mut self, parent: &AddressPath, row: usize) -> Result<Variant> {
        let child = self
            .arena
            .find(parent)
            .and_then(|id| self.arena.node(id).visible.get(row).copied())
            .ok_or_else(|| TreeError::address_not_found(parent.child(row)))?;
        let address = self.arena.address_of(child);
        self.delete(&address)
    }

    // ---- commits ----

    /// Commit an edit of one cell.
    ///
    /// - Value: `raw` becomes the new value.
    /// - Type: `raw` is a type name; the value is converted.
    /// - Key: a string renames a map entry; an integer moves a list element.
    ///
    /// A failed commit changes nothing and emits nothing.
    pub fn commit_edit(&mut self, address: &AddressPath, column: Column, raw: Variant) -> Result<()> {
        let result = self.apply_commit(address, column, raw);
        if let Err(err) = &result {
            tracing::debug!(target: targets::MODEL, %address, %column, error = %err, "edit rejected");
        }
        result
    }

    fn apply_commit(&mut self, address: &AddressPath, column: Column, raw: Variant) -> Result<()> {
        if !self.cell_flags(address, column)?.editable {
            return Err(TreeError::NotEditable {
                address: address.clone(),
                column,
            });
        }

        match column {
            Column::Value => self.set_value(address, raw),
            Column::Type => {
                let target = match raw.as_str() {
                    Some(name) => name.parse::<VariantType>()?,
                    None => return Err(TreeError::UnknownType(raw.to_string())),
                };
                self.convert_value(address, target)
            }
            Column::Key => {
                let Some((parent, key)) = address.split_last() else {
                    return Err(TreeError::NotEditable {
                        address: address.clone(),
                        column,
                    });
                };
                match key {
                    Key::Name(old) => {
                        let new = raw
                            .as_str()
                            .ok_or_else(|| TreeError::invalid_key(&parent, raw.to_string()))?;
                        self.map_rename_key(&parent, old, new)
                    }
                    Key::Index(from) => {
                        let to = list_target(&raw).ok_or_else(|| TreeError::invalid_key(&parent, raw.to_string()))?;
                        self.list_move(&parent, *from, to).map(|_| ())
                    }
                }
            }
        }
    }

    /// Interaction flags of any cell in the tree, materialized or not.
    pub fn cell_flags(&self, address: &AddressPath, column: Column) -> Result<ItemFlags> {
        if let Some(id) = self.arena.find(address) {
            return Ok(self.arena.node(id).row.flags(column));
        }
        let value = self.tree.get_ref(address)?;
        let context = self.context_for_address(address)?;
        Ok(cell_flags(address.last(), value, &context, column))
    }

    /// Row context of an address, derived from the tree alone.
    fn context_for_address(&self, address: &AddressPath) -> Result<RowContext> {
        let depth = self.config.display_depth;
        let Some((parent, _)) = address.split_last() else {
            return Ok(RowContext::root(depth));
        };

        let mut writable = RowContext::root(depth).values_editable;
        let mut current = self.tree.root();
        for key in parent.iter() {
            let container = ContainerRef::new(current).ok_or_else(|| TreeError::address_not_found(address))?;
            writable = writable && container.kind().editable_values();
            current = container.get(key).ok_or_else(|| TreeError::address_not_found(address))?;
        }
        let kind = ContainerKind::of(current).ok_or_else(|| TreeError::address_not_found(address))?;
        Ok(RowContext::for_children(depth, kind, writable))
    }

    /// [`commit_edit`](Self::commit_edit) addressed by a view index.
    pub fn commit_at(&mut self, index: &ModelIndex, raw: Variant) -> Result<()> {
        let column = Column::from_index(index.column());
        match (self.address_of(index), column) {
            (Some(address), Some(column)) if index.is_valid() => self.commit_edit(&address, column, raw),
            _ => Err(TreeError::address_not_found(AddressPath::root())),
        }
    }

    // ---- graph patching ----

    /// Walk to the deepest materialized node on `address` and refresh the
    /// value snapshots on its path.
    ///
    /// Returns that node and whether it is the node at `address` itself. If
    /// it is not, the change happened below a container whose children are
    /// not all materialized; a running load of that container is restarted.
    fn touch(&mut self, address: &AddressPath, events: &mut Vec<ModelEvent>) -> (NodeId, bool) {
        let (deepest, consumed) = self.arena.deepest_along(address);
        self.refresh_snapshots(deepest);

        let exact = consumed == address.len();
        if !exact {
            match self.arena.node(deepest).load {
                LoadState::NotRequested => {}
                LoadState::Loading | LoadState::PartiallyLoaded(_) => self.restart_load(deepest, events),
                LoadState::Loaded => invariant_violated(format_args!(
                    "loaded node at {} has no child for {}",
                    self.arena.address_of(deepest),
                    address
                )),
            }
        }
        (deepest, exact)
    }

    /// Copy the current values from the tree into `id` and its ancestors.
    fn refresh_snapshots(&mut self, id: NodeId) {
        let address = self.arena.address_of(id);
        for (level, node) in self.arena.path_to_root(id).into_iter().enumerate() {
            let prefix = AddressPath::from_keys(address.keys()[..address.len() - level].iter().cloned());
            let value = match self.tree.get_ref(&prefix) {
                Ok(value) => value.clone(),
                Err(_) => invariant_violated(format_args!("node at {} has no value in the tree", prefix)),
            };
            self.arena.node_mut(node).value = value;
        }
    }

    /// Recompute rows and visibility from `id` up to the root.
    fn settle(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        self.recompute_path(id, events);
        self.refresh_upwards(id, events);
    }

    /// The value at `address` was replaced.
    fn value_changed(&mut self, address: &AddressPath, events: &mut Vec<ModelEvent>) {
        let (id, exact) = self.touch(address, events);
        if exact {
            self.recompute_path(id, events);
            let node = self.arena.node(id);
            let reload = node.parent.is_none() || node.load.is_requested();
            self.reset_children(id, events);
            if reload {
                self.start_load(id, events);
            }
            self.refresh_upwards(id, events);
        } else {
            self.settle(id, events);
        }
    }

    /// Run a change to the children of the container at `parent_address`.
    ///
    /// `apply` only runs if the container is materialized and fully loaded;
    /// a container still loading is restarted instead.
    fn structural_change<F>(&mut self, parent_address: &AddressPath, events: &mut Vec<ModelEvent>, apply: F)
    where
        F: FnOnce(&mut Self, NodeId, &mut Vec<ModelEvent>),
    {
        let (id, exact) = self.touch(parent_address, events);
        if exact {
            match self.arena.node(id).load {
                LoadState::Loaded => apply(self, id, events),
                LoadState::Loading | LoadState::PartiallyLoaded(_) => self.restart_load(id, events),
                LoadState::NotRequested => {}
            }
        }
        self.settle(id, events);
    }

    fn child_inserted(&mut self, parent_address: &AddressPath, key: Key, events: &mut Vec<ModelEvent>) {
        self.structural_change(parent_address, events, |model, parent, events| match key {
            Key::Index(index) => model.insert_list_child(parent, index_of(index), events),
            Key::Name(_) => model.reconcile_map_children(parent, events),
        });
    }

    fn child_removed(&mut self, parent_address: &AddressPath, key: Key, events: &mut Vec<ModelEvent>) {
        self.structural_change(parent_address, events, |model, parent, events| match key {
            Key::Index(index) => model.remove_list_child(parent, index_of(index), events),
            Key::Name(_) => model.reconcile_map_children(parent, events),
        });
    }

    fn new_child(&mut self, parent: NodeId, key: Key, value: Variant, context: &RowContext) -> NodeId {
        let row = RowCache::compute(Some(&key), &value, context);
        let id = self.arena.create_child(parent, key, value, row);
        self.update_match_flag(id);
        id
    }

    /// Give the children in `range` keys matching their list positions.
    ///
    /// Runs after the structural rows went out, so the data changes address
    /// rows the view already has. A key filter may hide or reveal re-keyed
    /// rows, hence the second sync.
    fn rekey_list_children(&mut self, parent: NodeId, range: std::ops::Range<usize>, events: &mut Vec<ModelEvent>) {
        let children = self.arena.node(parent).children.clone();
        let mut rekeyed = false;
        for position in range {
            let Some(&child) = children.get(position) else {
                break;
            };
            let key = Key::from(position);
            if self.arena.node(child).key.as_ref() == Some(&key) {
                continue;
            }
            self.arena.node_mut(child).key = Some(key);
            self.recompute_row(child, events);
            self.update_match_flag(child);
            rekeyed = true;
        }
        if rekeyed {
            self.sync_visible(parent, events);
        }
    }

    fn insert_list_child(&mut self, parent: NodeId, index: usize, events: &mut Vec<ModelEvent>) {
        let value = self.arena.node(parent).value.clone();
        let Some(item) = value.as_list().and_then(|items| items.get(index)) else {
            invariant_violated(format_args!("list insert at {} is out of range", index));
        };
        let count = self.arena.node(parent).children.len();
        if index > count {
            invariant_violated(format_args!("list insert at {} past {} children", index, count));
        }

        let context = self.children_context(parent);
        let child = self.new_child(parent, Key::from(index), item.clone(), &context);
        self.arena.node_mut(parent).children.insert(index, child);
        self.sync_visible(parent, events);
        self.rekey_list_children(parent, index + 1..count + 1, events);
    }

    fn remove_list_child(&mut self, parent: NodeId, index: usize, events: &mut Vec<ModelEvent>) {
        let children = &mut self.arena.node_mut(parent).children;
        if index >= children.len() {
            invariant_violated(format_args!("list removal at {} past {} children", index, children.len()));
        }
        let removed = children.remove(index);
        let count = children.len();
        self.arena.free_subtree(removed);
        self.sync_visible(parent, events);
        self.rekey_list_children(parent, index..count, events);
    }

    fn move_list_child(&mut self, parent: NodeId, from: usize, to: usize, events: &mut Vec<ModelEvent>) {
        if from == to {
            return;
        }
        let children = &mut self.arena.node_mut(parent).children;
        if from >= children.len() || to >= children.len() {
            invariant_violated(format_args!("list move {} -> {} past {} children", from, to, children.len()));
        }
        let moved = children.remove(from);
        children.insert(to, moved);
        self.sync_visible(parent, events);
        self.rekey_list_children(parent, from.min(to)..from.max(to) + 1, events);
    }

    fn rename_map_child(&mut self, parent: NodeId, old: &str, new: &str, events: &mut Vec<ModelEvent>) {
        let Some(renamed) = self.arena.child_by_key(parent, &Key::from(old)) else {
            invariant_violated(format_args!("loaded map has no child for {:?}", old));
        };
        if let Some(replaced) = self.arena.child_by_key(parent, &Key::from(new)) {
            tracing::debug!(target: targets::MODEL, old, new, "rename replaces an existing row");
            self.arena.node_mut(parent).children.retain(|&c| c != replaced);
            self.arena.free_subtree(replaced);
        }
        self.arena.node_mut(renamed).key = Some(Key::from(new));
        self.reconcile_map_children(parent, events);
        self.recompute_row(renamed, events);
        self.update_match_flag(renamed);
        self.sync_visible(parent, events);
    }

    /// Match the children of a map node to its keys, reusing nodes by key.
    fn reconcile_map_children(&mut self, parent: NodeId, events: &mut Vec<ModelEvent>) {
        let value = self.arena.node(parent).value.clone();
        let Some(container) = ContainerRef::new(&value) else {
            invariant_violated(format_args!("map node holds a {}", value.type_tag()));
        };
        let context = self.children_context(parent);

        let mut existing: HashMap<Key, NodeId> = self
            .arena
            .node(parent)
            .children
            .iter()
            .filter_map(|&child| Some((self.arena.node(child).key.clone()?, child)))
            .collect();

        let mut children = Vec::with_capacity(container.len());
        for (key, item) in container.entries() {
            let child = match existing.remove(&key) {
                Some(child) => child,
                None => self.new_child(parent, key, item.clone(), &context),
            };
            children.push(child);
        }
        for (_, stale) in existing {
            self.arena.free_subtree(stale);
        }

        self.arena.node_mut(parent).children = children;
        self.sync_visible(parent, events);
    }
}

fn index_of(index: i64) -> usize {
    match usize::try_from(index) {
        Ok(index) => index,
        Err(_) => invariant_violated(format_args!("negative list position {}", index)),
    }
}

/// Target position of a list key edit.
fn list_target(raw: &Variant) -> Option<i64> {
    match raw {
        Variant::Int(i) => Some(*i),
        Variant::UInt(u) => i64::try_from(*u).ok(),
        Variant::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
