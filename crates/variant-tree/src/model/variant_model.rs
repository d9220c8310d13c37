//! The item model over a variant tree.
//!
//! [`VariantModel`] owns a [`VariantTree`] and a graph of materialized
//! nodes that mirrors the part of the tree a view has asked for. Every
//! mutation goes through the model, which updates the tree first and then
//! patches the node graph, collecting a [`ModelEvent`] for each change it
//! applies. Events are emitted once the mutation is complete.
//!
//! # Rows
//!
//! The rows under a node are its *visible* children: those that pass the
//! filter, in container order or sorted by key when dynamic sorting is on.
//! While a large container loads in the background, one extra
//! "loading…" row follows the real ones.
//!
//! # Example
//!
//! ```
//! use variant_tree::{address, ItemModel, ModelIndex, Variant, VariantModel};
//!
//! let mut model = VariantModel::with_root(Variant::list([
//!     Variant::from(5),
//!     Variant::from("x"),
//! ]))
//! .unwrap();
//!
//! let root = ModelIndex::invalid();
//! assert_eq!(model.row_count(&root), 2);
//!
//! let cell = model.index(1, 1, &root);
//! assert_eq!(model.data(&cell), Some("\"x\""));
//!
//! model.set_value(&address![0], Variant::from(6)).unwrap();
//! assert_eq!(model.data(&model.index(0, 1, &root)), Some("6"));
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use variant_tree_core::logging::targets;
use variant_tree_core::ordering::compare_keys;
use variant_tree_core::{
    AddressPath, CodecError, Column, ContainerKind, ContainerRef, Key, PerfSpan, ThreadPool, TreeError,
    Variant, VariantTree, read_file, write_file,
};

use super::filter::{Filter, FilterColumns, FilterMode};
use super::index::ModelIndex;
use super::loader::LoaderHandle;
use super::node::{LoadState, NodeArena, NodeId, invariant_violated};
use super::row::{RowCache, RowContext};
use super::traits::{ItemFlags, ItemModel, ModelEvent, ModelSignals};
use crate::config::{ConfigError, ModelConfig};

/// A lazily loaded, filterable, sortable model over a [`VariantTree`].
pub struct VariantModel {
    pub(super) tree: VariantTree,
    pub(super) arena: NodeArena,
    pub(super) config: ModelConfig,
    pub(super) filter: Filter,
    loading_row: RowCache,
    pool: Arc<ThreadPool>,
    signals: ModelSignals,
}

impl std::fmt::Debug for VariantModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantModel")
            .field("root_type", &self.tree.root().type_tag())
            .field("nodes", &self.arena.len())
            .field("display_depth", &self.config.display_depth)
            .field("dynamic_sort", &self.config.dynamic_sort)
            .field("filter", &self.filter.pattern())
            .finish()
    }
}

impl VariantModel {
    /// An empty model with the default configuration.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(ModelConfig::default())
    }

    /// An empty model.
    ///
    /// # Errors
    ///
    /// Fails if the configured filter does not compile or the loader pool
    /// cannot be created.
    pub fn with_config(config: ModelConfig) -> Result<Self, ConfigError> {
        let filter = config.filter.compile()?;
        let pool = match config.pool_config() {
            Some(pool_config) => Arc::new(ThreadPool::new(pool_config)?),
            None => ThreadPool::global()?,
        };

        let mut model = Self {
            tree: VariantTree::new(),
            arena: NodeArena::new(),
            config,
            filter,
            loading_row: RowCache::loading_hint(),
            pool,
            signals: ModelSignals::new(),
        };
        model.rebuild_graph();
        Ok(model)
    }

    /// A model with the default configuration showing `root`.
    pub fn with_root(root: Variant) -> Result<Self, ConfigError> {
        let mut model = Self::new()?;
        model.set_root_content(root);
        Ok(model)
    }

    // ---- content ----

    /// The underlying tree.
    pub fn tree(&self) -> &VariantTree {
        &self.tree
    }

    pub fn root_value(&self) -> &Variant {
        self.tree.root()
    }

    /// A copy of the value at `address`.
    pub fn get(&self, address: &AddressPath) -> Result<Variant, TreeError> {
        self.tree.get(address)
    }

    /// Replace the whole content. Views receive a single [`ModelEvent::Reset`].
    pub fn set_root_content(&mut self, root: Variant) {
        tracing::debug!(target: targets::MODEL, root_type = %root.type_tag(), "set root content");
        self.tree.set_root_content(root);
        self.rebuild_graph();
        self.signals.emit_all(vec![ModelEvent::Reset]);
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.rebuild_graph();
        self.signals.emit_all(vec![ModelEvent::Reset]);
    }

    /// Replace the content with the values stored in `path`.
    ///
    /// On failure the model is left untouched.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let path = path.as_ref();
        let root = read_file(path).inspect_err(|err| {
            tracing::warn!(target: targets::CODEC, path = %path.display(), error = %err, "load failed");
        })?;
        self.set_root_content(root);
        Ok(())
    }

    /// Write the content to `path`.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let path = path.as_ref();
        write_file(path, self.tree.root()).inspect_err(|err| {
            tracing::warn!(target: targets::CODEC, path = %path.display(), error = %err, "save failed");
        })
    }

    // ---- settings ----

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn display_depth(&self) -> usize {
        self.config.display_depth
    }

    /// Change how many container levels value text expands.
    ///
    /// Every materialized row is recomputed.
    pub fn set_display_depth(&mut self, depth: usize) {
        if self.config.display_depth == depth {
            return;
        }
        self.config.display_depth = depth;

        let _perf = PerfSpan::new("display_depth");
        let mut events = Vec::new();
        let mut pending = vec![self.arena.root()];
        while let Some(id) = pending.pop() {
            self.recompute_row(id, &mut events);
            pending.extend(self.arena.node(id).children.iter().rev().copied());
        }
        let root = self.arena.root();
        self.refresh_subtree(root, &mut events);

        self.signals.emit_all(events);
        self.signals.display_depth_changed.emit(depth);
    }

    pub fn dynamic_sort(&self) -> bool {
        self.config.dynamic_sort
    }

    /// Keep siblings sorted by key.
    ///
    /// Rows are reordered in place; nodes keep their identity.
    pub fn set_dynamic_sort(&mut self, enabled: bool) {
        if self.config.dynamic_sort == enabled {
            return;
        }
        self.config.dynamic_sort = enabled;

        let _perf = PerfSpan::new("sort");
        let mut events = Vec::new();
        let root = self.arena.root();
        self.refresh_subtree(root, &mut events);

        self.signals.emit_all(events);
        self.signals.dynamic_sort_changed.emit(enabled);
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Replace the filter. An empty pattern shows everything.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidPattern`] if the pattern does not compile; the
    /// previous filter stays in effect.
    pub fn set_filter(
        &mut self,
        pattern: impl Into<String>,
        mode: FilterMode,
        columns: FilterColumns,
    ) -> Result<(), TreeError> {
        let filter = Filter::new(pattern, mode, columns)?;
        tracing::debug!(target: targets::FILTER, pattern = filter.pattern(), ?mode, "filter changed");
        self.filter = filter;

        let _perf = PerfSpan::new("filter");
        let mut events = Vec::new();
        let root = self.arena.root();
        self.refresh_subtree(root, &mut events);

        self.signals.emit_all(events);
        self.signals.filter_changed.emit(());
        Ok(())
    }

    // ---- inspection ----

    /// Index of the row showing `address`, or `None` if no view can see it.
    ///
    /// The root address maps to the invalid index.
    pub fn index_for_address(&self, address: &AddressPath, column: Column) -> Option<ModelIndex> {
        if address.is_root() {
            return Some(ModelIndex::invalid());
        }
        let id = self.arena.find(address)?;
        if !self.arena.is_attached(id) {
            return None;
        }
        let row = self.arena.visible_row(id)?;
        Some(ModelIndex::for_node(row, column.index(), id))
    }

    /// Address shown by an index. `None` for placeholder rows and stale
    /// indexes.
    pub fn address_of(&self, index: &ModelIndex) -> Option<AddressPath> {
        if !index.is_valid() {
            return Some(AddressPath::root());
        }
        let id = index.node_id().filter(|&id| self.arena.contains(id))?;
        Some(self.arena.address_of(id))
    }

    /// Whether `address` is materialized and reachable through visible rows.
    pub fn is_visible(&self, address: &AddressPath) -> bool {
        self.arena.find(address).is_some_and(|id| self.arena.is_attached(id))
    }

    /// Keys of the visible rows under `address`, in row order.
    pub fn visible_keys(&self, address: &AddressPath) -> Option<Vec<Key>> {
        let id = self.arena.find(address)?;
        let node = self.arena.node(id);
        Some(
            node.visible
                .iter()
                .filter_map(|&child| self.arena.node(child).key.clone())
                .collect(),
        )
    }

    /// Cached text of one cell of a materialized node.
    pub fn cell_text(&self, address: &AddressPath, column: Column) -> Option<&str> {
        let id = self.arena.find(address)?;
        Some(self.arena.node(id).row.text(column))
    }

    /// Load progress of a materialized container.
    pub fn load_state(&self, address: &AddressPath) -> Option<LoadState> {
        Some(self.arena.node(self.arena.find(address)?).load)
    }

    /// How many times the row of a materialized node has been computed.
    pub fn row_revision(&self, address: &AddressPath) -> Option<u64> {
        Some(self.arena.node(self.arena.find(address)?).row_revision)
    }

    /// Number of materialized nodes, the root included.
    pub fn materialized_count(&self) -> usize {
        self.arena.len()
    }

    /// Whether any background load is in flight.
    pub fn is_loading(&self) -> bool {
        self.arena
            .ids()
            .into_iter()
            .any(|id| self.arena.node(id).loader.is_some())
    }

    // ---- loading ----

    /// Drain every in-flight background load once.
    ///
    /// Returns the number of loads still running.
    pub fn poll_loaders(&mut self) -> usize {
        let loading: Vec<NodeId> = self
            .arena
            .ids()
            .into_iter()
            .filter(|&id| self.arena.node(id).loader.is_some())
            .collect();

        let mut events = Vec::new();
        let mut finished = Vec::new();
        let mut running = 0;
        for id in loading {
            // An earlier drain may have restarted or freed this node.
            if self.arena.get(id).is_none_or(|node| node.loader.is_none()) {
                continue;
            }
            match self.drain_loader(id, &mut events) {
                Some(address) => finished.push(address),
                None => running += 1,
            }
        }

        self.signals.emit_all(events);
        for address in finished {
            self.signals.load_finished.emit(address);
        }
        running
    }

    /// Poll until every background load is done, or `timeout` passes.
    ///
    /// Returns `true` if nothing is loading any more.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.poll_loaders() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub(super) fn node_for_index(&self, index: &ModelIndex) -> Option<NodeId> {
        if !index.is_valid() {
            return Some(self.arena.root());
        }
        index.node_id().filter(|&id| self.arena.contains(id))
    }

    /// Throw away the node graph and rebuild the root from the tree.
    fn rebuild_graph(&mut self) {
        let _perf = PerfSpan::new("rebuild_graph");
        let value = self.tree.root().clone();
        let row = RowCache::compute(None, &value, &RowContext::root(self.config.display_depth));
        let root = self.arena.reset(value, row);

        // Views are reset wholesale, so incremental events are dropped.
        let mut events = Vec::new();
        self.start_load(root, &mut events);
        self.refresh_subtree(root, &mut events);
    }

    /// Request the children of a container node.
    pub(super) fn start_load(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        let node = self.arena.node(id);
        if node.load.is_requested() {
            return;
        }
        let Some(len) = node.value.container_len() else {
            return;
        };

        if len < self.config.async_threshold {
            self.build_children(id);
            self.arena.node_mut(id).load = LoadState::Loaded;
            for child in self.arena.node(id).children.clone() {
                self.update_match_flag(child);
            }
            self.sync_visible(id, events);
            self.update_match_flag(id);
            return;
        }

        let context = self.children_context(id);
        let value = self.arena.node(id).value.clone();
        let handle = LoaderHandle::spawn(&self.pool, value, context, self.config.build_batch_size);
        let node = self.arena.node_mut(id);
        node.loader = Some(handle);
        node.load = LoadState::Loading;
        let hint_row = node.visible.len();

        if self.arena.is_attached(id) {
            events.push(ModelEvent::RowsInserted {
                parent: self.arena.address_of(id),
                first: hint_row,
                last: hint_row,
            });
        }
    }

    /// Materialize every child of a container synchronously.
    fn build_children(&mut self, id: NodeId) {
        let value = self.arena.node(id).value.clone();
        let Some(container) = ContainerRef::new(&value) else {
            return;
        };
        let context = self.children_context(id);
        let children: Vec<NodeId> = container
            .entries()
            .into_iter()
            .map(|(key, child)| {
                let row = RowCache::compute(Some(&key), child, &context);
                self.arena.create_child(id, key, child.clone(), row)
            })
            .collect();
        self.arena.node_mut(id).children = children;
    }

    /// Move finished children of a background load into the graph.
    ///
    /// Returns the container's address once the load is complete.
    fn drain_loader(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) -> Option<AddressPath> {
        let node = self.arena.node(id);
        let Some(handle) = node.loader.as_ref() else {
            invariant_violated(format_args!("node {:?} is {:?} without a loader", id, node.load));
        };
        let drained = handle.drain();
        let current = self.children_context(id);
        // Rows built under an older depth or capability chain are redone.
        let stale = handle.context() != current;

        if drained.nodes.is_empty() && !drained.done {
            return None;
        }

        for built in drained.nodes {
            let row = if stale {
                RowCache::compute(Some(&built.key), &built.value, &current)
            } else {
                built.row
            };
            let child = self.arena.create_child(id, built.key, built.value, row);
            self.arena.node_mut(id).children.push(child);
            self.update_match_flag(child);
        }

        let materialized = self.arena.node(id).children.len();
        let finished = if drained.done {
            self.sync_visible(id, events);
            let node = self.arena.node_mut(id);
            node.loader = None;
            node.load = LoadState::Loaded;
            let hint_row = node.visible.len();
            let address = self.arena.address_of(id);
            if self.arena.is_attached(id) {
                events.push(ModelEvent::RowsRemoved {
                    parent: address.clone(),
                    first: hint_row,
                    last: hint_row,
                });
            }
            tracing::debug!(target: targets::LOADER, %address, children = materialized, "load finished");
            Some(address)
        } else {
            self.arena.node_mut(id).load = LoadState::PartiallyLoaded(materialized);
            self.sync_visible(id, events);
            None
        };

        self.refresh_upwards(id, events);
        finished
    }

    /// Drop all children of a node and forget that they were requested.
    pub(super) fn reset_children(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        let node = self.arena.node(id);
        if !node.load.is_requested() && node.children.is_empty() {
            return;
        }
        let rows = node.visible.len();
        if self.arena.is_attached(id) {
            let parent = self.arena.address_of(id);
            if node.load.shows_placeholder() {
                events.push(ModelEvent::RowsRemoved {
                    parent: parent.clone(),
                    first: rows,
                    last: rows,
                });
            }
            if rows > 0 {
                events.push(ModelEvent::RowsRemoved {
                    parent,
                    first: 0,
                    last: rows - 1,
                });
            }
        }

        let node = self.arena.node_mut(id);
        let children = std::mem::take(&mut node.children);
        node.visible.clear();
        node.loader = None;
        node.load = LoadState::NotRequested;
        for child in children {
            self.arena.free_subtree(child);
        }
    }

    /// Start a load over, e.g. after the container changed mid-load.
    pub(super) fn restart_load(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        tracing::debug!(target: targets::LOADER, address = %self.arena.address_of(id), "restarting load");
        self.reset_children(id, events);
        self.start_load(id, events);
    }

    // ---- rows ----

    /// Context of a node's own row.
    pub(super) fn row_context(&self, id: NodeId) -> RowContext {
        match self.arena.node(id).parent {
            None => RowContext::root(self.config.display_depth),
            Some(parent) => self.children_context(parent),
        }
    }

    /// Context shared by the rows of a container's children.
    pub(super) fn children_context(&self, parent: NodeId) -> RowContext {
        let node = self.arena.node(parent);
        let Some(kind) = ContainerKind::of(&node.value) else {
            invariant_violated(format_args!(
                "node at {} has children but holds a {}",
                self.arena.address_of(parent),
                node.value.type_tag()
            ));
        };
        let writable = self.row_context(parent).values_editable;
        RowContext::for_children(self.config.display_depth, kind, writable)
    }

    /// Recompute the cached row of one node.
    pub(super) fn recompute_row(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        let context = self.row_context(id);
        let node = self.arena.node(id);
        let row = RowCache::compute(node.key.as_ref(), &node.value, &context);

        let node = self.arena.node_mut(id);
        node.row = row;
        node.row_revision += 1;
        let is_row = node.parent.is_some();

        if is_row && self.arena.is_attached(id) {
            events.push(ModelEvent::DataChanged {
                address: self.arena.address_of(id),
            });
        }
    }

    /// Recompute the row of a node and of each ancestor.
    pub(super) fn recompute_path(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        for node in self.arena.path_to_root(id) {
            self.recompute_row(node, events);
        }
    }

    // ---- visibility ----

    /// Re-derive whether a node or anything below it passes the filter.
    pub(super) fn update_match_flag(&mut self, id: NodeId) {
        let node = self.arena.node(id);
        let matches = !self.filter.is_active()
            || self.filter.accepts_row(&node.row)
            || node
                .children
                .iter()
                .any(|&child| self.arena.node(child).matches_filter)
            || (node.load != LoadState::Loaded
                && self
                    .filter
                    .matches_descendants(&node.value, self.config.display_depth));
        self.arena.node_mut(id).matches_filter = matches;
    }

    /// Bring the visible rows of every node under `id` up to date,
    /// children before parents.
    pub(super) fn refresh_subtree(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        for child in self.arena.node(id).children.clone() {
            self.refresh_subtree(child, events);
        }
        self.sync_visible(id, events);
        self.update_match_flag(id);
    }

    /// Bring the visible rows of `id` and each ancestor up to date.
    pub(super) fn refresh_upwards(&mut self, id: NodeId, events: &mut Vec<ModelEvent>) {
        for node in self.arena.path_to_root(id) {
            self.sync_visible(node, events);
            self.update_match_flag(node);
        }
    }

    fn desired_visible(&self, parent: NodeId) -> Vec<NodeId> {
        let mut desired: Vec<NodeId> = self
            .arena
            .node(parent)
            .children
            .iter()
            .copied()
            .filter(|&child| self.arena.node(child).matches_filter)
            .collect();
        if self.config.dynamic_sort {
            desired.sort_by(|&a, &b| match (&self.arena.node(a).key, &self.arena.node(b).key) {
                (Some(a), Some(b)) => compare_keys(a, b),
                _ => std::cmp::Ordering::Equal,
            });
        }
        desired
    }

    pub(super) fn sync_visible(&mut self, parent: NodeId, events: &mut Vec<ModelEvent>) {
        let desired = self.desired_visible(parent);
        self.apply_visible(parent, desired, events);
    }

    /// Turn the visible rows of `parent` into `desired`.
    ///
    /// Removals are applied back to front, then moves, then insertions, so
    /// each event's row numbers are valid at the moment it is applied.
    /// Events are only produced while a view can see `parent`.
    fn apply_visible(&mut self, parent: NodeId, desired: Vec<NodeId>, events: &mut Vec<ModelEvent>) {
        let mut current = std::mem::take(&mut self.arena.node_mut(parent).visible);
        if current == desired {
            self.arena.node_mut(parent).visible = current;
            return;
        }
        let address = self
            .arena
            .is_attached(parent)
            .then(|| self.arena.address_of(parent));
        let wanted: HashSet<NodeId> = desired.iter().copied().collect();

        let mut end = current.len();
        while end > 0 {
            if wanted.contains(&current[end - 1]) {
                end -= 1;
                continue;
            }
            let mut start = end - 1;
            while start > 0 && !wanted.contains(&current[start - 1]) {
                start -= 1;
            }
            for id in current.drain(start..end) {
                if let Some(node) = self.arena.get_mut(id) {
                    node.shown = false;
                }
            }
            if let Some(parent) = &address {
                events.push(ModelEvent::RowsRemoved {
                    parent: parent.clone(),
                    first: start,
                    last: end - 1,
                });
            }
            end = start;
        }

        let present: HashSet<NodeId> = current.iter().copied().collect();
        for (target, id) in desired.iter().filter(|id| present.contains(*id)).enumerate() {
            let Some(from) = current.iter().position(|c| c == id) else {
                invariant_violated(format_args!("visible row {:?} vanished during reorder", id));
            };
            if from != target {
                let moved = current.remove(from);
                current.insert(target, moved);
                if let Some(parent) = &address {
                    events.push(ModelEvent::RowsMoved {
                        parent: parent.clone(),
                        from,
                        to: target,
                    });
                }
            }
        }

        let mut position = 0;
        while position < desired.len() {
            if present.contains(&desired[position]) {
                position += 1;
                continue;
            }
            let first = position;
            while position < desired.len() && !present.contains(&desired[position]) {
                let id = desired[position];
                current.insert(position, id);
                self.arena.node_mut(id).shown = true;
                position += 1;
            }
            if let Some(parent) = &address {
                events.push(ModelEvent::RowsInserted {
                    parent: parent.clone(),
                    first,
                    last: position - 1,
                });
            }
        }

        self.arena.node_mut(parent).visible = current;
    }

    pub(super) fn emit(&self, events: Vec<ModelEvent>) {
        self.signals.emit_all(events);
    }
}

impl ItemModel for VariantModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        let Some(id) = self.node_for_index(parent) else {
            return 0;
        };
        let node = self.arena.node(id);
        node.visible.len() + usize::from(node.load.shows_placeholder())
    }

    fn column_count(&self, _parent: &ModelIndex) -> usize {
        Column::COUNT
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if column >= Column::COUNT {
            return ModelIndex::invalid();
        }
        let Some(id) = self.node_for_index(parent) else {
            return ModelIndex::invalid();
        };
        let node = self.arena.node(id);
        match node.visible.get(row) {
            Some(&child) => ModelIndex::for_node(row, column, child),
            None if row == node.visible.len() && node.load.shows_placeholder() => {
                ModelIndex::for_loading_hint(row, column, id)
            }
            None => ModelIndex::invalid(),
        }
    }

    fn parent(&self, index: &ModelIndex) -> ModelIndex {
        let parent = match (index.node_id(), index.hint_parent()) {
            (Some(id), _) => self.arena.get(id).and_then(|node| node.parent),
            (None, Some(parent)) => Some(parent).filter(|&p| self.arena.contains(p)),
            (None, None) => None,
        };
        match parent {
            Some(parent) if parent != self.arena.root() => match self.arena.visible_row(parent) {
                Some(row) => ModelIndex::for_node(row, 0, parent),
                None => ModelIndex::invalid(),
            },
            _ => ModelIndex::invalid(),
        }
    }

    fn data(&self, index: &ModelIndex) -> Option<&str> {
        let column = Column::from_index(index.column())?;
        if index.is_loading_hint() {
            return Some(self.loading_row.text(column));
        }
        let node = self.arena.get(index.node_id()?)?;
        Some(node.row.text(column))
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        let Some(column) = Column::from_index(index.column()) else {
            return ItemFlags::inert();
        };
        if index.is_loading_hint() {
            return self.loading_row.flags(column);
        }
        index
            .node_id()
            .and_then(|id| self.arena.get(id))
            .map_or_else(ItemFlags::inert, |node| node.row.flags(column))
    }

    fn has_children(&self, parent: &ModelIndex) -> bool {
        self.node_for_index(parent)
            .and_then(|id| self.arena.node(id).value.container_len())
            .is_some_and(|len| len > 0)
    }

    fn header_data(&self, section: usize) -> Option<&str> {
        Column::from_index(section).map(Column::header)
    }

    fn can_fetch_more(&self, parent: &ModelIndex) -> bool {
        let Some(id) = self.node_for_index(parent) else {
            return false;
        };
        let node = self.arena.node(id);
        match node.load {
            LoadState::NotRequested => node.value.container_len().is_some_and(|len| len > 0),
            LoadState::Loading | LoadState::PartiallyLoaded(_) => true,
            LoadState::Loaded => false,
        }
    }

    fn fetch_more(&mut self, parent: &ModelIndex) {
        let Some(id) = self.node_for_index(parent) else {
            return;
        };
        let mut events = Vec::new();
        let mut finished = None;
        match self.arena.node(id).load {
            LoadState::NotRequested => {
                self.start_load(id, &mut events);
                let parent = self.arena.node(id).parent;
                if let Some(parent) = parent {
                    self.refresh_upwards(parent, &mut events);
                }
            }
            LoadState::Loading | LoadState::PartiallyLoaded(_) => {
                finished = self.drain_loader(id, &mut events);
            }
            LoadState::Loaded => {}
        }
        self.signals.emit_all(events);
        if let Some(address) = finished {
            self.signals.load_finished.emit(address);
        }
    }

    fn set_data(&mut self, index: &ModelIndex, value: Variant) -> bool {
        if !index.is_valid() {
            return false;
        }
        let (Some(address), Some(column)) = (self.address_of(index), Column::from_index(index.column())) else {
            return false;
        };
        self.commit_edit(&address, column, value).is_ok()
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}
