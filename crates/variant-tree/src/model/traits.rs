//! Item model trait, cell flags and change notification.

use variant_tree_core::{AddressPath, Signal, Variant};

use super::index::ModelIndex;

/// Flags describing how a cell can be interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ItemFlags {
    /// Cell can be selected.
    pub selectable: bool,
    /// Cell accepts edits.
    pub editable: bool,
    /// Cell is enabled.
    pub enabled: bool,
    /// Row can never have children (atomic values).
    pub never_has_children: bool,
}

impl ItemFlags {
    /// Selectable and enabled, not editable.
    pub fn new() -> Self {
        Self {
            selectable: true,
            enabled: true,
            ..Default::default()
        }
    }

    /// Selectable, enabled and editable.
    pub fn editable() -> Self {
        Self::new().with_editable(true)
    }

    /// Flags of a cell nobody can interact with.
    pub fn inert() -> Self {
        Self::default()
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn with_never_has_children(mut self, never: bool) -> Self {
        self.never_has_children = never;
        self
    }
}

/// A change to the rows a view displays.
///
/// Row numbers refer to the visible (filtered and sorted) order of the
/// parent's children. Events are delivered in the order the changes were
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Everything changed; views must re-query the model.
    Reset,
    /// Rows `first..=last` appeared under `parent`.
    RowsInserted {
        parent: AddressPath,
        first: usize,
        last: usize,
    },
    /// Rows `first..=last` disappeared from `parent`.
    RowsRemoved {
        parent: AddressPath,
        first: usize,
        last: usize,
    },
    /// The row at `from` was taken out and reinserted so it now sits at `to`.
    RowsMoved {
        parent: AddressPath,
        from: usize,
        to: usize,
    },
    /// The cached text or flags of the row at `address` changed.
    DataChanged { address: AddressPath },
}

impl ModelEvent {
    /// The parent the event is scoped to, if any.
    pub fn parent(&self) -> Option<&AddressPath> {
        match self {
            ModelEvent::Reset | ModelEvent::DataChanged { .. } => None,
            ModelEvent::RowsInserted { parent, .. }
            | ModelEvent::RowsRemoved { parent, .. }
            | ModelEvent::RowsMoved { parent, .. } => Some(parent),
        }
    }

    /// Whether this event changes row structure.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ModelEvent::DataChanged { .. })
    }
}

/// Signals emitted by a model.
#[derive(Debug, Default)]
pub struct ModelSignals {
    /// Every row change, in application order.
    pub changed: Signal<ModelEvent>,
    /// Display depth changed. Args: new depth.
    pub display_depth_changed: Signal<usize>,
    /// Dynamic sorting was switched. Args: enabled.
    pub dynamic_sort_changed: Signal<bool>,
    /// Filter pattern, mode or columns changed.
    pub filter_changed: Signal<()>,
    /// A background load finished. Args: address of the loaded container.
    pub load_finished: Signal<AddressPath>,
}

impl ModelSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver events collected during one mutation.
    pub fn emit_all(&self, events: Vec<ModelEvent>) {
        for event in events {
            self.changed.emit(event);
        }
    }
}

/// The interface views use to read and edit a hierarchical model.
///
/// Reads take `&self`. Loading more children and committing edits take
/// `&mut self`, since both change the model.
pub trait ItemModel {
    /// Number of rows under `parent`. The invalid index is the root.
    fn row_count(&self, parent: &ModelIndex) -> usize;

    /// Number of columns under `parent`.
    fn column_count(&self, parent: &ModelIndex) -> usize;

    /// Index of a cell, or the invalid index if out of range.
    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex;

    /// Parent of a cell; the invalid index for top-level rows.
    fn parent(&self, index: &ModelIndex) -> ModelIndex;

    /// Display text of a cell.
    fn data(&self, index: &ModelIndex) -> Option<&str>;

    /// Interaction flags of a cell.
    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        if index.is_valid() {
            ItemFlags::new()
        } else {
            ItemFlags::inert()
        }
    }

    /// Whether `parent` has, or can load, children.
    fn has_children(&self, parent: &ModelIndex) -> bool {
        self.row_count(parent) > 0
    }

    /// Header label of a column.
    fn header_data(&self, _section: usize) -> Option<&str> {
        None
    }

    /// Whether more children of `parent` can be loaded.
    fn can_fetch_more(&self, _parent: &ModelIndex) -> bool {
        false
    }

    /// Load more children of `parent`.
    fn fetch_more(&mut self, _parent: &ModelIndex) {}

    /// Commit an edit. Returns `true` on success.
    fn set_data(&mut self, _index: &ModelIndex, _value: Variant) -> bool {
        false
    }

    /// Signals for change notification.
    fn signals(&self) -> &ModelSignals;

    /// Convenience: a sibling cell in another column.
    fn sibling(&self, index: &ModelIndex, column: usize) -> ModelIndex {
        if !index.is_valid() {
            return ModelIndex::invalid();
        }
        let parent = self.parent(index);
        self.index(index.row(), column, &parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use variant_tree_core::address;

    #[test]
    fn test_item_flags_builders() {
        let flags = ItemFlags::new();
        assert!(flags.selectable && flags.enabled && !flags.editable);
        assert!(ItemFlags::editable().editable);
        assert!(!ItemFlags::inert().enabled);
        assert!(ItemFlags::new().with_never_has_children(true).never_has_children);
    }

    #[test]
    fn test_emit_all_preserves_order() {
        let signals = ModelSignals::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv = received.clone();
        signals.changed.connect(move |event| recv.lock().push(event.clone()));

        let events = vec![
            ModelEvent::RowsInserted { parent: address![], first: 0, last: 1 },
            ModelEvent::RowsMoved { parent: address![], from: 1, to: 0 },
            ModelEvent::DataChanged { address: address![0] },
        ];
        signals.emit_all(events.clone());
        assert_eq!(*received.lock(), events);
    }

    #[test]
    fn test_event_scope() {
        let event = ModelEvent::RowsRemoved { parent: address![2], first: 0, last: 0 };
        assert_eq!(event.parent(), Some(&address![2]));
        assert!(event.is_structural());
        assert!(!ModelEvent::DataChanged { address: address![] }.is_structural());
    }
}
