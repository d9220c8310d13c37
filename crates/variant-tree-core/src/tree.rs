//! The variant tree: the authoritative value plus a navigation cursor.
//!
//! [`VariantTree`] owns the root [`Variant`] and exposes get/set/delete at
//! an [`AddressPath`], together with list and map conveniences. Every write
//! walks the address with [`ContainerMut`], which copies any container
//! still shared with a snapshot before touching it. A value obtained from
//! [`VariantTree::get`] therefore never changes afterwards.
//!
//! Each operation validates the full address before it mutates anything, so
//! a failed call leaves the tree exactly as it was.
//!
//! # Example
//!
//! ```
//! use variant_tree_core::{address, Variant, VariantTree};
//!
//! let mut tree = VariantTree::with_root(Variant::list([
//!     Variant::from(5),
//!     Variant::from("x"),
//!     Variant::ordered_map([("a", Variant::from(-1)), ("b", Variant::from(true))]),
//! ]));
//!
//! let before = tree.get(&address![0]).unwrap();
//! tree.set(&address![2, "a"], Variant::from(42)).unwrap();
//!
//! assert_eq!(tree.get(&address![2, "a"]).unwrap(), Variant::from(42));
//! assert_eq!(before, Variant::from(5));
//! ```

use std::sync::Arc;

use crate::address::{AddressPath, Key};
use crate::container::{ContainerKind, ContainerMut, ContainerRef};
use crate::error::{Result, TreeError};
use crate::logging::targets;
use crate::value::{Variant, VariantType};

/// Owner of a root value and a current-address cursor.
#[derive(Debug, Clone, Default)]
pub struct VariantTree {
    root: Variant,
    cursor: AddressPath,
}

fn resolve<'a>(mut current: &'a Variant, keys: &[Key]) -> Option<&'a Variant> {
    for key in keys {
        current = ContainerRef::new(current)?.get(key)?;
    }
    Some(current)
}

fn resolve_mut<'a>(mut current: &'a mut Variant, keys: &[Key]) -> Option<&'a mut Variant> {
    for key in keys {
        current = ContainerMut::new(current)?.into_item_mut(key)?;
    }
    Some(current)
}

impl VariantTree {
    /// An empty tree whose root is [`Variant::Invalid`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree owning `root`.
    pub fn with_root(root: Variant) -> Self {
        Self {
            root,
            cursor: AddressPath::root(),
        }
    }

    /// The root value.
    pub fn root(&self) -> &Variant {
        &self.root
    }

    /// Replace the whole content and move the cursor back to the root.
    pub fn set_root_content(&mut self, root: Variant) {
        tracing::debug!(target: targets::TREE, root_type = %root.type_tag(), "root content replaced");
        self.root = root;
        self.cursor = AddressPath::root();
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.set_root_content(Variant::Invalid);
    }

    /// Whether the root holds a value.
    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    /// Whether `address` resolves.
    pub fn contains(&self, address: &AddressPath) -> bool {
        resolve(&self.root, address.keys()).is_some()
    }

    /// Borrow the value at `address`.
    pub fn get_ref(&self, address: &AddressPath) -> Result<&Variant> {
        resolve(&self.root, address.keys()).ok_or_else(|| TreeError::address_not_found(address))
    }

    /// A snapshot of the value at `address`.
    ///
    /// # Errors
    ///
    /// [`TreeError::AddressNotFound`] if any key along the path is absent or
    /// passes through an atomic value.
    pub fn get(&self, address: &AddressPath) -> Result<Variant> {
        self.get_ref(address).cloned()
    }

    /// Replace the value at `address`.
    ///
    /// The terminal key may be new: maps gain an entry, lists accept the
    /// index one past their end. Every other step must already exist.
    pub fn set(&mut self, address: &AddressPath, value: Variant) -> Result<()> {
        let Some((parent, key)) = address.split_last() else {
            self.root = value;
            return Ok(());
        };
        let container = self.container_at(&parent).map_err(|_| TreeError::address_not_found(address))?;
        let writable = match container {
            ContainerRef::List(items) => key
                .as_index()
                .and_then(|i| usize::try_from(i).ok())
                .is_some_and(|i| i <= items.len()),
            _ => key.as_name().is_some(),
        };
        if !writable {
            return Err(TreeError::address_not_found(address));
        }

        tracing::trace!(target: targets::TREE, %address, "set value");
        let key = key.clone();
        let written = self.container_mut(&parent)?.set_item(&key, value);
        debug_assert!(written, "validated write at {address} was rejected");
        Ok(())
    }

    /// Remove the value at `address` and return it.
    ///
    /// Later list elements shift down by one. Deleting the root clears the
    /// tree.
    pub fn delete(&mut self, address: &AddressPath) -> Result<Variant> {
        let Some((parent, key)) = address.split_last() else {
            return Ok(std::mem::take(&mut self.root));
        };
        if !self.contains(address) {
            return Err(TreeError::address_not_found(address));
        }

        tracing::trace!(target: targets::TREE, %address, "delete value");
        let key = key.clone();
        self.container_mut(&parent)?
            .remove_item(&key)
            .ok_or_else(|| TreeError::address_not_found(address))
    }

    fn container_at(&self, address: &AddressPath) -> Result<ContainerRef<'_>> {
        let value = self.get_ref(address)?;
        ContainerRef::new(value).ok_or_else(|| TreeError::not_a_container(address, value.type_tag()))
    }

    fn container_mut(&mut self, address: &AddressPath) -> Result<ContainerMut<'_>> {
        let value = resolve_mut(&mut self.root, address.keys())
            .ok_or_else(|| TreeError::address_not_found(address))?;
        let found = value.type_tag();
        ContainerMut::new(value).ok_or_else(|| TreeError::not_a_container(address, found))
    }

    fn list_mut(&mut self, address: &AddressPath) -> Result<&mut Vec<Variant>> {
        match self.container_mut(address)? {
            ContainerMut::List(items) => Ok(Arc::make_mut(items)),
            ContainerMut::OrderedMap(_) => Err(TreeError::not_a_container(address, VariantType::OrderedMap)),
            ContainerMut::UnorderedMap(_) => Err(TreeError::not_a_container(address, VariantType::UnorderedMap)),
        }
    }

    fn list_at(&self, address: &AddressPath) -> Result<&[Variant]> {
        match self.container_at(address)? {
            ContainerRef::List(items) => Ok(items),
            other => Err(TreeError::not_a_container(address, other.kind().variant_type())),
        }
    }

    fn map_at(&self, address: &AddressPath) -> Result<ContainerRef<'_>> {
        let container = self.container_at(address)?;
        if container.kind() == ContainerKind::List {
            return Err(TreeError::not_a_container(address, VariantType::List));
        }
        Ok(container)
    }

    // ---- lists ----

    /// Number of elements in the list at `address`.
    pub fn list_len(&self, address: &AddressPath) -> Result<usize> {
        Ok(self.list_at(address)?.len())
    }

    /// Insert into the list at `address`.
    ///
    /// A negative index, or one past the end, appends. Returns the index the
    /// value landed at.
    pub fn list_insert(&mut self, address: &AddressPath, index: i64, value: Variant) -> Result<usize> {
        let len = self.list_len(address)?;
        let position = usize::try_from(index).ok().filter(|&i| i <= len).unwrap_or(len);
        self.list_mut(address)?.insert(position, value);
        tracing::trace!(target: targets::TREE, %address, position, "list insert");
        Ok(position)
    }

    /// Append to the list at `address`, returning the new element's index.
    pub fn list_append(&mut self, address: &AddressPath, value: Variant) -> Result<usize> {
        self.list_insert(address, -1, value)
    }

    /// Remove an element from the list at `address`.
    ///
    /// A negative index removes the last element.
    pub fn list_remove_at(&mut self, address: &AddressPath, index: i64) -> Result<Variant> {
        let len = self.list_len(address)?;
        let position = self.list_position(address, index, len)?;
        Ok(self.list_mut(address)?.remove(position))
    }

    /// Move a list element from `from` to `to`.
    ///
    /// A negative or out-of-range `to` moves the element to the end. Returns
    /// the final index.
    pub fn list_move(&mut self, address: &AddressPath, from: i64, to: i64) -> Result<usize> {
        let len = self.list_len(address)?;
        let from = self.list_position(address, from, len)?;
        let to = usize::try_from(to).ok().filter(|&i| i < len).unwrap_or(len - 1);
        if from != to {
            let items = self.list_mut(address)?;
            let value = items.remove(from);
            items.insert(to, value);
        }
        Ok(to)
    }

    fn list_position(&self, address: &AddressPath, index: i64, len: usize) -> Result<usize> {
        let position = if index < 0 {
            len.checked_sub(1)
        } else {
            usize::try_from(index).ok().filter(|&i| i < len)
        };
        position.ok_or_else(|| TreeError::address_not_found(address.child(index)))
    }

    // ---- maps ----

    /// Keys of the map at `address`, in enumeration order.
    pub fn map_keys(&self, address: &AddressPath) -> Result<Vec<String>> {
        Ok(self
            .map_at(address)?
            .keys()
            .into_iter()
            .filter_map(|key| key.as_name().map(str::to_string))
            .collect())
    }

    /// Value at `key` in the map at `address`, or `default` if absent.
    pub fn map_get(&self, address: &AddressPath, key: &str, default: Variant) -> Result<Variant> {
        let map = self.map_at(address)?;
        Ok(map.get(&Key::from(key)).cloned().unwrap_or(default))
    }

    /// Insert or replace `key` in the map at `address`.
    pub fn map_set(&mut self, address: &AddressPath, key: &str, value: Variant) -> Result<()> {
        self.map_at(address)?;
        self.container_mut(address)?.set_item(&Key::from(key), value);
        Ok(())
    }

    /// Remove `key` from the map at `address`.
    pub fn map_remove(&mut self, address: &AddressPath, key: &str) -> Result<Variant> {
        let key = Key::from(key);
        if !self.map_at(address)?.contains(&key) {
            return Err(TreeError::key_not_found(key));
        }
        self.container_mut(address)?
            .remove_item(&key)
            .ok_or_else(|| TreeError::key_not_found(key))
    }

    /// Rename `old` to `new` in the map at `address`.
    ///
    /// An entry already stored under `new` is overwritten without notice.
    pub fn map_rename_key(&mut self, address: &AddressPath, old: &str, new: &str) -> Result<()> {
        let map = self.map_at(address)?;
        if !map.contains(&Key::from(old)) {
            return Err(TreeError::key_not_found(old));
        }
        if old != new && map.contains(&Key::from(new)) {
            tracing::debug!(target: targets::TREE, %address, old, new, "rename overwrites existing key");
        }
        self.container_mut(address)?.rename_key(old, new);
        Ok(())
    }

    /// Insert `value` under a fresh key `"<base><n>"` and return the key.
    ///
    /// `base` defaults to `"key"`; `n` is the smallest positive integer not
    /// yet used.
    pub fn map_insert_new_key(
        &mut self,
        address: &AddressPath,
        base: Option<&str>,
        value: Variant,
    ) -> Result<String> {
        let map = self.map_at(address)?;
        let base = base.unwrap_or("key");
        let name = (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !map.contains(&Key::from(candidate.as_str())))
            .unwrap_or_else(|| base.to_string());
        self.container_mut(address)?.set_item(&Key::from(name.as_str()), value);
        Ok(name)
    }

    // ---- cursor ----

    /// The current address.
    pub fn cursor(&self) -> &AddressPath {
        &self.cursor
    }

    /// Whether the cursor is at the root.
    pub fn node_is_root(&self) -> bool {
        self.cursor.is_root()
    }

    /// Move the cursor to an absolute address, which must resolve.
    pub fn move_to(&mut self, address: &AddressPath) -> Result<()> {
        self.get_ref(address)?;
        self.cursor = address.clone();
        Ok(())
    }

    /// Move the cursor to the child at `key`.
    pub fn move_to_node(&mut self, key: impl Into<Key>) -> Result<()> {
        let child = self.cursor.child(key);
        self.move_to(&child)
    }

    /// Move the cursor up one level. Returns `false` at the root.
    pub fn move_to_parent(&mut self) -> bool {
        self.cursor.pop().is_some()
    }

    /// Move the cursor to the root.
    pub fn move_to_root(&mut self) {
        self.cursor = AddressPath::root();
    }

    /// Value under the cursor.
    pub fn node_value(&self) -> Result<Variant> {
        self.get(&self.cursor)
    }

    /// Type of the value under the cursor.
    pub fn node_type(&self) -> Result<VariantType> {
        Ok(self.get_ref(&self.cursor)?.type_tag())
    }

    /// Replace the value under the cursor.
    pub fn set_node_value(&mut self, value: Variant) -> Result<()> {
        let cursor = self.cursor.clone();
        self.set(&cursor, value)
    }
}
