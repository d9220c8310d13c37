//! Uniform access to container values.
//!
//! The set of container kinds is closed, so the adapter is a pair of
//! borrowed views over the three payloads: [`ContainerRef`] for reading and
//! [`ContainerMut`] for copy-on-write updates. Code above this module asks
//! for keys and items without caring which kind of container it holds.
//!
//! Key enumeration order:
//!
//! - lists: `0..len`
//! - ordered maps: insertion order
//! - unordered maps: keys sorted lexicographically, so enumeration is
//!   deterministic for a given set of keys

use std::sync::Arc;

use crate::address::Key;
use crate::value::{OrderedMap, UnorderedMap, Variant, VariantType};

/// The kind of a container value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    OrderedMap,
    UnorderedMap,
}

impl ContainerKind {
    /// The container kind of a value, or `None` if it is atomic.
    pub fn of(value: &Variant) -> Option<Self> {
        match value {
            Variant::List(_) => Some(ContainerKind::List),
            Variant::OrderedMap(_) => Some(ContainerKind::OrderedMap),
            Variant::UnorderedMap(_) => Some(ContainerKind::UnorderedMap),
            _ => None,
        }
    }

    /// Whether the keys of this container can be edited.
    ///
    /// Map keys are renamed; list keys are reordered.
    pub fn editable_keys(self) -> bool {
        true
    }

    /// Whether the children of this container can be written.
    pub fn editable_values(self) -> bool {
        true
    }

    /// Whether children are addressed by name.
    pub fn is_map(self) -> bool {
        !matches!(self, ContainerKind::List)
    }

    pub fn variant_type(self) -> VariantType {
        match self {
            ContainerKind::List => VariantType::List,
            ContainerKind::OrderedMap => VariantType::OrderedMap,
            ContainerKind::UnorderedMap => VariantType::UnorderedMap,
        }
    }
}

fn list_index(key: &Key) -> Option<usize> {
    key.as_index().and_then(|i| usize::try_from(i).ok())
}

/// Read access to a container's children.
#[derive(Debug, Clone, Copy)]
pub enum ContainerRef<'a> {
    List(&'a [Variant]),
    OrderedMap(&'a OrderedMap),
    UnorderedMap(&'a UnorderedMap),
}

impl<'a> ContainerRef<'a> {
    /// View a value as a container, or `None` if it is atomic.
    pub fn new(value: &'a Variant) -> Option<Self> {
        match value {
            Variant::List(items) => Some(ContainerRef::List(items)),
            Variant::OrderedMap(map) => Some(ContainerRef::OrderedMap(map)),
            Variant::UnorderedMap(map) => Some(ContainerRef::UnorderedMap(map)),
            _ => None,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerRef::List(_) => ContainerKind::List,
            ContainerRef::OrderedMap(_) => ContainerKind::OrderedMap,
            ContainerRef::UnorderedMap(_) => ContainerKind::UnorderedMap,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContainerRef::List(items) => items.len(),
            ContainerRef::OrderedMap(map) => map.len(),
            ContainerRef::UnorderedMap(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys, in enumeration order.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            ContainerRef::List(items) => (0..items.len()).map(Key::from).collect(),
            ContainerRef::OrderedMap(map) => map.keys().map(|k| Key::Name(k.clone())).collect(),
            ContainerRef::UnorderedMap(map) => {
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                names.into_iter().map(|k| Key::Name(k.clone())).collect()
            }
        }
    }

    /// The child at `key`, if present.
    pub fn get(&self, key: &Key) -> Option<&'a Variant> {
        match self {
            ContainerRef::List(items) => items.get(list_index(key)?),
            ContainerRef::OrderedMap(map) => map.get(key.as_name()?),
            ContainerRef::UnorderedMap(map) => map.get(key.as_name()?),
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Whether `key` has the right shape for this container.
    pub fn accepts(&self, key: &Key) -> bool {
        match self {
            ContainerRef::List(_) => key.as_index().is_some(),
            _ => key.as_name().is_some(),
        }
    }

    /// Keys paired with their children, in enumeration order.
    pub fn entries(&self) -> Vec<(Key, &'a Variant)> {
        let this = *self;
        self.keys()
            .into_iter()
            .filter_map(|key| this.get(&key).map(|value| (key, value)))
            .collect()
    }
}

/// Copy-on-write access to a container's children.
///
/// The payload is cloned on the first write if any other value still shares
/// it.
#[derive(Debug)]
pub enum ContainerMut<'a> {
    List(&'a mut Arc<Vec<Variant>>),
    OrderedMap(&'a mut Arc<OrderedMap>),
    UnorderedMap(&'a mut Arc<UnorderedMap>),
}

impl<'a> ContainerMut<'a> {
    /// View a value as a mutable container, or `None` if it is atomic.
    pub fn new(value: &'a mut Variant) -> Option<Self> {
        match value {
            Variant::List(items) => Some(ContainerMut::List(items)),
            Variant::OrderedMap(map) => Some(ContainerMut::OrderedMap(map)),
            Variant::UnorderedMap(map) => Some(ContainerMut::UnorderedMap(map)),
            _ => None,
        }
    }

    /// Mutable access to the child at `key`.
    pub fn into_item_mut(self, key: &Key) -> Option<&'a mut Variant> {
        match self {
            ContainerMut::List(items) => Arc::make_mut(items).get_mut(list_index(key)?),
            ContainerMut::OrderedMap(map) => Arc::make_mut(map).get_mut(key.as_name()?),
            ContainerMut::UnorderedMap(map) => Arc::make_mut(map).get_mut(key.as_name()?),
        }
    }

    /// Write the child at `key`.
    ///
    /// Maps insert or replace. Lists replace an existing index or append when
    /// `key` equals the length. Returns `false` if the key cannot be written.
    pub fn set_item(&mut self, key: &Key, value: Variant) -> bool {
        match self {
            ContainerMut::List(items) => {
                let Some(index) = list_index(key) else {
                    return false;
                };
                if index > items.len() {
                    return false;
                }
                let items = Arc::make_mut(items);
                if index == items.len() {
                    items.push(value);
                } else {
                    items[index] = value;
                }
                true
            }
            ContainerMut::OrderedMap(map) => match key.as_name() {
                Some(name) => {
                    Arc::make_mut(map).insert(name.to_string(), value);
                    true
                }
                None => false,
            },
            ContainerMut::UnorderedMap(map) => match key.as_name() {
                Some(name) => {
                    Arc::make_mut(map).insert(name.to_string(), value);
                    true
                }
                None => false,
            },
        }
    }

    /// Remove the child at `key`, shifting later list elements down.
    pub fn remove_item(&mut self, key: &Key) -> Option<Variant> {
        match self {
            ContainerMut::List(items) => {
                let index = list_index(key)?;
                if index >= items.len() {
                    return None;
                }
                Some(Arc::make_mut(items).remove(index))
            }
            ContainerMut::OrderedMap(map) => {
                let name = key.as_name()?;
                if !map.contains_key(name) {
                    return None;
                }
                Arc::make_mut(map).shift_remove(name)
            }
            ContainerMut::UnorderedMap(map) => {
                let name = key.as_name()?;
                if !map.contains_key(name) {
                    return None;
                }
                Arc::make_mut(map).remove(name)
            }
        }
    }

    /// Move the entry at `old` to `new`, overwriting any entry already at `new`.
    ///
    /// Ordered maps keep the entry at the position `old` had. Returns `false`
    /// for lists or if `old` is absent.
    pub fn rename_key(&mut self, old: &str, new: &str) -> bool {
        match self {
            ContainerMut::List(_) => false,
            ContainerMut::OrderedMap(map) => {
                let Some(mut index) = map.get_index_of(old) else {
                    return false;
                };
                if old == new {
                    return true;
                }
                let map = Arc::make_mut(map);
                let Some((_, value)) = map.shift_remove_index(index) else {
                    return false;
                };
                if let Some(existing) = map.get_index_of(new) {
                    map.shift_remove_index(existing);
                    if existing < index {
                        index -= 1;
                    }
                }
                map.shift_insert(index, new.to_string(), value);
                true
            }
            ContainerMut::UnorderedMap(map) => {
                if !map.contains_key(old) {
                    return false;
                }
                if old == new {
                    return true;
                }
                let map = Arc::make_mut(map);
                match map.remove(old) {
                    Some(value) => {
                        map.insert(new.to_string(), value);
                        true
                    }
                    None => false,
                }
            }
        }
    }
}
