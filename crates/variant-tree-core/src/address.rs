//! Keys and address paths.
//!
//! An [`AddressPath`] is an ordered sequence of [`Key`]s locating a value
//! relative to the tree root. List elements are reached through
//! [`Key::Index`], map entries through [`Key::Name`].
//!
//! ```
//! use variant_tree_core::{address, AddressPath, Key};
//!
//! let mut path = address![2, "a"];
//! assert_eq!(path.len(), 2);
//! assert_eq!(path.last(), Some(&Key::from("a")));
//!
//! path.pop();
//! assert_eq!(path, AddressPath::from_keys([Key::Index(2)]));
//! ```

use std::fmt;

use crate::value::Variant;

/// One step of an address: a list index or a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Position in a list.
    Index(i64),
    /// Key in a map.
    Name(String),
}

impl Key {
    /// The index, if this is a list key.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    /// The name, if this is a map key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(name) => Some(name),
        }
    }

    /// The key as a value, used when ordering siblings.
    pub fn to_variant(&self) -> Variant {
        match self {
            Key::Index(i) => Variant::Int(*i),
            Key::Name(name) => Variant::String(name.clone()),
        }
    }

    /// Text shown in the key column: names quoted, indices verbatim.
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index as i64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// An ordered sequence of keys identifying a node relative to the root.
///
/// The empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddressPath {
    keys: Vec<Key>,
}

impl AddressPath {
    /// The address of the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build an address from a sequence of keys.
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// The keys of this address, root first.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of steps from the root.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether this address is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether this address points at the root.
    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append a step.
    pub fn push(&mut self, key: impl Into<Key>) {
        self.keys.push(key.into());
    }

    /// Remove and return the last step.
    pub fn pop(&mut self) -> Option<Key> {
        self.keys.pop()
    }

    /// The last step, if any.
    pub fn last(&self) -> Option<&Key> {
        self.keys.last()
    }

    /// The address of the containing node, or `None` for the root.
    pub fn parent(&self) -> Option<AddressPath> {
        let (_, rest) = self.keys.split_last()?;
        Some(Self {
            keys: rest.to_vec(),
        })
    }

    /// A new address one step below this one.
    pub fn child(&self, key: impl Into<Key>) -> AddressPath {
        let mut child = self.clone();
        child.push(key);
        child
    }

    /// Split into parent address and last key.
    pub fn split_last(&self) -> Option<(AddressPath, &Key)> {
        let (last, rest) = self.keys.split_last()?;
        Some((
            Self {
                keys: rest.to_vec(),
            },
            last,
        ))
    }

    /// Whether `prefix` is a (non-strict) prefix of this address.
    pub fn starts_with(&self, prefix: &AddressPath) -> bool {
        self.keys.starts_with(&prefix.keys)
    }

    /// Iterate over the keys, root first.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

impl fmt::Display for AddressPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", key)?;
        }
        f.write_str("]")
    }
}

impl From<Vec<Key>> for AddressPath {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

impl From<&AddressPath> for AddressPath {
    fn from(address: &AddressPath) -> Self {
        address.clone()
    }
}

impl FromIterator<Key> for AddressPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

impl<'a> IntoIterator for &'a AddressPath {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Build an [`AddressPath`] from a list of keys.
///
/// Integers become [`Key::Index`], strings become [`Key::Name`].
#[macro_export]
macro_rules! address {
    () => {
        $crate::AddressPath::root()
    };
    ($($key:expr),+ $(,)?) => {
        $crate::AddressPath::from_keys([$($crate::Key::from($key)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut path = AddressPath::root();
        assert!(path.is_root());
        path.push(1);
        path.push("x");
        assert_eq!(path.len(), 2);
        assert_eq!(path.pop(), Some(Key::Name("x".into())));
        assert_eq!(path, address![1]);
    }

    #[test]
    fn test_parent_and_child() {
        let path = address![2, "a"];
        assert_eq!(path.parent(), Some(address![2]));
        assert_eq!(AddressPath::root().parent(), None);
        assert_eq!(address![2].child("a"), path);
        assert!(path.starts_with(&address![2]));
        assert!(!address![2].starts_with(&path));
    }

    #[test]
    fn test_display() {
        assert_eq!(address![0, "k", 3].to_string(), "[0, \"k\", 3]");
        assert_eq!(AddressPath::root().to_string(), "[]");
        assert_eq!(Key::from("a").display_text(), "\"a\"");
        assert_eq!(Key::from(7).display_text(), "7");
    }
}
