//! Error types for the variant tree data layer.
//!
//! Tree operations report [`TreeError`], the persistence primitive reports
//! [`CodecError`] and the loader pool reports [`ThreadPoolError`]. None of
//! them is fatal to the host; a failed operation leaves the tree untouched.

use std::path::PathBuf;

use crate::address::{AddressPath, Key};
use crate::column::Column;
use crate::value::VariantType;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised by [`VariantTree`](crate::VariantTree) and the model built on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// A path step is missing or passes through an atomic value.
    #[error("address {address} does not resolve")]
    AddressNotFound { address: AddressPath },

    /// Rename or removal of a map key that does not exist.
    #[error("key {key} not found")]
    KeyNotFound { key: Key },

    /// The value cannot be converted to the requested type.
    #[error("cannot convert {from} to {to}")]
    TypeConversionUnsupported { from: VariantType, to: VariantType },

    /// A list or map operation was applied to a value of another kind.
    #[error("value at {address} is a {found}, not the expected container")]
    NotAContainer {
        address: AddressPath,
        found: VariantType,
    },

    /// The key has the wrong shape for its container.
    #[error("key {key} cannot address the container at {address}")]
    InvalidKey { address: AddressPath, key: Key },

    /// A type-column commit named no known type.
    #[error("unknown type name '{0}'")]
    UnknownType(String),

    /// The addressed cell does not accept edits.
    #[error("{column} cell at {address} is not editable")]
    NotEditable { address: AddressPath, column: Column },

    /// A filter pattern failed to compile.
    #[error("invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl TreeError {
    /// Create an address-not-found error.
    pub fn address_not_found(address: impl Into<AddressPath>) -> Self {
        Self::AddressNotFound {
            address: address.into(),
        }
    }

    /// Create a key-not-found error.
    pub fn key_not_found(key: impl Into<Key>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a conversion error.
    pub fn conversion(from: VariantType, to: VariantType) -> Self {
        Self::TypeConversionUnsupported { from, to }
    }

    /// Create a container-kind mismatch error.
    pub fn not_a_container(address: impl Into<AddressPath>, found: VariantType) -> Self {
        Self::NotAContainer {
            address: address.into(),
            found,
        }
    }

    /// Create an invalid-key error.
    pub fn invalid_key(address: impl Into<AddressPath>, key: impl Into<Key>) -> Self {
        Self::InvalidKey {
            address: address.into(),
            key: key.into(),
        }
    }
}

/// Errors raised while encoding or decoding a value stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream holds bytes that do not decode to a value.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// The stream ended in the middle of a value.
    #[error("stream truncated in the middle of a value")]
    TruncatedStream,

    /// The underlying file or stream failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors related to the loader thread pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadPoolError {
    /// Failed to create the thread pool.
    #[error("failed to create thread pool: {0}")]
    CreationFailed(String),

    /// The global pool was initialized twice.
    #[error("global thread pool already initialized")]
    AlreadyInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreeError::address_not_found(AddressPath::from_keys([Key::from(2), Key::from("a")]));
        assert_eq!(err.to_string(), "address [2, \"a\"] does not resolve");

        let err = TreeError::key_not_found("missing");
        assert_eq!(err.to_string(), "key \"missing\" not found");

        let err = TreeError::conversion(VariantType::String, VariantType::Int);
        assert_eq!(err.to_string(), "cannot convert String to Integer");
    }

    #[test]
    fn test_codec_error_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CodecError::io("data.bin", io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("data.bin"));
    }
}
