//! Core data layer for variant trees.
//!
//! This crate holds everything that does not depend on a view:
//!
//! - **Values**: [`Variant`], a dynamically-typed datum that is atomic or a
//!   container (list, ordered map, unordered map)
//! - **Containers**: [`ContainerRef`] and [`ContainerMut`], uniform
//!   copy-on-write access to children
//! - **Addresses**: [`AddressPath`] and [`Key`], paths from the root
//! - **Tree**: [`VariantTree`], get/set/delete at an address plus list and map
//!   operations and a navigation cursor
//! - **Ordering**: a total order over heterogeneous values for key sorting
//! - **Conversion**: type changes between variants
//! - **Persistence**: reading and writing value streams
//! - **Signals** and a worker **thread pool** used by the model crate
//!
//! # Example
//!
//! ```
//! use variant_tree_core::{address, Variant, VariantTree, TreeError};
//!
//! let mut tree = VariantTree::with_root(Variant::ordered_map([
//!     ("a", Variant::from(1)),
//!     ("b", Variant::from(2)),
//! ]));
//!
//! tree.map_rename_key(&address![], "a", "b").unwrap();
//! assert_eq!(tree.get(&address!["b"]).unwrap(), Variant::from(1));
//!
//! let missing = tree.get(&address!["a"]);
//! assert!(matches!(missing, Err(TreeError::AddressNotFound { .. })));
//! ```

pub mod address;
pub mod column;
pub mod container;
pub mod convert;
mod error;
pub mod logging;
pub mod ordering;
pub mod persist;
pub mod signal;
pub mod threadpool;
pub mod tree;
pub mod value;

pub use address::{AddressPath, Key};
pub use column::Column;
pub use container::{ContainerKind, ContainerMut, ContainerRef};
pub use convert::convert;
pub use error::{CodecError, Result, ThreadPoolError, TreeError};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use persist::{read_all, read_file, write_all, write_file};
pub use signal::{ConnectionId, Signal};
pub use threadpool::{TaskHandle, ThreadPool, ThreadPoolConfig};
pub use tree::VariantTree;
pub use value::{OrderedMap, UnorderedMap, Variant, VariantType};
