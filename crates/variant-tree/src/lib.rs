//! Lazy, filterable item model over nested variant trees.
//!
//! This is the main crate. It re-exports the data layer from
//! [`variant_tree_core`] and adds:
//!
//! - [`VariantModel`], the model views talk to
//! - [`ModelConfig`], its settings, optionally read from a TOML file
//! - [`Filter`], the row filter
//!
//! # Example
//!
//! ```
//! use variant_tree::{address, Column, FilterColumns, FilterMode, Variant, VariantModel};
//!
//! let mut model = VariantModel::with_root(Variant::ordered_map([
//!     ("id", Variant::from(7)),
//!     ("name", Variant::from("node")),
//! ]))
//! .unwrap();
//!
//! model.set_filter("id", FilterMode::Contains, FilterColumns::KEY).unwrap();
//! assert!(model.is_visible(&address!["id"]));
//! assert!(!model.is_visible(&address!["name"]));
//!
//! model.commit_edit(&address!["id"], Column::Value, Variant::from(8)).unwrap();
//! assert_eq!(model.get(&address!["id"]).unwrap(), Variant::from(8));
//! ```

pub mod config;
pub mod model;

pub use config::{ConfigError, FilterConfig, ModelConfig};
pub use model::{
    Filter, FilterColumns, FilterMode, ItemFlags, ItemModel, LOADING_TEXT, LoadState, ModelEvent, ModelIndex,
    ModelSignals, NodeId, RowCache, RowContext, VariantModel,
};

pub use variant_tree_core::{
    AddressPath, CodecError, Column, ContainerKind, ContainerRef, Key, OrderedMap, Signal, TreeError,
    TreeFormatOptions, TreeStyle, UnorderedMap, Variant, VariantTree, VariantType, address, convert, read_file,
    write_file,
};
