//! The item model over a variant tree.
//!
//! [`VariantModel`] keeps a tree of materialized nodes in step with a
//! [`VariantTree`](variant_tree_core::VariantTree) and exposes it to views
//! through the [`ItemModel`] trait. Rows are three columns (key, value,
//! type). Children are materialized on demand; large containers are built
//! on the worker pool and appear with a trailing "loading…" row until
//! they are complete.
//!
//! Every edit goes through the model, which applies it to the tree first
//! and then announces it with [`ModelEvent`]s on [`ModelSignals::changed`].

mod debug;
mod edit;
mod filter;
mod index;
mod loader;
mod node;
mod row;
mod traits;
mod variant_model;

pub use filter::{Filter, FilterColumns, FilterMode};
pub use index::ModelIndex;
pub use node::{LoadState, NodeId};
pub use row::{LOADING_TEXT, RowCache, RowContext};
pub use traits::{ItemFlags, ItemModel, ModelEvent, ModelSignals};
pub use variant_model::VariantModel;
