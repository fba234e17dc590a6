//! Shared data model for connkit connectors.
//!
//! These types describe what a connector exposes (collections and their
//! schemas), what flows through it (records) and what a write reports back.

pub mod collection;
pub mod operation;
pub mod schema;

pub use collection::{Catalog, Collection, SchemaRole};
pub use operation::{LoadResult, Operation, ParseOperationError};
pub use schema::{FieldType, Schema};

/// One row or entity, keyed by field name in source order.
pub type Record = serde_json::Map<String, serde_json::Value>;
