//! Core types shared across the migration pipeline.

pub mod identifier;
pub mod schema;
pub mod value;

pub use schema::{Column, ForeignKey, Index, PrimaryKey, Sequence, Table, Trigger, UniqueKey};
pub use value::SqlValue;
