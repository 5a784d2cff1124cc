//! Typed access to the columns of a query result row.
//!
//! A [`Row`] keeps its values serialized and decodes them on demand
//! through a [`CodecRegistry`], which maps `(wire type, host type)` pairs
//! to codecs. [`UdtValue`] and [`TupleValue`] expose the same accessors
//! through the shared [`GettableData`] trait.

pub mod codec;
pub mod columns;
pub mod gettable;
pub mod host;
pub mod registry;
pub mod row;
pub mod tuple;
pub mod udt;
pub mod value;

pub use codec::TypeCodec;
pub use columns::{ColumnDefinition, ColumnDefinitions};
pub use gettable::{ColumnIndex, GettableData};
pub use host::HostType;
pub use registry::CodecRegistry;
pub use row::Row;
pub use tuple::TupleValue;
pub use udt::UdtValue;
pub use value::Value;
