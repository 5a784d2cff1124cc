//! Bidirectional converters between wire bytes and host values.

pub mod collection;
pub mod composite;
pub mod mapped;
pub mod primitive;
pub(crate) mod wire;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError};

pub use collection::{CollectionCodec, CollectionLike, MapCodec, MapLike};
pub use composite::{TupleCodec, UdtCodec};
pub use mapped::MappedCodec;
pub use primitive::PrimitiveCodec;

/// Converts between the serialized form of one wire type (or family of
/// wire types) and the host type `T`.
///
/// `decode` receives `None` for a null slot. Codecs must be shareable
/// between threads: a registry hands the same instance to every reader.
pub trait TypeCodec<T>: Send + Sync {
    /// Wire type this codec was built for.
    fn data_type(&self) -> &DataType;

    /// Whether this codec can handle values of `data_type`.
    fn accepts(&self, data_type: &DataType) -> bool {
        self.data_type() == data_type
    }

    fn encode(&self, value: &T, version: ProtocolVersion) -> Result<Vec<u8>, RowError>;

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<T>, RowError>;
}
