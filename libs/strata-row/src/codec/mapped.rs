use std::any::type_name;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError};

use super::TypeCodec;

/// Adapts a codec for `T` into a codec for `U`, where `U` is a wider host
/// type that can hold a `T` (typically an enum variant).
pub struct MappedCodec<T, U> {
    inner: Arc<dyn TypeCodec<T>>,
    wrap: fn(T) -> U,
    unwrap: fn(&U) -> Option<&T>,
}

impl<T, U> MappedCodec<T, U> {
    pub fn new(inner: Arc<dyn TypeCodec<T>>, wrap: fn(T) -> U, unwrap: fn(&U) -> Option<&T>) -> Self {
        Self { inner, wrap, unwrap }
    }
}

impl<T, U> TypeCodec<U> for MappedCodec<T, U> {
    fn data_type(&self) -> &DataType {
        self.inner.data_type()
    }

    fn accepts(&self, data_type: &DataType) -> bool {
        self.inner.accepts(data_type)
    }

    fn encode(&self, value: &U, version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        let inner = (self.unwrap)(value).ok_or_else(|| {
            RowError::invalid_type(format!(
                "value does not hold a {} for {}",
                type_name::<T>(),
                self.inner.data_type()
            ))
        })?;
        self.inner.encode(inner, version)
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<U>, RowError> {
        Ok(self.inner.decode(bytes, version)?.map(self.wrap))
    }
}
