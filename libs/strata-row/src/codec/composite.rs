//! Codecs for `tuple<...>` and user-defined types.
//!
//! Both produce settable containers that keep their components as raw
//! bytes and decode them lazily through the registry that built the codec.

use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError, UserType};

use super::TypeCodec;
use super::wire::Reader;
use crate::registry::WeakRegistry;
use crate::tuple::TupleValue;
use crate::udt::UdtValue;

/// Split a tuple or UDT payload into `arity` raw components.
///
/// Components missing from the end of the buffer are null; bytes past the
/// last expected component are ignored.
fn split_components(bytes: &Bytes, arity: usize) -> Result<Vec<Option<Bytes>>, RowError> {
    let mut reader = Reader::new(bytes);
    let mut values = Vec::with_capacity(arity);
    for _ in 0..arity {
        if reader.is_empty() {
            values.push(None);
        } else {
            values.push(reader.read_component()?);
        }
    }
    Ok(values)
}

pub struct TupleCodec {
    data_type: DataType,
    registry: WeakRegistry,
}

impl TupleCodec {
    /// `data_type` must be a tuple type.
    pub(crate) fn new(data_type: DataType, registry: WeakRegistry) -> Self {
        Self { data_type, registry }
    }

    fn arity(&self) -> usize {
        match &self.data_type {
            DataType::Tuple(components) => components.len(),
            _ => 0,
        }
    }
}

impl TypeCodec<TupleValue> for TupleCodec {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn encode(&self, value: &TupleValue, _version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        if value.data_type() != &self.data_type {
            return Err(RowError::invalid_type(format!(
                "cannot encode {} value as {}",
                value.data_type(),
                self.data_type
            )));
        }
        value.encode()
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<TupleValue>, RowError> {
        let Some(bytes) = bytes else { return Ok(None) };
        let registry = self.registry.upgrade()?;
        let values = split_components(bytes, self.arity()).map_err(|e| e.with_context(format!("decoding {}", self.data_type)))?;
        Ok(Some(TupleValue::from_parts(self.data_type.clone(), values, registry, version)))
    }
}

pub struct UdtCodec {
    data_type: DataType,
    user_type: Arc<UserType>,
    registry: WeakRegistry,
}

impl UdtCodec {
    pub(crate) fn new(user_type: Arc<UserType>, registry: WeakRegistry) -> Self {
        Self {
            data_type: DataType::Udt(user_type.clone()),
            user_type,
            registry,
        }
    }
}

impl TypeCodec<UdtValue> for UdtCodec {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn encode(&self, value: &UdtValue, _version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        if value.user_type() != self.user_type.as_ref() {
            return Err(RowError::invalid_type(format!(
                "cannot encode {}.{} value as {}",
                value.user_type().keyspace,
                value.user_type().name,
                self.data_type
            )));
        }
        value.encode()
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<UdtValue>, RowError> {
        let Some(bytes) = bytes else { return Ok(None) };
        let registry = self.registry.upgrade()?;
        let values = split_components(bytes, self.user_type.len())
            .map_err(|e| e.with_context(format!("decoding {}", self.data_type)))?;
        Ok(Some(UdtValue::from_parts(self.user_type.clone(), values, registry, version)))
    }
}
