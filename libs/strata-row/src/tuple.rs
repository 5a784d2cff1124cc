use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError};

use crate::codec::{TupleCodec, TypeCodec};
use crate::codec::wire::write_component;
use crate::gettable::{ColumnIndex, GettableData};
use crate::host::{HostType, Synthesized};
use crate::registry::CodecRegistry;
use crate::value::Value;

/// Value of a `tuple<...>` type: positional components, each kept in its
/// serialized form until read.
///
/// Components have no names: by-name access fails with `NameNotFound`.
#[derive(Clone)]
pub struct TupleValue {
    data_type: DataType,
    values: Vec<Option<Bytes>>,
    registry: CodecRegistry,
    version: ProtocolVersion,
}

impl TupleValue {
    /// A tuple of the given component types with every component null.
    pub fn new(component_types: Vec<DataType>, registry: CodecRegistry) -> Self {
        let values = vec![None; component_types.len()];
        Self {
            data_type: DataType::Tuple(component_types),
            values,
            registry,
            version: ProtocolVersion::default(),
        }
    }

    /// `data_type` is a tuple type and `values` has one slot per component.
    pub(crate) fn from_parts(
        data_type: DataType,
        values: Vec<Option<Bytes>>,
        registry: CodecRegistry,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            data_type,
            values,
            registry,
            version,
        }
    }

    /// Protocol version used to encode and decode nested collections.
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn component_types(&self) -> &[DataType] {
        match &self.data_type {
            DataType::Tuple(components) => components,
            _ => &[],
        }
    }

    /// Encode `value` into component `index` with the registry's codec for
    /// that component's type. `None` sets the component to null.
    pub fn set<T: HostType>(&mut self, index: usize, value: Option<&T>) -> Result<&mut Self, RowError> {
        let i = index.position(&*self)?;
        let codec = self.registry.resolve::<T>(&self.component_types()[i])?;
        self.values[i] = value.map(|v| codec.encode(v, self.version)).transpose()?.map(Bytes::from);
        Ok(self)
    }

    pub fn set_null(&mut self, index: usize) -> Result<&mut Self, RowError> {
        let i = index.position(&*self)?;
        self.values[i] = None;
        Ok(self)
    }

    /// Serialized form: each component prefixed by its 32-bit length, -1
    /// for null.
    pub fn encode(&self) -> Result<Vec<u8>, RowError> {
        let mut out = Vec::new();
        for value in &self.values {
            write_component(&mut out, value.as_deref())?;
        }
        Ok(out)
    }
}

impl GettableData for TupleValue {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn index_of(&self, name: &str) -> Result<usize, RowError> {
        Err(RowError::NameNotFound(name.to_owned()))
    }

    fn data_type_at(&self, index: usize) -> &DataType {
        &self.component_types()[index]
    }

    fn raw_at(&self, index: usize) -> Option<&Bytes> {
        self.values[index].as_ref()
    }

    fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }
}

impl HostType for TupleValue {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let DataType::Tuple(_) = data_type else { return None };
        let codec: Arc<dyn TypeCodec<Self>> = Arc::new(TupleCodec::new(data_type.clone(), registry.downgrade()));
        Some(Ok(codec))
    }
}

/// Same component types and same serialized components.
impl PartialEq for TupleValue {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type && self.values == other.values
    }
}

impl fmt::Debug for TupleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleValue")
            .field("data_type", &self.data_type.to_string())
            .field("values", &self.values)
            .finish()
    }
}

impl fmt::Display for TupleValue {
    /// `(1, 'a', NULL)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for i in 0..self.len() {
            if i > 0 {
                f.write_str(", ")?;
            }
            crate::value::fmt_slot(self, i, f)?;
        }
        f.write_str(")")
    }
}

impl From<TupleValue> for Value {
    fn from(value: TupleValue) -> Self {
        Value::Tuple(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_read_back() {
        let mut tuple = TupleValue::new(vec![DataType::Int, DataType::Text], CodecRegistry::new());
        tuple.set(0, Some(&7i32)).unwrap().set(1, Some(&"x".to_string())).unwrap();
        assert_eq!(tuple.get_int(0).unwrap(), 7);
        assert_eq!(tuple.get_string(1).unwrap().as_deref(), Some("x"));
        assert_eq!(tuple.encode().unwrap(), vec![0, 0, 0, 4, 0, 0, 0, 7, 0, 0, 0, 1, b'x']);
    }

    #[test]
    fn no_names() {
        let tuple = TupleValue::new(vec![DataType::Int], CodecRegistry::new());
        assert_eq!(tuple.get_int("a").unwrap_err(), RowError::NameNotFound("a".into()));
    }

    #[test]
    fn wrong_host_type_on_set() {
        let mut tuple = TupleValue::new(vec![DataType::Int], CodecRegistry::new());
        let err = tuple.set(0, Some(&"7".to_string())).unwrap_err();
        assert_eq!(err.kind(), strata_api::ErrorKind::InvalidType);
    }
}
