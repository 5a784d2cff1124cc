use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError, UserType};

use crate::codec::wire::write_component;
use crate::codec::{TypeCodec, UdtCodec};
use crate::gettable::{ColumnIndex, GettableData};
use crate::host::{HostType, Synthesized};
use crate::registry::CodecRegistry;
use crate::value::Value;

/// Value of a user-defined type: one serialized slot per field of its
/// [`UserType`], addressable by position or by field name.
#[derive(Clone)]
pub struct UdtValue {
    user_type: Arc<UserType>,
    values: Vec<Option<Bytes>>,
    registry: CodecRegistry,
    version: ProtocolVersion,
}

impl UdtValue {
    /// A value of `user_type` with every field null.
    pub fn new(user_type: Arc<UserType>, registry: CodecRegistry) -> Self {
        let values = vec![None; user_type.len()];
        Self {
            user_type,
            values,
            registry,
            version: ProtocolVersion::default(),
        }
    }

    pub(crate) fn from_parts(
        user_type: Arc<UserType>,
        values: Vec<Option<Bytes>>,
        registry: CodecRegistry,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            user_type,
            values,
            registry,
            version,
        }
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn user_type(&self) -> &UserType {
        &self.user_type
    }

    pub fn data_type(&self) -> DataType {
        DataType::Udt(self.user_type.clone())
    }

    /// Encode `value` into a field with the registry's codec for the
    /// field's type. `None` sets the field to null.
    pub fn set<T: HostType, I: ColumnIndex>(&mut self, index: I, value: Option<&T>) -> Result<&mut Self, RowError> {
        let i = index.position(&*self)?;
        let codec = self.registry.resolve::<T>(self.data_type_at(i))?;
        let raw = value
            .map(|v| codec.encode(v, self.version))
            .transpose()
            .map_err(|e| e.with_context(format!("field '{}'", self.user_type.fields[i].name)))?;
        self.values[i] = raw.map(Bytes::from);
        Ok(self)
    }

    pub fn set_null<I: ColumnIndex>(&mut self, index: I) -> Result<&mut Self, RowError> {
        let i = index.position(&*self)?;
        self.values[i] = None;
        Ok(self)
    }

    /// Serialized form: each field prefixed by its 32-bit length, -1 for
    /// null.
    pub fn encode(&self) -> Result<Vec<u8>, RowError> {
        let mut out = Vec::new();
        for value in &self.values {
            write_component(&mut out, value.as_deref())?;
        }
        Ok(out)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.user_type.fields.iter().map(|f| f.name.as_str())
    }
}

impl GettableData for UdtValue {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn index_of(&self, name: &str) -> Result<usize, RowError> {
        self.user_type
            .index_of(name)
            .ok_or_else(|| RowError::NameNotFound(name.to_owned()))
    }

    fn data_type_at(&self, index: usize) -> &DataType {
        &self.user_type.fields[index].data_type
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

impl HostType for UdtValue {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let DataType::Udt(user_type) = data_type else { return None };
        let codec: Arc<dyn TypeCodec<Self>> = Arc::new(UdtCodec::new(user_type.clone(), registry.downgrade()));
        Some(Ok(codec))
    }
}

/// Same type definition and same serialized fields.
impl PartialEq for UdtValue {
    fn eq(&self, other: &Self) -> bool {
        self.user_type == other.user_type && self.values == other.values
    }
}

impl fmt::Debug for UdtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdtValue")
            .field("type", &format_args!("{}.{}", self.user_type.keyspace, self.user_type.name))
            .field("values", &self.values)
            .finish()
    }
}

impl fmt::Display for UdtValue {
    /// `{street: '1 Main', zip: 12345}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.user_type.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: ", field.name)?;
            crate::value::fmt_slot(self, i, f)?;
        }
        f.write_str("}")
    }
}

impl From<UdtValue> for Value {
    fn from(value: UdtValue) -> Self {
        Value::Udt(value)
    }
}
