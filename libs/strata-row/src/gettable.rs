//! Typed read access shared by rows, UDT values and tuple values.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::net::IpAddr;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use strata_api::{DataType, Duration, LocalDate, ProtocolVersion, RowError, Timestamp};
use uuid::Uuid;

use crate::codec::TypeCodec;
use crate::host::HostType;
use crate::registry::CodecRegistry;
use crate::tuple::TupleValue;
use crate::udt::UdtValue;
use crate::value::Value;

/// Something that designates one slot of a [`GettableData`]: a position
/// or a name.
pub trait ColumnIndex {
    fn position<D: GettableData + ?Sized>(&self, data: &D) -> Result<usize, RowError>;
}

impl ColumnIndex for usize {
    fn position<D: GettableData + ?Sized>(&self, data: &D) -> Result<usize, RowError> {
        if *self < data.len() {
            Ok(*self)
        } else {
            Err(RowError::IndexOutOfRange {
                index: *self,
                len: data.len(),
            })
        }
    }
}

impl ColumnIndex for str {
    fn position<D: GettableData + ?Sized>(&self, data: &D) -> Result<usize, RowError> {
        data.index_of(self)
    }
}

impl ColumnIndex for String {
    fn position<D: GettableData + ?Sized>(&self, data: &D) -> Result<usize, RowError> {
        data.index_of(self)
    }
}

impl<T: ColumnIndex + ?Sized> ColumnIndex for &T {
    fn position<D: GettableData + ?Sized>(&self, data: &D) -> Result<usize, RowError> {
        (**self).position(data)
    }
}

fn decode_slot<D, T>(data: &D, index: usize, codec: &dyn TypeCodec<T>) -> Result<Option<T>, RowError>
where
    D: GettableData + ?Sized,
{
    tracing::trace!(index, data_type = %data.data_type_at(index), "decoding slot");
    codec
        .decode(data.raw_at(index), data.protocol_version())
        .map_err(|e| e.with_context(format!("slot {index}")))
}

/// Indexed, typed access to a fixed sequence of serialized slots.
///
/// Implementors supply the slots, their wire types and the registry;
/// every accessor is provided on top of that. Accessors taking a
/// [`ColumnIndex`] accept a `usize` position or a name. Positions outside
/// `[0, len)` fail with `IndexOutOfRange`, unknown names with
/// `NameNotFound`, and a host type the registry cannot map to the slot's
/// wire type with `InvalidType`. The codec is always resolved before the
/// slot is looked at, so a type mismatch is reported even for null slots.
///
/// Null handling depends on the accessor family:
/// * numeric and boolean accessors return zero / `false`,
/// * collection accessors return an empty collection,
/// * every other accessor returns `None`.
pub trait GettableData {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first slot named `name`.
    fn index_of(&self, name: &str) -> Result<usize, RowError>;

    /// Wire type of slot `index`. `index` has already been validated.
    fn data_type_at(&self, index: usize) -> &DataType;

    /// Serialized bytes of slot `index`, `None` for null.
    fn raw_at(&self, index: usize) -> Option<&Bytes>;

    fn registry(&self) -> &CodecRegistry;

    fn protocol_version(&self) -> ProtocolVersion;

    fn is_null<I: ColumnIndex>(&self, index: I) -> Result<bool, RowError> {
        let i = index.position(self)?;
        Ok(self.raw_at(i).is_none())
    }

    /// Decode slot `index` as `T` through the registry.
    fn get<T: HostType, I: ColumnIndex>(&self, index: I) -> Result<Option<T>, RowError> {
        let i = index.position(self)?;
        let codec = self.registry().resolve::<T>(self.data_type_at(i))?;
        decode_slot(self, i, codec.as_ref())
    }

    /// Decode slot `index` with a caller-supplied codec, bypassing the
    /// registry. The codec must accept the slot's wire type.
    fn get_with<T, I: ColumnIndex>(&self, index: I, codec: &dyn TypeCodec<T>) -> Result<Option<T>, RowError> {
        let i = index.position(self)?;
        let data_type = self.data_type_at(i);
        if !codec.accepts(data_type) {
            return Err(RowError::invalid_type(format!(
                "codec for {} cannot decode {data_type}",
                codec.data_type()
            )));
        }
        decode_slot(self, i, codec)
    }

    /// Decode slot `index` with the default codec for its wire type.
    fn get_object<I: ColumnIndex>(&self, index: I) -> Result<Option<Value>, RowError> {
        self.get::<Value, I>(index)
    }

    /// Serialized bytes of the slot, whatever its wire type.
    fn get_bytes_unsafe<I: ColumnIndex>(&self, index: I) -> Result<Option<Bytes>, RowError> {
        let i = index.position(self)?;
        Ok(self.raw_at(i).cloned())
    }

    fn get_bool<I: ColumnIndex>(&self, index: I) -> Result<bool, RowError> {
        Ok(self.get::<bool, I>(index)?.unwrap_or_default())
    }

    fn get_byte<I: ColumnIndex>(&self, index: I) -> Result<i8, RowError> {
        Ok(self.get::<i8, I>(index)?.unwrap_or_default())
    }

    fn get_short<I: ColumnIndex>(&self, index: I) -> Result<i16, RowError> {
        Ok(self.get::<i16, I>(index)?.unwrap_or_default())
    }

    fn get_int<I: ColumnIndex>(&self, index: I) -> Result<i32, RowError> {
        Ok(self.get::<i32, I>(index)?.unwrap_or_default())
    }

    /// `bigint`, `counter`, or a custom type with a registered `i64`
    /// codec. `time` shares the host type but is only read by
    /// [`get_time`](Self::get_time).
    fn get_long<I: ColumnIndex>(&self, index: I) -> Result<i64, RowError> {
        let i = index.position(self)?;
        match self.data_type_at(i) {
            DataType::BigInt | DataType::Counter | DataType::Custom(_) => {
                Ok(self.get::<i64, usize>(i)?.unwrap_or_default())
            }
            other => Err(RowError::invalid_type(format!("{other} is not a bigint or counter"))),
        }
    }

    /// Nanoseconds since midnight of a `time` slot. Other wire types
    /// decoding to `i64` are read with [`get_long`](Self::get_long) or
    /// [`get`](Self::get).
    fn get_time<I: ColumnIndex>(&self, index: I) -> Result<i64, RowError> {
        let i = index.position(self)?;
        match self.data_type_at(i) {
            DataType::Time => Ok(self.get::<i64, usize>(i)?.unwrap_or_default()),
            other => Err(RowError::invalid_type(format!("{other} is not a time"))),
        }
    }

    fn get_float<I: ColumnIndex>(&self, index: I) -> Result<f32, RowError> {
        Ok(self.get::<f32, I>(index)?.unwrap_or_default())
    }

    fn get_double<I: ColumnIndex>(&self, index: I) -> Result<f64, RowError> {
        Ok(self.get::<f64, I>(index)?.unwrap_or_default())
    }

    fn get_timestamp<I: ColumnIndex>(&self, index: I) -> Result<Option<Timestamp>, RowError> {
        self.get::<Timestamp, I>(index)
    }

    fn get_date<I: ColumnIndex>(&self, index: I) -> Result<Option<LocalDate>, RowError> {
        self.get::<LocalDate, I>(index)
    }

    fn get_duration<I: ColumnIndex>(&self, index: I) -> Result<Option<Duration>, RowError> {
        self.get::<Duration, I>(index)
    }

    /// `text` or `ascii`.
    fn get_string<I: ColumnIndex>(&self, index: I) -> Result<Option<String>, RowError> {
        self.get::<String, I>(index)
    }

    /// `blob` or custom.
    fn get_bytes<I: ColumnIndex>(&self, index: I) -> Result<Option<Bytes>, RowError> {
        self.get::<Bytes, I>(index)
    }

    fn get_varint<I: ColumnIndex>(&self, index: I) -> Result<Option<BigInt>, RowError> {
        self.get::<BigInt, I>(index)
    }

    fn get_decimal<I: ColumnIndex>(&self, index: I) -> Result<Option<BigDecimal>, RowError> {
        self.get::<BigDecimal, I>(index)
    }

    /// `uuid` or `timeuuid`.
    fn get_uuid<I: ColumnIndex>(&self, index: I) -> Result<Option<Uuid>, RowError> {
        self.get::<Uuid, I>(index)
    }

    fn get_inet<I: ColumnIndex>(&self, index: I) -> Result<Option<IpAddr>, RowError> {
        self.get::<IpAddr, I>(index)
    }

    fn get_list<T: HostType, I: ColumnIndex>(&self, index: I) -> Result<Vec<T>, RowError> {
        Ok(self.get::<Vec<T>, I>(index)?.unwrap_or_default())
    }

    fn get_set<T: HostType + Eq + Hash, I: ColumnIndex>(&self, index: I) -> Result<HashSet<T>, RowError> {
        Ok(self.get::<HashSet<T>, I>(index)?.unwrap_or_default())
    }

    fn get_map<K, V, I>(&self, index: I) -> Result<HashMap<K, V>, RowError>
    where
        K: HostType + Eq + Hash,
        V: HostType,
        I: ColumnIndex,
    {
        Ok(self.get::<HashMap<K, V>, I>(index)?.unwrap_or_default())
    }

    fn get_udt_value<I: ColumnIndex>(&self, index: I) -> Result<Option<UdtValue>, RowError> {
        self.get::<UdtValue, I>(index)
    }

    fn get_tuple_value<I: ColumnIndex>(&self, index: I) -> Result<Option<TupleValue>, RowError> {
        self.get::<TupleValue, I>(index)
    }
}
