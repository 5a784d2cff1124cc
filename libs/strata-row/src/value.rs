//! Dynamically typed values, the result of `get_object`.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use serde_json::json;
use strata_api::{DataType, Duration, LocalDate, RowError, Timestamp};
use uuid::Uuid;

use crate::codec::{CollectionCodec, MapCodec, MappedCodec, TypeCodec};
use crate::gettable::GettableData;
use crate::host::{HostType, Synthesized};
use crate::registry::CodecRegistry;
use crate::tuple::TupleValue;
use crate::udt::UdtValue;

/// A decoded value of any built-in wire type.
///
/// The variant follows the wire type, not just the host representation:
/// a `counter` decodes to `Counter`, a `bigint` to `BigInt`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Ascii(String),
    BigInt(i64),
    Blob(Bytes),
    Boolean(bool),
    Counter(i64),
    Decimal(BigDecimal),
    Double(f64),
    Float(f32),
    Int(i32),
    Timestamp(Timestamp),
    Uuid(Uuid),
    Text(String),
    Varint(num_bigint::BigInt),
    TimeUuid(Uuid),
    Inet(IpAddr),
    Date(LocalDate),
    /// Nanoseconds since midnight.
    Time(i64),
    SmallInt(i16),
    TinyInt(i8),
    Duration(Duration),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Entries in wire order.
    Map(Vec<(Value, Value)>),
    Tuple(TupleValue),
    Udt(UdtValue),
}

fn scalar<T: HostType>(
    registry: &CodecRegistry,
    data_type: &DataType,
    wrap: fn(T) -> Value,
    unwrap: fn(&Value) -> Option<&T>,
) -> Result<Arc<dyn TypeCodec<Value>>, RowError> {
    let inner = registry.resolve::<T>(data_type)?;
    let codec: Arc<dyn TypeCodec<Value>> = Arc::new(MappedCodec::new(inner, wrap, unwrap));
    Ok(codec)
}

macro_rules! scalar_codec {
    ($registry:expr, $data_type:expr, $host:ty, $variant:ident) => {
        scalar::<$host>($registry, $data_type, Value::$variant, |v| match v {
            Value::$variant(x) => Some(x),
            _ => None,
        })
    };
}

impl HostType for Value {
    /// Default codecs: every built-in type maps to its own variant, through
    /// whatever codec the registry resolves for the variant's payload.
    /// Custom types have no default unless one is registered.
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let codec = match data_type {
            DataType::Ascii => scalar_codec!(registry, data_type, String, Ascii),
            DataType::BigInt => scalar_codec!(registry, data_type, i64, BigInt),
            DataType::Blob => scalar_codec!(registry, data_type, Bytes, Blob),
            DataType::Boolean => scalar_codec!(registry, data_type, bool, Boolean),
            DataType::Counter => scalar_codec!(registry, data_type, i64, Counter),
            DataType::Decimal => scalar_codec!(registry, data_type, BigDecimal, Decimal),
            DataType::Double => scalar_codec!(registry, data_type, f64, Double),
            DataType::Float => scalar_codec!(registry, data_type, f32, Float),
            DataType::Int => scalar_codec!(registry, data_type, i32, Int),
            DataType::Timestamp => scalar_codec!(registry, data_type, Timestamp, Timestamp),
            DataType::Uuid => scalar_codec!(registry, data_type, Uuid, Uuid),
            DataType::Text => scalar_codec!(registry, data_type, String, Text),
            DataType::Varint => scalar_codec!(registry, data_type, num_bigint::BigInt, Varint),
            DataType::TimeUuid => scalar_codec!(registry, data_type, Uuid, TimeUuid),
            DataType::Inet => scalar_codec!(registry, data_type, IpAddr, Inet),
            DataType::Date => scalar_codec!(registry, data_type, LocalDate, Date),
            DataType::Time => scalar_codec!(registry, data_type, i64, Time),
            DataType::SmallInt => scalar_codec!(registry, data_type, i16, SmallInt),
            DataType::TinyInt => scalar_codec!(registry, data_type, i8, TinyInt),
            DataType::Duration => scalar_codec!(registry, data_type, Duration, Duration),
            DataType::List(element) => registry.resolve::<Value>(element).map(|element| {
                let list: Arc<dyn TypeCodec<Vec<Value>>> =
                    Arc::new(CollectionCodec::<Vec<Value>, Value>::new(data_type.clone(), element));
                Arc::new(MappedCodec::new(list, Value::List, |v| match v {
                    Value::List(items) => Some(items),
                    _ => None,
                })) as Arc<dyn TypeCodec<Value>>
            }),
            DataType::Set(element) => registry.resolve::<Value>(element).map(|element| {
                let set: Arc<dyn TypeCodec<Vec<Value>>> =
                    Arc::new(CollectionCodec::<Vec<Value>, Value>::new(data_type.clone(), element));
                Arc::new(MappedCodec::new(set, Value::Set, |v| match v {
                    Value::Set(items) => Some(items),
                    _ => None,
                })) as Arc<dyn TypeCodec<Value>>
            }),
            DataType::Map(key, value) => map_codec(data_type, key, value, registry),
            DataType::Tuple(_) => scalar_codec!(registry, data_type, TupleValue, Tuple),
            DataType::Udt(_) => scalar_codec!(registry, data_type, UdtValue, Udt),
            DataType::Custom(_) => return None,
        };
        Some(codec)
    }
}

fn map_codec(
    data_type: &DataType,
    key: &DataType,
    value: &DataType,
    registry: &CodecRegistry,
) -> Result<Arc<dyn TypeCodec<Value>>, RowError> {
    let key = registry.resolve::<Value>(key)?;
    let value = registry.resolve::<Value>(value)?;
    let entries: Arc<dyn TypeCodec<Vec<(Value, Value)>>> = Arc::new(
        MapCodec::<Vec<(Value, Value)>, Value, Value>::new(data_type.clone(), key, value),
    );
    let codec: Arc<dyn TypeCodec<Value>> = Arc::new(MappedCodec::new(entries, Value::Map, |v| match v {
        Value::Map(entries) => Some(entries),
        _ => None,
    }));
    Ok(codec)
}

// ════════════════════════════════════════════════════════════════
//  Rendering
// ════════════════════════════════════════════════════════════════

fn quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

fn fmt_time(f: &mut fmt::Formatter<'_>, nanos: i64) -> fmt::Result {
    let secs = nanos / 1_000_000_000;
    write!(
        f,
        "'{:02}:{:02}:{:02}.{:09}'",
        secs / 3600,
        secs / 60 % 60,
        secs % 60,
        nanos % 1_000_000_000
    )
}

fn fmt_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

/// CQL literal form: text quoted, blobs as `0x...`, collections in
/// `[..]`, `{..}` and `{k: v}` notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Ascii(s) | Value::Text(s) => quoted(f, s),
            Value::BigInt(v) | Value::Counter(v) => write!(f, "{v}"),
            Value::Blob(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Timestamp(v) => quoted(f, &v.to_string()),
            Value::Uuid(v) | Value::TimeUuid(v) => write!(f, "{v}"),
            Value::Varint(v) => write!(f, "{v}"),
            Value::Inet(v) => quoted(f, &v.to_string()),
            Value::Date(v) => quoted(f, &v.to_string()),
            Value::Time(v) => fmt_time(f, *v),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::Duration(v) => write!(f, "{v}"),
            Value::List(items) => fmt_seq(f, "[", items, "]"),
            Value::Set(items) => fmt_seq(f, "{", items, "}"),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Tuple(t) => write!(f, "{t}"),
            Value::Udt(u) => write!(f, "{u}"),
        }
    }
}

/// Render slot `index` of `data`: `NULL`, the decoded value, or the raw
/// bytes when the slot cannot be decoded.
pub(crate) fn fmt_slot<D: GettableData + ?Sized>(data: &D, index: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match data.get_object(index) {
        Ok(Some(value)) => write!(f, "{value}"),
        Ok(None) => f.write_str("NULL"),
        Err(_) => match data.raw_at(index) {
            Some(raw) => write!(f, "0x{}", hex::encode(raw)),
            None => f.write_str("NULL"),
        },
    }
}

fn slots_to_json<D: GettableData + ?Sized>(data: &D) -> Result<Vec<serde_json::Value>, RowError> {
    (0..data.len())
        .map(|i| match data.get_object(i)? {
            Some(v) => v.to_json(),
            None => Ok(serde_json::Value::Null),
        })
        .collect()
}

impl Value {
    /// JSON rendering. Numbers that do not fit a JSON number losslessly
    /// (varint, decimal) and identifiers become strings; blobs become
    /// `0x`-prefixed hex; maps with text keys become objects, any other
    /// map an array of `[key, value]` pairs.
    pub fn to_json(&self) -> Result<serde_json::Value, RowError> {
        Ok(match self {
            Value::Ascii(s) | Value::Text(s) => json!(s),
            Value::BigInt(v) | Value::Counter(v) | Value::Time(v) => json!(v),
            Value::Blob(b) => json!(format!("0x{}", hex::encode(b))),
            Value::Boolean(v) => json!(v),
            Value::Decimal(v) => json!(v.to_string()),
            Value::Double(v) => json!(v),
            Value::Float(v) => json!(v),
            Value::Int(v) => json!(v),
            Value::Timestamp(v) => json!(v.to_string()),
            Value::Uuid(v) | Value::TimeUuid(v) => json!(v.to_string()),
            Value::Varint(v) => json!(v.to_string()),
            Value::Inet(v) => json!(v.to_string()),
            Value::Date(v) => json!(v.to_string()),
            Value::SmallInt(v) => json!(v),
            Value::TinyInt(v) => json!(v),
            Value::Duration(v) => json!(v.to_string()),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect::<Result<_, _>>()?)
            }
            Value::Map(entries) => {
                let text_keys = entries.iter().all(|(k, _)| matches!(k, Value::Text(_) | Value::Ascii(_)));
                if text_keys {
                    let mut obj = serde_json::Map::new();
                    for (k, v) in entries {
                        if let Value::Text(k) | Value::Ascii(k) = k {
                            obj.insert(k.clone(), v.to_json()?);
                        }
                    }
                    serde_json::Value::Object(obj)
                } else {
                    let pairs = entries
                        .iter()
                        .map(|(k, v)| Ok(json!([k.to_json()?, v.to_json()?])))
                        .collect::<Result<Vec<_>, RowError>>()?;
                    serde_json::Value::Array(pairs)
                }
            }
            Value::Tuple(t) => serde_json::Value::Array(slots_to_json(t)?),
            Value::Udt(u) => {
                let values = slots_to_json(u)?;
                let obj = u.field_names().map(str::to_owned).zip(values).collect();
                serde_json::Value::Object(obj)
            }
        })
    }
}
