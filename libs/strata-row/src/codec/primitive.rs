//! Built-in codecs for the scalar wire types.
//!
//! Every constructor here returns a fresh codec; [`CodecRegistry::new`]
//! registers one of each.
//!
//! [`CodecRegistry::new`]: crate::CodecRegistry::new

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use strata_api::{DataType, Duration, LocalDate, ProtocolVersion, RowError, Timestamp};
use uuid::Uuid;

use super::TypeCodec;
use super::wire::{read_vint, write_vint};

/// Codec for a fixed scalar wire type, built from a pair of plain
/// conversion functions.
///
/// Accepts every type of the same [`Kind`](strata_api::Kind). A codec
/// built for a named custom class accepts that class only; one built with
/// an empty class name accepts any custom type.
pub struct PrimitiveCodec<T> {
    data_type: DataType,
    /// Whether a zero-length buffer reads as null (fixed-width and numeric
    /// types) or is handed to `decode_fn` (text and blobs).
    empty_is_null: bool,
    decode_fn: fn(&[u8]) -> Result<T, RowError>,
    encode_fn: fn(&T) -> Result<Vec<u8>, RowError>,
}

impl<T> PrimitiveCodec<T> {
    pub fn new(
        data_type: DataType,
        empty_is_null: bool,
        decode_fn: fn(&[u8]) -> Result<T, RowError>,
        encode_fn: fn(&T) -> Result<Vec<u8>, RowError>,
    ) -> Self {
        Self {
            data_type,
            empty_is_null,
            decode_fn,
            encode_fn,
        }
    }
}

impl<T> TypeCodec<T> for PrimitiveCodec<T>
where
    T: Send + Sync,
{
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn accepts(&self, data_type: &DataType) -> bool {
        match &self.data_type {
            DataType::Custom(class) if !class.is_empty() => &self.data_type == data_type,
            _ => self.data_type.kind() == data_type.kind(),
        }
    }

    fn encode(&self, value: &T, _version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        (self.encode_fn)(value).map_err(|e| e.with_context(format!("encoding {}", self.data_type)))
    }

    fn decode(&self, bytes: Option<&Bytes>, _version: ProtocolVersion) -> Result<Option<T>, RowError> {
        match bytes {
            None => Ok(None),
            Some(b) if b.is_empty() && self.empty_is_null => Ok(None),
            Some(b) => (self.decode_fn)(b)
                .map(Some)
                .map_err(|e| e.with_context(format!("decoding {}", self.data_type))),
        }
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], RowError> {
    bytes
        .try_into()
        .map_err(|_| RowError::invalid_type(format!("expecting {N} bytes but got {}", bytes.len())))
}

// ════════════════════════════════════════════════════════════════
//  Numbers
// ════════════════════════════════════════════════════════════════

pub fn boolean() -> PrimitiveCodec<bool> {
    PrimitiveCodec::new(
        DataType::Boolean,
        true,
        |b| fixed::<1>(b).map(|[v]| v != 0),
        |v| Ok(vec![u8::from(*v)]),
    )
}

pub fn tinyint() -> PrimitiveCodec<i8> {
    PrimitiveCodec::new(
        DataType::TinyInt,
        true,
        |b| fixed(b).map(i8::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

pub fn smallint() -> PrimitiveCodec<i16> {
    PrimitiveCodec::new(
        DataType::SmallInt,
        true,
        |b| fixed(b).map(i16::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

pub fn int() -> PrimitiveCodec<i32> {
    PrimitiveCodec::new(
        DataType::Int,
        true,
        |b| fixed(b).map(i32::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

fn long(data_type: DataType) -> PrimitiveCodec<i64> {
    PrimitiveCodec::new(
        data_type,
        true,
        |b| fixed(b).map(i64::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

pub fn bigint() -> PrimitiveCodec<i64> {
    long(DataType::BigInt)
}

pub fn counter() -> PrimitiveCodec<i64> {
    long(DataType::Counter)
}

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

fn time_of_day(nanos: i64) -> Result<i64, RowError> {
    if !(0..NANOS_PER_DAY).contains(&nanos) {
        return Err(RowError::invalid_type(format!(
            "{nanos} is not a valid time of day in nanoseconds"
        )));
    }
    Ok(nanos)
}

/// Nanoseconds since midnight, in `[0, 86_400_000_000_000)` both ways.
pub fn time() -> PrimitiveCodec<i64> {
    PrimitiveCodec::new(
        DataType::Time,
        true,
        |b| time_of_day(i64::from_be_bytes(fixed(b)?)),
        |v| Ok(time_of_day(*v)?.to_be_bytes().to_vec()),
    )
}

pub fn float() -> PrimitiveCodec<f32> {
    PrimitiveCodec::new(
        DataType::Float,
        true,
        |b| fixed(b).map(f32::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

pub fn double() -> PrimitiveCodec<f64> {
    PrimitiveCodec::new(
        DataType::Double,
        true,
        |b| fixed(b).map(f64::from_be_bytes),
        |v| Ok(v.to_be_bytes().to_vec()),
    )
}

pub fn varint() -> PrimitiveCodec<BigInt> {
    PrimitiveCodec::new(
        DataType::Varint,
        true,
        |b| Ok(BigInt::from_signed_bytes_be(b)),
        |v| Ok(v.to_signed_bytes_be()),
    )
}

/// 32-bit scale followed by the two's-complement unscaled value.
pub fn decimal() -> PrimitiveCodec<BigDecimal> {
    PrimitiveCodec::new(
        DataType::Decimal,
        true,
        |b| {
            if b.len() < 4 {
                return Err(RowError::invalid_type(format!(
                    "expecting at least 4 bytes but got {}",
                    b.len()
                )));
            }
            let scale = i32::from_be_bytes(fixed(&b[..4])?);
            let unscaled = BigInt::from_signed_bytes_be(&b[4..]);
            Ok(BigDecimal::new(unscaled, i64::from(scale)))
        },
        |v| {
            let (unscaled, scale) = v.as_bigint_and_exponent();
            let scale = i32::try_from(scale)
                .map_err(|_| RowError::invalid_type(format!("scale {scale} does not fit 32 bits")))?;
            let mut out = scale.to_be_bytes().to_vec();
            out.extend_from_slice(&unscaled.to_signed_bytes_be());
            Ok(out)
        },
    )
}

// ════════════════════════════════════════════════════════════════
//  Text and bytes
// ════════════════════════════════════════════════════════════════

pub fn text() -> PrimitiveCodec<String> {
    PrimitiveCodec::new(
        DataType::Text,
        false,
        |b| Ok(std::str::from_utf8(b)?.to_owned()),
        |v| Ok(v.as_bytes().to_vec()),
    )
}

pub fn ascii() -> PrimitiveCodec<String> {
    PrimitiveCodec::new(
        DataType::Ascii,
        false,
        |b| {
            if !b.is_ascii() {
                return Err(RowError::invalid_type("non-ASCII bytes in ascii value"));
            }
            Ok(std::str::from_utf8(b)?.to_owned())
        },
        |v| {
            if !v.is_ascii() {
                return Err(RowError::invalid_type(format!("'{v}' is not ASCII")));
            }
            Ok(v.as_bytes().to_vec())
        },
    )
}

pub fn blob() -> PrimitiveCodec<Bytes> {
    PrimitiveCodec::new(
        DataType::Blob,
        false,
        |b| Ok(Bytes::copy_from_slice(b)),
        |v| Ok(v.to_vec()),
    )
}

/// Raw bytes of any custom type. Its [`data_type`](TypeCodec::data_type)
/// is a custom type with an empty class name.
pub fn custom() -> PrimitiveCodec<Bytes> {
    PrimitiveCodec::new(
        DataType::Custom(String::new()),
        false,
        |b| Ok(Bytes::copy_from_slice(b)),
        |v| Ok(v.to_vec()),
    )
}

// ════════════════════════════════════════════════════════════════
//  Identifiers and addresses
// ════════════════════════════════════════════════════════════════

fn decode_uuid(b: &[u8]) -> Result<Uuid, RowError> {
    fixed::<16>(b).map(Uuid::from_bytes)
}

pub fn uuid() -> PrimitiveCodec<Uuid> {
    PrimitiveCodec::new(DataType::Uuid, true, decode_uuid, |v| Ok(v.as_bytes().to_vec()))
}

/// Version 1 UUIDs only; others are rejected on encode.
pub fn timeuuid() -> PrimitiveCodec<Uuid> {
    PrimitiveCodec::new(DataType::TimeUuid, true, decode_uuid, |v| {
        if v.get_version_num() != 1 {
            return Err(RowError::invalid_type(format!("{v} is not a version 1 (time-based) uuid")));
        }
        Ok(v.as_bytes().to_vec())
    })
}

pub fn inet() -> PrimitiveCodec<IpAddr> {
    PrimitiveCodec::new(
        DataType::Inet,
        true,
        |b| match b.len() {
            4 => Ok(IpAddr::V4(Ipv4Addr::from(fixed::<4>(b)?))),
            16 => Ok(IpAddr::V6(Ipv6Addr::from(fixed::<16>(b)?))),
            n => Err(RowError::invalid_type(format!("expecting 4 or 16 bytes but got {n}"))),
        },
        |v| match v {
            IpAddr::V4(a) => Ok(a.octets().to_vec()),
            IpAddr::V6(a) => Ok(a.octets().to_vec()),
        },
    )
}

// ════════════════════════════════════════════════════════════════
//  Temporal
// ════════════════════════════════════════════════════════════════

const DATE_EPOCH_OFFSET: i64 = 1 << 31;

pub fn timestamp() -> PrimitiveCodec<Timestamp> {
    PrimitiveCodec::new(
        DataType::Timestamp,
        true,
        |b| fixed(b).map(i64::from_be_bytes).map(Timestamp),
        |v| Ok(v.millis().to_be_bytes().to_vec()),
    )
}

/// Unsigned day count with the Unix epoch at 2^31.
pub fn date() -> PrimitiveCodec<LocalDate> {
    PrimitiveCodec::new(
        DataType::Date,
        true,
        |b| {
            let raw = i64::from(u32::from_be_bytes(fixed(b)?));
            let days = i32::try_from(raw - DATE_EPOCH_OFFSET)
                .map_err(|_| RowError::invalid_type("date out of range"))?;
            Ok(LocalDate::from_days_since_epoch(days))
        },
        |v| {
            let raw = (i64::from(v.days_since_epoch()) + DATE_EPOCH_OFFSET) as u32;
            Ok(raw.to_be_bytes().to_vec())
        },
    )
}

/// Three zig-zag vints: months, days, nanoseconds.
pub fn duration() -> PrimitiveCodec<Duration> {
    PrimitiveCodec::new(
        DataType::Duration,
        true,
        |b| {
            let mut buf = b;
            let months = read_vint(&mut buf)?;
            let days = read_vint(&mut buf)?;
            let nanoseconds = read_vint(&mut buf)?;
            if !buf.is_empty() {
                return Err(RowError::invalid_type(format!("{} trailing bytes after duration", buf.len())));
            }
            let months = i32::try_from(months).map_err(|_| RowError::invalid_type("duration months overflow"))?;
            let days = i32::try_from(days).map_err(|_| RowError::invalid_type("duration days overflow"))?;
            Ok(Duration::new(months, days, nanoseconds))
        },
        |v| {
            let parts = [i64::from(v.months), i64::from(v.days), v.nanoseconds];
            if parts.iter().any(|x| *x < 0) && parts.iter().any(|x| *x > 0) {
                return Err(RowError::invalid_type(format!(
                    "duration components must share a sign: {v:?}"
                )));
            }
            let mut out = Vec::new();
            for part in parts {
                write_vint(&mut out, part);
            }
            Ok(out)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<T: Send + Sync>(codec: &PrimitiveCodec<T>, raw: &[u8]) -> Result<Option<T>, RowError> {
        codec.decode(Some(&Bytes::copy_from_slice(raw)), ProtocolVersion::V4)
    }

    #[test]
    fn empty_buffers() {
        assert_eq!(decode(&int(), &[]).unwrap(), None);
        assert_eq!(decode(&text(), &[]).unwrap(), Some(String::new()));
        assert_eq!(decode(&blob(), &[]).unwrap(), Some(Bytes::new()));
    }

    #[test]
    fn wrong_width_is_invalid_type() {
        let err = decode(&int(), &[0, 1]).unwrap_err();
        assert_eq!(err.kind(), strata_api::ErrorKind::InvalidType);
        assert!(err.to_string().contains("decoding int"));
    }

    #[test]
    fn decimal_layout() {
        // 123.45 = unscaled 12345, scale 2
        let value = decode(&decimal(), &[0, 0, 0, 2, 0x30, 0x39]).unwrap().unwrap();
        assert_eq!(value.to_string(), "123.45");
        assert_eq!(decimal().encode(&value, ProtocolVersion::V4).unwrap(), vec![0, 0, 0, 2, 0x30, 0x39]);
    }

    #[test]
    fn date_epoch_offset() {
        let epoch = decode(&date(), &[0x80, 0, 0, 0]).unwrap().unwrap();
        assert_eq!(epoch.days_since_epoch(), 0);
        let before = decode(&date(), &[0x7F, 0xFF, 0xFF, 0xFF]).unwrap().unwrap();
        assert_eq!(before.to_string(), "1969-12-31");
    }

    #[test]
    fn time_outside_the_day_is_invalid() {
        let err = decode(&time(), &(-5i64).to_be_bytes()).unwrap_err();
        assert_eq!(err.kind(), strata_api::ErrorKind::InvalidType);
        assert!(decode(&time(), &NANOS_PER_DAY.to_be_bytes()).is_err());
        assert_eq!(decode(&time(), &(NANOS_PER_DAY - 1).to_be_bytes()).unwrap(), Some(NANOS_PER_DAY - 1));
        assert!(time().encode(&-1, ProtocolVersion::V4).is_err());
    }

    #[test]
    fn duration_layout() {
        let d = Duration::new(1, 2, 3);
        let raw = duration().encode(&d, ProtocolVersion::V4).unwrap();
        assert_eq!(raw, vec![2, 4, 6]);
        assert_eq!(decode(&duration(), &raw).unwrap(), Some(d));
        assert!(duration().encode(&Duration::new(1, -1, 0), ProtocolVersion::V4).is_err());
    }

    #[test]
    fn inet_both_families() {
        let v4 = decode(&inet(), &[127, 0, 0, 1]).unwrap().unwrap();
        assert_eq!(v4.to_string(), "127.0.0.1");
        let mut raw = [0u8; 16];
        raw[15] = 1;
        assert_eq!(decode(&inet(), &raw).unwrap().unwrap().to_string(), "::1");
        assert!(decode(&inet(), &[1, 2, 3]).is_err());
    }

    #[test]
    fn timeuuid_rejects_random_uuids() {
        let v4 = Uuid::from_bytes([0x55, 0, 0, 0, 0, 0, 0x40, 0, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert!(timeuuid().encode(&v4, ProtocolVersion::V4).is_err());
        assert!(uuid().encode(&v4, ProtocolVersion::V4).is_ok());
    }

    #[test]
    fn custom_codec_accepts_any_class() {
        let codec = custom();
        assert!(codec.accepts(&DataType::Custom("com.example.Point".into())));
        assert!(!codec.accepts(&DataType::Blob));

        let named = PrimitiveCodec::<Bytes>::new(
            DataType::Custom("com.example.Point".into()),
            false,
            |b| Ok(Bytes::copy_from_slice(b)),
            |v| Ok(v.to_vec()),
        );
        assert!(named.accepts(&DataType::Custom("com.example.Point".into())));
        assert!(!named.accepts(&DataType::Custom("com.example.Line".into())));
    }

    #[test]
    fn ascii_rejects_non_ascii() {
        assert!(decode(&ascii(), "é".as_bytes()).is_err());
        assert!(ascii().encode(&"é".to_string(), ProtocolVersion::V4).is_err());
    }
}
