//! Framing shared by the composite codecs: collection sizes, length-prefixed
//! values and the variable-length integers used by `duration`.

use bytes::Bytes;
use strata_api::{ProtocolVersion, RowError};

/// Cursor over a composite value. Values are returned as slices of the
/// parent buffer, never copied.
pub(crate) struct Reader<'a> {
    bytes: &'a Bytes,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a Bytes) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<Bytes, RowError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len()).ok_or_else(|| {
            RowError::invalid_type(format!(
                "truncated value: need {n} bytes at offset {}, {} available",
                self.pos,
                self.bytes.len().saturating_sub(self.pos)
            ))
        })?;
        let slice = self.bytes.slice(self.pos..end);
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, RowError> {
        let raw = self.take(4)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_u16(&mut self) -> Result<u16, RowError> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    /// Collection element count or element size.
    pub(crate) fn read_size(&mut self, version: ProtocolVersion) -> Result<i32, RowError> {
        if version.uses_short_collection_sizes() {
            self.read_u16().map(i32::from)
        } else {
            self.read_i32()
        }
    }

    /// Collection element. Negative sizes mean null.
    pub(crate) fn read_value(&mut self, version: ProtocolVersion) -> Result<Option<Bytes>, RowError> {
        let size = self.read_size(version)?;
        if size < 0 {
            return Ok(None);
        }
        self.take(size as usize).map(Some)
    }

    /// Tuple or UDT component: always a 32-bit size, -1 for null.
    pub(crate) fn read_component(&mut self) -> Result<Option<Bytes>, RowError> {
        let size = self.read_i32()?;
        if size < 0 {
            return Ok(None);
        }
        self.take(size as usize).map(Some)
    }
}

pub(crate) fn write_size(out: &mut Vec<u8>, size: usize, version: ProtocolVersion) -> Result<(), RowError> {
    if version.uses_short_collection_sizes() {
        let size = u16::try_from(size).map_err(|_| {
            RowError::invalid_type(format!("size {size} does not fit the 16-bit framing of protocol {version}"))
        })?;
        out.extend_from_slice(&size.to_be_bytes());
    } else {
        let size = i32::try_from(size)
            .map_err(|_| RowError::invalid_type(format!("size {size} does not fit a 32-bit signed integer")))?;
        out.extend_from_slice(&size.to_be_bytes());
    }
    Ok(())
}

pub(crate) fn write_value(out: &mut Vec<u8>, value: &[u8], version: ProtocolVersion) -> Result<(), RowError> {
    write_size(out, value.len(), version)?;
    out.extend_from_slice(value);
    Ok(())
}

pub(crate) fn write_component(out: &mut Vec<u8>, value: Option<&[u8]>) -> Result<(), RowError> {
    match value {
        None => out.extend_from_slice(&(-1i32).to_be_bytes()),
        Some(v) => {
            let size = i32::try_from(v.len())
                .map_err(|_| RowError::invalid_type(format!("component of {} bytes is too large", v.len())))?;
            out.extend_from_slice(&size.to_be_bytes());
            out.extend_from_slice(v);
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════
//  Variable-length integers
// ════════════════════════════════════════════════════════════════

/// Unsigned vint: the count of leading one bits in the first byte is the
/// number of extra bytes that follow, big-endian.
pub(crate) fn write_unsigned_vint(out: &mut Vec<u8>, value: u64) {
    let magnitude = 64 - (value | 1).leading_zeros() as usize;
    let extra = if magnitude > 56 { 8 } else { (magnitude - 1) / 7 };
    if extra == 8 {
        out.push(0xFF);
        out.extend_from_slice(&value.to_be_bytes());
        return;
    }
    let be = value.to_be_bytes();
    let mut encoded = be[8 - (extra + 1)..].to_vec();
    encoded[0] |= !(0xFFu8 >> extra);
    out.extend_from_slice(&encoded);
}

pub(crate) fn read_unsigned_vint(buf: &mut &[u8]) -> Result<u64, RowError> {
    let (&first, rest) = buf
        .split_first()
        .ok_or_else(|| RowError::invalid_type("truncated variable-length integer"))?;
    let extra = first.leading_ones() as usize;
    if rest.len() < extra {
        return Err(RowError::invalid_type("truncated variable-length integer"));
    }
    let mut value = u64::from(first & 0xFFu8.checked_shr(extra as u32).unwrap_or(0));
    for b in &rest[..extra] {
        value = (value << 8) | u64::from(*b);
    }
    *buf = &rest[extra..];
    Ok(value)
}

pub(crate) fn write_vint(out: &mut Vec<u8>, value: i64) {
    write_unsigned_vint(out, ((value << 1) ^ (value >> 63)) as u64);
}

pub(crate) fn read_vint(buf: &mut &[u8]) -> Result<i64, RowError> {
    let raw = read_unsigned_vint(buf)?;
    Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
}
