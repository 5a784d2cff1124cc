//! Codecs for `list`, `set` and `map`, generic over the host container.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ProtocolVersion, RowError};

use super::TypeCodec;
use super::wire::{Reader, write_size, write_value};

/// Host container usable for `list` and `set` values.
pub trait CollectionLike<T>: FromIterator<T> {
    fn count(&self) -> usize;
    fn items(&self) -> Box<dyn Iterator<Item = &T> + '_>;
}

impl<T> CollectionLike<T> for Vec<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

impl<T: Eq + Hash> CollectionLike<T> for HashSet<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

impl<T: Ord> CollectionLike<T> for BTreeSet<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

/// Host container usable for `map` values.
pub trait MapLike<K, V>: FromIterator<(K, V)> {
    fn count(&self) -> usize;
    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;
}

impl<K: Eq + Hash, V> MapLike<K, V> for HashMap<K, V> {
    fn count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

impl<K: Ord, V> MapLike<K, V> for BTreeMap<K, V> {
    fn count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

/// Ordered pairs, keeping duplicate keys and wire order.
impl<K, V> MapLike<K, V> for Vec<(K, V)> {
    fn count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k, v)))
    }
}

fn null_element(data_type: &DataType) -> RowError {
    RowError::invalid_type(format!("null elements are not allowed in {data_type}"))
}

fn decode_element<T>(
    codec: &dyn TypeCodec<T>,
    raw: Option<Bytes>,
    version: ProtocolVersion,
    data_type: &DataType,
) -> Result<T, RowError> {
    let raw = raw.ok_or_else(|| null_element(data_type))?;
    codec.decode(Some(&raw), version)?.ok_or_else(|| null_element(data_type))
}

fn element_count(reader: &mut Reader<'_>, version: ProtocolVersion) -> Result<usize, RowError> {
    let n = reader.read_size(version)?;
    usize::try_from(n).map_err(|_| RowError::invalid_type(format!("negative element count {n}")))
}

// ════════════════════════════════════════════════════════════════
//  list / set
// ════════════════════════════════════════════════════════════════

/// `list<E>` or `set<E>` to any [`CollectionLike`] container of `T`.
pub struct CollectionCodec<C, T> {
    data_type: DataType,
    element: Arc<dyn TypeCodec<T>>,
    _container: PhantomData<fn() -> C>,
}

impl<C, T> CollectionCodec<C, T> {
    /// `data_type` must be a list or set whose element type `element`
    /// accepts.
    pub fn new(data_type: DataType, element: Arc<dyn TypeCodec<T>>) -> Self {
        Self {
            data_type,
            element,
            _container: PhantomData,
        }
    }
}

impl<C, T> TypeCodec<C> for CollectionCodec<C, T>
where
    C: CollectionLike<T>,
{
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn encode(&self, value: &C, version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        let mut out = Vec::new();
        write_size(&mut out, value.count(), version)?;
        for item in value.items() {
            let raw = self.element.encode(item, version)?;
            write_value(&mut out, &raw, version)?;
        }
        Ok(out)
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<C>, RowError> {
        let Some(bytes) = bytes else { return Ok(None) };
        if bytes.is_empty() {
            return Ok(Some(std::iter::empty().collect()));
        }
        let mut reader = Reader::new(bytes);
        let n = element_count(&mut reader, version)?;
        let element = self.element.as_ref();
        (0..n)
            .map(|_| {
                let raw = reader.read_value(version)?;
                decode_element(element, raw, version, &self.data_type)
            })
            .collect::<Result<C, RowError>>()
            .map(Some)
            .map_err(|e| e.with_context(format!("decoding {}", self.data_type)))
    }
}

// ════════════════════════════════════════════════════════════════
//  map
// ════════════════════════════════════════════════════════════════

/// `map<K, V>` to any [`MapLike`] container.
pub struct MapCodec<M, K, V> {
    data_type: DataType,
    key: Arc<dyn TypeCodec<K>>,
    value: Arc<dyn TypeCodec<V>>,
    _container: PhantomData<fn() -> M>,
}

impl<M, K, V> MapCodec<M, K, V> {
    pub fn new(data_type: DataType, key: Arc<dyn TypeCodec<K>>, value: Arc<dyn TypeCodec<V>>) -> Self {
        Self {
            data_type,
            key,
            value,
            _container: PhantomData,
        }
    }
}

impl<M, K, V> TypeCodec<M> for MapCodec<M, K, V>
where
    M: MapLike<K, V>,
{
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn encode(&self, value: &M, version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        let mut out = Vec::new();
        write_size(&mut out, value.count(), version)?;
        for (k, v) in value.entries() {
            let raw = self.key.encode(k, version)?;
            write_value(&mut out, &raw, version)?;
            let raw = self.value.encode(v, version)?;
            write_value(&mut out, &raw, version)?;
        }
        Ok(out)
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<M>, RowError> {
        let Some(bytes) = bytes else { return Ok(None) };
        if bytes.is_empty() {
            return Ok(Some(std::iter::empty().collect()));
        }
        let mut reader = Reader::new(bytes);
        let n = element_count(&mut reader, version)?;
        (0..n)
            .map(|_| {
                let k = reader.read_value(version)?;
                let k = decode_element(self.key.as_ref(), k, version, &self.data_type)?;
                let v = reader.read_value(version)?;
                let v = decode_element(self.value.as_ref(), v, version, &self.data_type)?;
                Ok((k, v))
            })
            .collect::<Result<M, RowError>>()
            .map(Some)
            .map_err(|e| e.with_context(format!("decoding {}", self.data_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitive;

    fn int_list() -> CollectionCodec<Vec<i32>, i32> {
        CollectionCodec::new(DataType::list(DataType::Int), Arc::new(primitive::int()))
    }

    #[test]
    fn list_framing_v4() {
        let raw = int_list().encode(&vec![1, 2], ProtocolVersion::V4).unwrap();
        assert_eq!(raw, vec![0, 0, 0, 2, 0, 0, 0, 4, 0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 2]);
        let decoded = int_list().decode(Some(&Bytes::from(raw)), ProtocolVersion::V4).unwrap();
        assert_eq!(decoded, Some(vec![1, 2]));
    }

    #[test]
    fn list_framing_v2() {
        let raw = int_list().encode(&vec![7], ProtocolVersion::V2).unwrap();
        assert_eq!(raw, vec![0, 1, 0, 4, 0, 0, 0, 7]);
        let decoded = int_list().decode(Some(&Bytes::from(raw)), ProtocolVersion::V2).unwrap();
        assert_eq!(decoded, Some(vec![7]));
    }

    #[test]
    fn empty_buffer_is_empty_collection() {
        let decoded = int_list().decode(Some(&Bytes::new()), ProtocolVersion::V4).unwrap();
        assert_eq!(decoded, Some(vec![]));
        assert_eq!(int_list().decode(None, ProtocolVersion::V4).unwrap(), None);
    }

    #[test]
    fn null_element_rejected() {
        let raw = Bytes::from_static(&[0, 0, 0, 1, 0xFF, 0xFF, 0xFF, 0xFF]);
        let err = int_list().decode(Some(&raw), ProtocolVersion::V4).unwrap_err();
        assert!(err.to_string().contains("null elements"));
    }

    #[test]
    fn map_into_btree() {
        let codec: MapCodec<BTreeMap<String, i32>, String, i32> = MapCodec::new(
            DataType::map(DataType::Text, DataType::Int),
            Arc::new(primitive::text()),
            Arc::new(primitive::int()),
        );
        let value = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let raw = codec.encode(&value, ProtocolVersion::V4).unwrap();
        assert_eq!(codec.decode(Some(&Bytes::from(raw)), ProtocolVersion::V4).unwrap(), Some(value));
    }
}
