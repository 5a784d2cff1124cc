use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::net::IpAddr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use strata_api::{DataType, Duration, LocalDate, RowError, Timestamp};
use uuid::Uuid;

use crate::codec::{CollectionCodec, MapCodec, TypeCodec};
use crate::registry::CodecRegistry;

/// Result of [`HostType::synthesize`]: `None` when the host type has no
/// way to build a codec for the wire type.
pub type Synthesized<T> = Option<Result<Arc<dyn TypeCodec<T>>, RowError>>;

/// A Rust type values can be decoded into.
///
/// Scalars resolve through registered codecs only. Container types
/// build their codec from the element codecs the registry resolves.
pub trait HostType: Sized + Send + Sync + 'static {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let _ = (data_type, registry);
        None
    }
}

macro_rules! registered_only {
    ($($t:ty),* $(,)?) => {
        $(impl HostType for $t {})*
    };
}

registered_only!(
    bool, i8, i16, i32, i64, f32, f64, String, Bytes, BigInt, BigDecimal, Uuid, IpAddr, Timestamp, LocalDate, Duration,
);

fn collection<C, T>(data_type: &DataType, element: &DataType, registry: &CodecRegistry) -> Synthesized<C>
where
    C: crate::codec::CollectionLike<T> + HostType,
    T: HostType,
{
    Some(registry.resolve::<T>(element).map(|element| {
        Arc::new(CollectionCodec::<C, T>::new(data_type.clone(), element)) as Arc<dyn TypeCodec<C>>
    }))
}

fn map<M, K, V>(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<M>
where
    M: crate::codec::MapLike<K, V> + HostType,
    K: HostType,
    V: HostType,
{
    let DataType::Map(key, value) = data_type else { return None };
    let build = || -> Result<Arc<dyn TypeCodec<M>>, RowError> {
        let key = registry.resolve::<K>(key)?;
        let value = registry.resolve::<V>(value)?;
        Ok(Arc::new(MapCodec::<M, K, V>::new(data_type.clone(), key, value)))
    };
    Some(build())
}

impl<T: HostType> HostType for Vec<T> {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let DataType::List(element) = data_type else { return None };
        collection::<Self, T>(data_type, element, registry)
    }
}

impl<T: HostType + Eq + Hash> HostType for HashSet<T> {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let DataType::Set(element) = data_type else { return None };
        collection::<Self, T>(data_type, element, registry)
    }
}

impl<T: HostType + Ord> HostType for BTreeSet<T> {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        let DataType::Set(element) = data_type else { return None };
        collection::<Self, T>(data_type, element, registry)
    }
}

impl<K: HostType + Eq + Hash, V: HostType> HostType for HashMap<K, V> {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        map::<Self, K, V>(data_type, registry)
    }
}

impl<K: HostType + Ord, V: HostType> HostType for BTreeMap<K, V> {
    fn synthesize(data_type: &DataType, registry: &CodecRegistry) -> Synthesized<Self> {
        map::<Self, K, V>(data_type, registry)
    }
}
