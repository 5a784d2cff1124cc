use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use bytes::Bytes;
use parking_lot::RwLock;
use strata_api::{DataType, Kind, ProtocolVersion, RowError};

use crate::codec::{TypeCodec, primitive};
use crate::host::HostType;
use crate::value::Value;

/// Type-erased view of a registered `Arc<dyn TypeCodec<T>>`.
trait ErasedCodec: Send + Sync {
    fn accepts(&self, data_type: &DataType) -> bool;
    fn describe(&self) -> String;
    fn as_any(&self) -> &dyn Any;
}

struct Typed<T: 'static>(Arc<dyn TypeCodec<T>>);

impl<T: 'static> ErasedCodec for Typed<T> {
    fn accepts(&self, data_type: &DataType) -> bool {
        self.0.accepts(data_type)
    }

    fn describe(&self) -> String {
        format!("{} <-> {}", self.0.data_type(), type_name::<T>())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Registration {
    host: TypeId,
    codec: Box<dyn ErasedCodec>,
}

/// Codecs built on demand for composite types, keyed by exact wire type
/// and host type. Cleared whenever a codec is registered, since a new
/// registration may change what a composite resolves to.
#[derive(Default)]
struct SynthesizedCache {
    generation: u64,
    codecs: HashMap<(DataType, TypeId), Arc<dyn Any + Send + Sync>>,
}

struct RegistryInner {
    /// Registered codecs bucketed by wire type kind, in registration order.
    registered: RwLock<HashMap<Kind, Vec<Registration>>>,
    synthesized: RwLock<SynthesizedCache>,
}

// ════════════════════════════════════════════════════════════════
//  CodecRegistry
// ════════════════════════════════════════════════════════════════

/// Thread-safe lookup of codecs by `(wire type, host type)`.
///
/// Cloning is cheap and yields a handle to the same registry. Lookups
/// take a shared lock; registration takes an exclusive one, so a reader
/// sees either the table before a registration or after it, never a
/// partial update.
///
/// Resolution order for `codec_for::<T>(data_type)`:
/// 1. the first registered codec for host type `T` that accepts `data_type`,
/// 2. a previously synthesized codec for the exact pair,
/// 3. a codec synthesized by [`HostType::synthesize`] (collections, tuples,
///    user types and [`Value`]), which is then cached.
#[derive(Clone)]
pub struct CodecRegistry {
    inner: Arc<RegistryInner>,
}

impl CodecRegistry {
    /// A registry holding the built-in codecs.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry
            .register(primitive::boolean())
            .register(primitive::tinyint())
            .register(primitive::smallint())
            .register(primitive::int())
            .register(primitive::bigint())
            .register(primitive::counter())
            .register(primitive::time())
            .register(primitive::float())
            .register(primitive::double())
            .register(primitive::varint())
            .register(primitive::decimal())
            .register(primitive::text())
            .register(primitive::ascii())
            .register(primitive::blob())
            .register(primitive::custom())
            .register(primitive::uuid())
            .register(primitive::timeuuid())
            .register(primitive::inet())
            .register(primitive::timestamp())
            .register(primitive::date())
            .register(primitive::duration());
        registry
    }

    /// A registry without any codec. Only synthesized composites of
    /// registered element codecs resolve.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                registered: RwLock::new(HashMap::new()),
                synthesized: RwLock::new(SynthesizedCache::default()),
            }),
        }
    }

    /// Process-wide registry with the built-in codecs, created on first use.
    pub fn default_instance() -> CodecRegistry {
        static DEFAULT: OnceLock<CodecRegistry> = OnceLock::new();
        DEFAULT.get_or_init(CodecRegistry::new).clone()
    }

    /// Add a codec. A codec colliding with an existing registration (same
    /// host type, existing codec already accepting the new codec's wire
    /// type) is ignored with a warning: the first registration wins.
    pub fn register<T, C>(&self, codec: C) -> &Self
    where
        T: 'static,
        C: TypeCodec<T> + 'static,
    {
        let codec: Arc<dyn TypeCodec<T>> = Arc::new(codec);
        let data_type = codec.data_type().clone();
        let host = TypeId::of::<T>();
        let mut registered = self.inner.registered.write();
        let bucket = registered.entry(data_type.kind()).or_default();
        if let Some(existing) = bucket.iter().find(|r| r.host == host && r.codec.accepts(&data_type)) {
            tracing::warn!(
                existing = %existing.codec.describe(),
                ignored = %format!("{data_type} <-> {}", type_name::<T>()),
                "codec collides with an existing registration, ignoring it"
            );
            return self;
        }
        tracing::debug!(data_type = %data_type, host = type_name::<T>(), "registered codec");
        bucket.push(Registration {
            host,
            codec: Box::new(Typed(codec)),
        });

        let mut synthesized = self.inner.synthesized.write();
        synthesized.generation += 1;
        synthesized.codecs.clear();
        self
    }

    /// Register the codec `get_object` uses for `codec.data_type()`, for
    /// wire types (notably custom ones) without a built-in default.
    pub fn register_default<C>(&self, codec: C) -> &Self
    where
        C: TypeCodec<Value> + 'static,
    {
        self.register::<Value, C>(codec)
    }

    /// Codec converting `data_type` to and from host type `T`.
    ///
    /// Fails with `InvalidType` when nothing registered accepts the pair
    /// and `T` cannot synthesize one. The returned codec stays usable
    /// after every other handle to this registry is dropped.
    pub fn codec_for<T: HostType>(&self, data_type: &DataType) -> Result<Arc<dyn TypeCodec<T>>, RowError> {
        if let Some(codec) = self.find_registered::<T>(data_type) {
            return Ok(codec);
        }
        let inner = self.synthesized::<T>(data_type)?;
        let pinned: Arc<dyn TypeCodec<T>> = Arc::new(Pinned {
            _registry: self.clone(),
            inner,
        });
        Ok(pinned)
    }

    /// Same lookup as [`codec_for`](Self::codec_for), without pinning the
    /// registry. For callers that hold a registry handle for as long as
    /// they use the codec, and for synthesis, whose codecs end up in the
    /// registry's own cache.
    pub(crate) fn resolve<T: HostType>(&self, data_type: &DataType) -> Result<Arc<dyn TypeCodec<T>>, RowError> {
        match self.find_registered::<T>(data_type) {
            Some(codec) => Ok(codec),
            None => self.synthesized::<T>(data_type),
        }
    }

    fn synthesized<T: HostType>(&self, data_type: &DataType) -> Result<Arc<dyn TypeCodec<T>>, RowError> {
        let key = (data_type.clone(), TypeId::of::<T>());
        let generation = {
            let synthesized = self.inner.synthesized.read();
            let cached = synthesized
                .codecs
                .get(&key)
                .and_then(|c| c.downcast_ref::<Arc<dyn TypeCodec<T>>>());
            if let Some(codec) = cached {
                return Ok(codec.clone());
            }
            synthesized.generation
        };

        // No lock held here: synthesis recurses into resolve for element
        // and component types.
        let codec = match T::synthesize(data_type, self) {
            Some(codec) => codec?,
            None => {
                return Err(RowError::invalid_type(format!(
                    "no codec for {data_type} <-> {}",
                    type_name::<T>()
                )));
            }
        };
        tracing::debug!(data_type = %data_type, host = type_name::<T>(), "synthesized codec");

        let mut synthesized = self.inner.synthesized.write();
        if synthesized.generation == generation {
            let erased: Arc<dyn Any + Send + Sync> = Arc::new(codec.clone());
            synthesized.codecs.entry(key).or_insert(erased);
        }
        Ok(codec)
    }

    /// Codec `get_object` uses for `data_type`.
    pub fn default_codec(&self, data_type: &DataType) -> Result<Arc<dyn TypeCodec<Value>>, RowError> {
        self.codec_for::<Value>(data_type)
    }

    fn find_registered<T: 'static>(&self, data_type: &DataType) -> Option<Arc<dyn TypeCodec<T>>> {
        let host = TypeId::of::<T>();
        let registered = self.inner.registered.read();
        registered
            .get(&data_type.kind())?
            .iter()
            .filter(|r| r.host == host)
            .find(|r| r.codec.accepts(data_type))
            .and_then(|r| r.codec.as_any().downcast_ref::<Typed<T>>())
            .map(|typed| typed.0.clone())
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Arc::downgrade(&self.inner))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: usize = self.inner.registered.read().values().map(Vec::len).sum();
        let synthesized = self.inner.synthesized.read().codecs.len();
        f.debug_struct("CodecRegistry")
            .field("registered", &registered)
            .field("synthesized", &synthesized)
            .finish()
    }
}

/// Synthesized codec as handed out by `codec_for`. Tuple and UDT codecs
/// only hold a weak handle to the registry, so the caller's codec keeps
/// a strong one.
struct Pinned<T> {
    _registry: CodecRegistry,
    inner: Arc<dyn TypeCodec<T>>,
}

impl<T> TypeCodec<T> for Pinned<T> {
    fn data_type(&self) -> &DataType {
        self.inner.data_type()
    }

    fn accepts(&self, data_type: &DataType) -> bool {
        self.inner.accepts(data_type)
    }

    fn encode(&self, value: &T, version: ProtocolVersion) -> Result<Vec<u8>, RowError> {
        self.inner.encode(value, version)
    }

    fn decode(&self, bytes: Option<&Bytes>, version: ProtocolVersion) -> Result<Option<T>, RowError> {
        self.inner.decode(bytes, version)
    }
}

/// Non-owning handle held by composite codecs, which live inside the
/// registry's own cache.
#[derive(Clone)]
pub(crate) struct WeakRegistry(Weak<RegistryInner>);

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Result<CodecRegistry, RowError> {
        self.0
            .upgrade()
            .map(|inner| CodecRegistry { inner })
            .ok_or_else(|| RowError::illegal_state("codec registry has been dropped"))
    }
}
