//! Codec and filter registry
//!
//! Provides [`Registry`] for looking up codecs by name, split into decode and
//! encode views. A registry is populated once, then frozen by
//! [`Registry::initialize`] into an `Arc<Registry>` that is shared read-only by
//! the recoder, the importer and any codec that calls back into it.

use crate::codec::{Codec, Decode, Encode};
use crate::codecs::{HclCodec, JsonCodec, NullCodec, TomlCodec, YamlCodec};
use crate::error::RegistryError;
use crate::filter::Filter;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of codecs and filters indexed by name
#[derive(Default)]
pub struct Registry {
    /// Distinct codecs in registration order
    codecs: Vec<Arc<dyn Codec>>,
    /// Every codec name
    all: HashMap<String, Arc<dyn Codec>>,
    /// Names of decode-capable codecs
    decoders: HashMap<String, Arc<dyn Codec>>,
    /// Names of encode-capable codecs
    encoders: HashMap<String, Arc<dyn Codec>>,
    /// Filter names
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("codec_count", &self.codecs.len())
            .field("decoders", &self.decoder_names())
            .field("encoders", &self.encoder_names())
            .field("filters", &self.filter_names())
            .finish()
    }
}

impl Registry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in format codecs
    ///
    /// json/j, yaml/yml/y, hcl/h, toml/t, null/n
    pub fn with_builtin_codecs() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(JsonCodec)?;
        registry.register(YamlCodec)?;
        registry.register(HclCodec)?;
        registry.register(TomlCodec)?;
        registry.register(NullCodec)?;
        Ok(registry)
    }

    /// Register a codec under all of its names
    ///
    /// # Errors
    /// - `RegistryError::DuplicateName` if any name is taken; nothing is registered
    /// - `RegistryError::NoNames` if the codec declares no names
    pub fn register<C: Codec>(&mut self, codec: C) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(codec))
    }

    /// Register an already shared codec
    pub fn register_shared(&mut self, codec: Arc<dyn Codec>) -> Result<(), RegistryError> {
        let names = codec.names();
        if names.is_empty() {
            return Err(RegistryError::NoNames);
        }
        check_unique(names, |name| self.all.contains_key(name))?;

        let decodes = codec.decoder().is_some();
        let encodes = codec.encoder().is_some();
        for name in names {
            if decodes {
                self.decoders.insert((*name).to_string(), Arc::clone(&codec));
            }
            if encodes {
                self.encoders.insert((*name).to_string(), Arc::clone(&codec));
            }
            self.all.insert((*name).to_string(), Arc::clone(&codec));
        }
        tracing::debug!(names = ?names, decodes, encodes, "registered codec");
        self.codecs.push(codec);
        Ok(())
    }

    /// Register a filter under all of its names
    pub fn register_filter<F: Filter>(&mut self, filter: F) -> Result<(), RegistryError> {
        let filter: Arc<dyn Filter> = Arc::new(filter);
        let names = filter.names();
        if names.is_empty() {
            return Err(RegistryError::NoNames);
        }
        check_unique(names, |name| self.filters.contains_key(name))?;

        for name in names {
            self.filters.insert((*name).to_string(), Arc::clone(&filter));
        }
        tracing::debug!(names = ?names, "registered filter");
        Ok(())
    }

    /// Freeze the registry and initialize every distinct codec once
    ///
    /// # Errors
    /// - `RegistryError::Initialize` for the first codec whose setup fails
    pub fn initialize(self) -> Result<Arc<Self>, RegistryError> {
        let registry = Arc::new(self);
        for codec in &registry.codecs {
            codec
                .initialize(&registry)
                .map_err(|source| RegistryError::Initialize {
                    codec: codec.names().first().copied().unwrap_or_default().to_string(),
                    source,
                })?;
        }
        tracing::debug!(codecs = registry.codecs.len(), "registry initialized");
        Ok(registry)
    }

    /// Look up a decoder by name
    #[must_use]
    pub fn decoder(&self, name: &str) -> Option<&dyn Decode> {
        self.decoders.get(name).and_then(|codec| codec.decoder())
    }

    /// Look up an encoder by name
    #[must_use]
    pub fn encoder(&self, name: &str) -> Option<&dyn Encode> {
        self.encoders.get(name).and_then(|codec| codec.encoder())
    }

    /// Look up any codec by name
    #[must_use]
    pub fn codec(&self, name: &str) -> Option<&Arc<dyn Codec>> {
        self.all.get(name)
    }

    /// Look up a filter by name
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|filter| &**filter)
    }

    /// Distinct codecs in registration order
    pub fn codecs(&self) -> impl Iterator<Item = &Arc<dyn Codec>> {
        self.codecs.iter()
    }

    /// All decoder names, sorted
    #[must_use]
    pub fn decoder_names(&self) -> Vec<&str> {
        sorted_keys(&self.decoders)
    }

    /// All encoder names, sorted
    #[must_use]
    pub fn encoder_names(&self) -> Vec<&str> {
        sorted_keys(&self.encoders)
    }

    /// All filter names, sorted
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        sorted_keys(&self.filters)
    }

    /// Distinct filters with their names, sorted by primary name
    #[must_use]
    pub fn filters(&self) -> Vec<&dyn Filter> {
        let mut seen: Vec<&dyn Filter> = Vec::new();
        for filter in self.filters.values() {
            if !seen.iter().any(|f| f.names() == filter.names()) {
                seen.push(&**filter);
            }
        }
        seen.sort_by_key(|f| f.names().first().copied().unwrap_or_default());
        seen
    }
}

fn check_unique(names: &[&'static str], taken: impl Fn(&str) -> bool) -> Result<(), RegistryError> {
    for (idx, name) in names.iter().enumerate() {
        if taken(name) || names[..idx].contains(name) {
            return Err(RegistryError::DuplicateName((*name).to_string()));
        }
    }
    Ok(())
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}
