//! Registry of backend factories supported by the process/build.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use authplug_backend::BackendFactory;

use crate::errors::BackendNotFound;

/// Registers of backend factories for implementations supported by the process/build.
#[derive(Clone, Default)]
pub struct Backends {
    /// Supported backends by name.
    factories: HashMap<String, Arc<dyn BackendFactory>>,
}

impl Backends {
    /// Start building an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lookup a [`BackendFactory`] by name.
    pub fn lookup(&self, name: &str) -> Result<&dyn BackendFactory> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BackendNotFound(name.to_string()))?;
        Ok(factory.as_ref())
    }

    /// Sorted list of registered backend names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Register a new factory for a backend implementation.
    ///
    /// # Panics
    ///
    /// This method panics if the name of the new backend is already in use
    /// or is reserved for the pre-shared-key provider.
    pub fn register<B, S>(&mut self, name: S, factory: B) -> &mut Self
    where
        B: BackendFactory + 'static,
        S: Into<String>,
    {
        let name = name.into();
        if cfg!(feature = "psk") && name == crate::PSK_BACKEND {
            panic!("backend name '{}' is reserved", name);
        }
        match self.factories.entry(name) {
            Entry::Occupied(entry) => {
                panic!("a backend with name '{}' is already registered", entry.key())
            }
            Entry::Vacant(entry) => entry.insert(Arc::new(factory)),
        };
        self
    }

    /// Register metrics for the selected backends.
    ///
    /// Names not in the registry (including the pre-shared-key provider) are skipped.
    pub fn register_metrics(&self, names: &[String], registry: &prometheus::Registry) -> Result<()> {
        for name in names {
            if let Some(factory) = self.factories.get(name) {
                factory.register_metrics(registry)?;
            }
        }
        Ok(())
    }
}
