//! RegistryBuilder for configuring and constructing registries
//!
//! ## Table of Contents
//! - **RegistryConfig**: Policy flags for spawn persistence and startup
//! - **RegistryBuilder**: Builder pattern for [`SpawnedObjectRegistry`]

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::{MooringError, Result};
use crate::provider::{AnchorProvider, BoxedAnchorProvider};
use crate::registry::SpawnedObjectRegistry;
use crate::spawner::{BoxedObjectSpawner, ObjectSpawner};
use crate::store::AnchorStore;

/// Policy flags for the registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Record new spawns as persistent (candidates for a bulk save)
    pub persist_new_spawns: bool,
    /// Spawn everything in the store during [`SpawnedObjectRegistry::start`]
    pub load_on_start: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            persist_new_spawns: true,
            load_on_start: false,
        }
    }
}

impl RegistryConfig {
    /// Set whether new spawns are recorded as persistent
    pub fn persist_new_spawns(mut self, persist: bool) -> Self {
        self.persist_new_spawns = persist;
        self
    }

    /// Set whether `start` loads every stored anchor
    pub fn load_on_start(mut self, load: bool) -> Self {
        self.load_on_start = load;
        self
    }
}

/// Builder for constructing [`SpawnedObjectRegistry`] instances
pub struct RegistryBuilder {
    config: RegistryConfig,
    store_path: Option<PathBuf>,
    store: Option<AnchorStore>,
    provider: Option<BoxedAnchorProvider>,
    spawner: Option<BoxedObjectSpawner>,
}

impl RegistryBuilder {
    /// Create a new RegistryBuilder with default configuration
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            store_path: None,
            store: None,
            provider: None,
            spawner: None,
        }
    }

    /// Back the anchor store with a JSON file at `path`
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Use an existing store instance
    pub fn with_store(mut self, store: AnchorStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the platform anchor provider
    pub fn with_provider<P: AnchorProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set a shared anchor provider
    pub fn with_shared_provider(mut self, provider: BoxedAnchorProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the object spawner
    pub fn with_spawner<S: ObjectSpawner + 'static>(mut self, spawner: S) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Set a shared object spawner
    pub fn with_shared_spawner(mut self, spawner: BoxedObjectSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Set whether new spawns are recorded as persistent
    pub fn with_persist_new_spawns(mut self, persist: bool) -> Self {
        self.config.persist_new_spawns = persist;
        self
    }

    /// Set whether `start` loads every stored anchor
    pub fn with_load_on_start(mut self, load: bool) -> Self {
        self.config.load_on_start = load;
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the registry instance
    pub fn build(self) -> Result<SpawnedObjectRegistry> {
        let store = match self.store {
            Some(store) => store,
            None => {
                let path = self.store_path.ok_or_else(|| {
                    MooringError::config("an anchor store path (or store instance) is required")
                })?;
                AnchorStore::new(path)
            }
        };
        let provider = self
            .provider
            .ok_or_else(|| MooringError::config("an anchor provider is required"))?;
        let spawner = self
            .spawner
            .ok_or_else(|| MooringError::config("an object spawner is required"))?;

        info!(
            store = %store.path().display(),
            provider = %provider.name(),
            "Building spawned-object registry"
        );

        Ok(SpawnedObjectRegistry::new(
            self.config,
            store,
            provider,
            spawner,
        ))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SimulatedAnchorProvider;
    use crate::spawner::SimulatedSpawner;

    #[test]
    fn test_builder_requires_store() {
        let result = RegistryBuilder::new()
            .with_provider(SimulatedAnchorProvider::new())
            .with_spawner(SimulatedSpawner::new(["cube"]))
            .build();
        assert!(matches!(result, Err(MooringError::Config(_))));
    }

    #[test]
    fn test_builder_requires_provider_and_spawner() {
        let dir = tempfile::tempdir().unwrap();
        let result = RegistryBuilder::new()
            .with_store_path(dir.path().join("anchors.json"))
            .build();
        assert!(matches!(result, Err(MooringError::Config(_))));
    }

    #[test]
    fn test_builder_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RegistryBuilder::new()
            .with_store_path(dir.path().join("anchors.json"))
            .with_provider(SimulatedAnchorProvider::new())
            .with_spawner(SimulatedSpawner::new(["cube"]))
            .with_load_on_start(true)
            .build()
            .unwrap();
        assert!(registry.config().load_on_start);
        assert!(registry.config().persist_new_spawns);
    }

    #[test]
    fn test_builder_with_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnchorStore::new(dir.path().join("anchors.json"));
        let registry = RegistryBuilder::new()
            .with_store(store)
            .with_provider(SimulatedAnchorProvider::new())
            .with_spawner(SimulatedSpawner::new(["cube"]))
            .with_persist_new_spawns(false)
            .build()
            .unwrap();
        assert!(!registry.config().persist_new_spawns);
    }
}
