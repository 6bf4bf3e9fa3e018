//! # Mooring
//!
//! Spatial anchor persistence and a spawned-object registry for
//! mixed-reality sessions, engine-agnostic.
//!
//! ## Features
//!
//! - **Anchor Store**: JSON-file-backed mapping from anchor ids to prefab
//!   selectors, with atomic flushes and await-once lazy loading
//! - **Registry**: tracks live spawned objects and drives bulk
//!   save/load/delete/destroy operations
//! - **Provider Seam**: `AnchorProvider` trait over the platform anchor
//!   subsystem, with an in-crate simulated implementation
//! - **Spawner Seam**: `ObjectSpawner` trait over the host's prefab
//!   catalog and instantiation
//! - **Session Reports**: every bulk operation returns ordered,
//!   user-displayable per-anchor outcomes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mooring::{
//!     ObjectHandle, Pose, PrefabSelector, RegistryBuilder, SimulatedAnchorProvider,
//!     SimulatedSpawner,
//! };
//!
//! #[tokio::main]
//! async fn main() -> mooring::Result<()> {
//!     let registry = RegistryBuilder::new()
//!         .with_store_path("anchors.json")
//!         .with_provider(SimulatedAnchorProvider::new())
//!         .with_spawner(SimulatedSpawner::new(["cube", "sphere"]))
//!         .build()?;
//!
//!     registry.start().await;
//!     registry.set_selection(PrefabSelector::Prefab(0));
//!     registry
//!         .record_spawned(ObjectHandle::new(1), Pose::at(0.0, 1.0, -0.5))
//!         .await;
//!
//!     let report = registry.save_all().await;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod error;
pub mod provider;
pub mod registry;
pub mod report;
pub mod spawner;
pub mod store;
pub mod types;

// Re-exports for ergonomic API
pub use builder::{RegistryBuilder, RegistryConfig};
pub use error::{MooringError, Result};
pub use provider::{AnchorProvider, BoxedAnchorProvider, SimulatedAnchorProvider};
pub use registry::{SpawnedObjectRecord, SpawnedObjectRegistry};
pub use report::{ReportEntry, SessionReport};
pub use spawner::{selector_label, BoxedObjectSpawner, ObjectSpawner, SimulatedSpawner};
pub use store::AnchorStore;
pub use types::{AnchorHandle, AnchorId, ObjectHandle, Pose, PrefabSelector};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::RegistryBuilder;
    pub use crate::error::Result;
    pub use crate::provider::AnchorProvider;
    pub use crate::registry::SpawnedObjectRegistry;
    pub use crate::spawner::ObjectSpawner;
    pub use crate::store::AnchorStore;
    pub use crate::types::{AnchorId, ObjectHandle, Pose, PrefabSelector};
}
