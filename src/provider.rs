//! Platform anchor subsystem seam
//!
//! ## Table of Contents
//! - **AnchorProvider**: Trait over the platform anchor subsystem
//! - **SimulatedAnchorProvider**: In-memory provider for development and tests
//! - **BoxedAnchorProvider**: Shared trait-object alias

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{MooringError, Result};
use crate::types::{AnchorHandle, AnchorId, Pose};

/// Trait over the platform anchor subsystem.
///
/// A real implementation bridges to the platform's spatial tracking:
/// create/save/load/erase/remove, each a fallible async call. Failures
/// come back as `Err`; the registry turns them into per-id report
/// entries instead of aborting a bulk operation, so one bad anchor never
/// blocks the rest.
///
/// Live anchors and persisted anchors have distinct ids: saving a live
/// anchor returns the persistent id it can be reloaded by in a later
/// session.
///
/// # Example
///
/// ```rust,ignore
/// use mooring::provider::AnchorProvider;
/// use mooring::types::{AnchorHandle, AnchorId, Pose};
/// use async_trait::async_trait;
///
/// struct OpenXrProvider { /* session handles */ }
///
/// #[async_trait]
/// impl AnchorProvider for OpenXrProvider {
///     async fn create_anchor(&self, pose: Pose) -> mooring::Result<AnchorHandle> {
///         // xrCreateSpatialAnchor...
///         # unimplemented!()
///     }
///     // ...remaining operations
///     # async fn save_anchor(&self, _: &AnchorHandle) -> mooring::Result<AnchorId> { unimplemented!() }
///     # async fn load_anchor(&self, _: AnchorId) -> mooring::Result<AnchorHandle> { unimplemented!() }
///     # async fn erase_anchor(&self, _: AnchorId) -> mooring::Result<()> { unimplemented!() }
///     # async fn remove_anchor(&self, _: &AnchorHandle) -> mooring::Result<()> { unimplemented!() }
///     fn name(&self) -> &str {
///         "openxr"
///     }
/// }
/// ```
#[async_trait]
pub trait AnchorProvider: Send + Sync {
    /// Attach a new live anchor at a pose
    async fn create_anchor(&self, pose: Pose) -> Result<AnchorHandle>;

    /// Persist a live anchor, returning the id it can be reloaded by
    async fn save_anchor(&self, anchor: &AnchorHandle) -> Result<AnchorId>;

    /// Re-create a live anchor from a persisted id
    async fn load_anchor(&self, id: AnchorId) -> Result<AnchorHandle>;

    /// Remove the persisted copy of an anchor
    async fn erase_anchor(&self, id: AnchorId) -> Result<()>;

    /// Detach a live anchor from tracking
    async fn remove_anchor(&self, anchor: &AnchorHandle) -> Result<()>;

    /// Whether the platform can persist anchors at all
    fn supports_persistence(&self) -> bool {
        true
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Type alias for a shared provider
pub type BoxedAnchorProvider = Arc<dyn AnchorProvider>;

/// In-memory anchor provider for development and tests.
///
/// Live anchors are a trackable-id map, persisted anchors a separate map
/// keyed by the minted persistent id, so save/load round-trips behave
/// like a real platform's anchor store. Failure toggles let tests drive
/// every partial-failure path of the registry.
pub struct SimulatedAnchorProvider {
    live: RwLock<HashMap<AnchorId, Pose>>,
    persisted: RwLock<HashMap<AnchorId, Pose>>,
    supports_persistence: bool,
    fail_creates: AtomicBool,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    fail_erases: AtomicBool,
}

impl SimulatedAnchorProvider {
    /// Create a provider with persistence support
    pub fn new() -> Self {
        Self {
            live: RwLock::new(HashMap::new()),
            persisted: RwLock::new(HashMap::new()),
            supports_persistence: true,
            fail_creates: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            fail_erases: AtomicBool::new(false),
        }
    }

    /// Create a provider that reports persistence as unsupported
    pub fn without_persistence() -> Self {
        Self {
            supports_persistence: false,
            ..Self::new()
        }
    }

    /// Make subsequent create calls fail
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent save calls fail
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent load calls fail
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent erase calls fail
    pub fn set_fail_erases(&self, fail: bool) {
        self.fail_erases.store(fail, Ordering::SeqCst);
    }

    /// Number of live (tracked) anchors
    pub async fn live_count(&self) -> usize {
        self.live.read().await.len()
    }

    /// Number of persisted anchors
    pub async fn persisted_count(&self) -> usize {
        self.persisted.read().await.len()
    }

    /// Seed a persisted anchor, as if saved in an earlier session
    pub async fn seed_persisted(&self, id: AnchorId, pose: Pose) {
        self.persisted.write().await.insert(id, pose);
    }
}

impl Default for SimulatedAnchorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnchorProvider for SimulatedAnchorProvider {
    async fn create_anchor(&self, pose: Pose) -> Result<AnchorHandle> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(MooringError::provider("simulated create failure"));
        }
        let handle = AnchorHandle::new(AnchorId::random(), pose);
        self.live.write().await.insert(handle.id, pose);
        debug!(anchor = %handle.id, "Simulated anchor created");
        Ok(handle)
    }

    async fn save_anchor(&self, anchor: &AnchorHandle) -> Result<AnchorId> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(MooringError::provider("simulated save failure"));
        }
        if !self.supports_persistence {
            return Err(MooringError::unsupported("anchor persistence not available"));
        }
        if !self.live.read().await.contains_key(&anchor.id) {
            return Err(MooringError::provider(format!(
                "anchor {} is not tracked",
                anchor.id
            )));
        }
        let id = AnchorId::random();
        self.persisted.write().await.insert(id, anchor.pose);
        debug!(anchor = %anchor.id, persisted = %id, "Simulated anchor saved");
        Ok(id)
    }

    async fn load_anchor(&self, id: AnchorId) -> Result<AnchorHandle> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(MooringError::provider("simulated load failure"));
        }
        let pose = self
            .persisted
            .read()
            .await
            .get(&id)
            .copied()
            .ok_or_else(|| MooringError::provider(format!("no persisted anchor {}", id)))?;
        let handle = AnchorHandle::new(AnchorId::random(), pose);
        self.live.write().await.insert(handle.id, pose);
        debug!(persisted = %id, anchor = %handle.id, "Simulated anchor loaded");
        Ok(handle)
    }

    async fn erase_anchor(&self, id: AnchorId) -> Result<()> {
        if self.fail_erases.load(Ordering::SeqCst) {
            return Err(MooringError::provider("simulated erase failure"));
        }
        self.persisted
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| MooringError::provider(format!("no persisted anchor {}", id)))
    }

    async fn remove_anchor(&self, anchor: &AnchorHandle) -> Result<()> {
        self.live
            .write()
            .await
            .remove(&anchor.id)
            .map(|_| ())
            .ok_or_else(|| MooringError::provider(format!("anchor {} is not tracked", anchor.id)))
    }

    fn supports_persistence(&self) -> bool {
        self.supports_persistence
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
