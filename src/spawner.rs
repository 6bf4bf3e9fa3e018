//! Presentation-object spawning seam
//!
//! ## Table of Contents
//! - **ObjectSpawner**: Trait over the host's prefab catalog and instantiation
//! - **SimulatedSpawner**: In-memory spawner for development and tests
//! - **selector_label**: User-facing name for a selector

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{MooringError, Result};
use crate::types::{AnchorHandle, ObjectHandle, PrefabSelector};

/// Trait over the host's prefab catalog and object instantiation.
///
/// Spawning is synchronous (engines instantiate on the spot). Failure is
/// still surfaced as `Err` so a bulk load can skip the entry and
/// continue with the remaining ids.
pub trait ObjectSpawner: Send + Sync {
    /// Number of prefabs in the catalog
    fn prefab_count(&self) -> usize;

    /// Display name of a prefab, if the index is in range
    fn prefab_name(&self, index: usize) -> Option<&str>;

    /// Instantiate the prefab at `index`, parented to the anchor
    fn spawn(&self, index: usize, anchor: &AnchorHandle) -> Result<ObjectHandle>;

    /// Destroy a spawned object
    fn despawn(&self, object: ObjectHandle);
}

/// Type alias for a shared spawner
pub type BoxedObjectSpawner = Arc<dyn ObjectSpawner>;

/// User-facing name for a selector against a spawner's catalog.
///
/// Random labels as `Random`; a fixed index labels with the prefab's
/// name, or `prefab {index}` when the index is outside the catalog.
pub fn selector_label(spawner: &dyn ObjectSpawner, selector: PrefabSelector) -> String {
    match selector {
        PrefabSelector::Random => "Random".to_string(),
        PrefabSelector::Prefab(index) => match spawner.prefab_name(index) {
            Some(name) => name.to_string(),
            None => format!("prefab {index}"),
        },
    }
}

/// In-memory spawner over a named prefab catalog, for development and
/// tests. Handles are monotonic; live objects are tracked in a set.
pub struct SimulatedSpawner {
    prefabs: Vec<String>,
    next_handle: AtomicU64,
    live: Mutex<HashSet<ObjectHandle>>,
    fail_spawns: AtomicBool,
}

impl SimulatedSpawner {
    /// Create a spawner over named prefabs
    pub fn new<I, S>(prefabs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefabs: prefabs.into_iter().map(Into::into).collect(),
            next_handle: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
            fail_spawns: AtomicBool::new(false),
        }
    }

    /// Make subsequent spawn calls fail
    pub fn set_fail_spawns(&self, fail: bool) {
        self.fail_spawns.store(fail, Ordering::SeqCst);
    }

    /// Number of live objects
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Whether an object is live
    pub fn is_live(&self, object: ObjectHandle) -> bool {
        self.live.lock().contains(&object)
    }
}

impl ObjectSpawner for SimulatedSpawner {
    fn prefab_count(&self) -> usize {
        self.prefabs.len()
    }

    fn prefab_name(&self, index: usize) -> Option<&str> {
        self.prefabs.get(index).map(String::as_str)
    }

    fn spawn(&self, index: usize, anchor: &AnchorHandle) -> Result<ObjectHandle> {
        if self.fail_spawns.load(Ordering::SeqCst) {
            return Err(MooringError::spawn("simulated spawn failure"));
        }
        let name = self.prefabs.get(index).ok_or_else(|| {
            MooringError::spawn(format!(
                "prefab index {} out of range ({} prefabs)",
                index,
                self.prefabs.len()
            ))
        })?;

        let handle = ObjectHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.live.lock().insert(handle);
        debug!(object = %handle, prefab = %name, anchor = %anchor.id, "Simulated object spawned");
        Ok(handle)
    }

    fn despawn(&self, object: ObjectHandle) {
        self.live.lock().remove(&object);
        debug!(object = %object, "Simulated object despawned");
    }
}
