//! Spawned-object registry and bulk anchor operations
//!
//! ## Table of Contents
//! - **SpawnedObjectRecord**: Bookkeeping entry for one live object
//! - **SpawnedObjectRegistry**: Main registry struct

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::builder::RegistryConfig;
use crate::provider::BoxedAnchorProvider;
use crate::report::{ReportEntry, SessionReport};
use crate::spawner::{selector_label, BoxedObjectSpawner};
use crate::store::AnchorStore;
use crate::types::{AnchorHandle, AnchorId, ObjectHandle, Pose, PrefabSelector};

/// Bookkeeping entry for one live spawned object.
///
/// `anchor` is a back-reference to a provider-owned resource; `saved_id`
/// is set once the anchor has been persisted and matches a key in the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedObjectRecord {
    /// Handle of the live presentation object
    pub object: ObjectHandle,
    /// Live anchor the object is parented to, if attachment succeeded
    pub anchor: Option<AnchorHandle>,
    /// Selector the object was spawned with
    pub selector: PrefabSelector,
    /// Whether the object is a candidate for a bulk save
    pub persistent: bool,
    /// Persistent id from a successful save or load
    pub saved_id: Option<AnchorId>,
}

/// Tracks live spawned objects and drives save/load/delete operations
/// against the anchor store and the platform anchor provider.
///
/// Bulk operations never abort on the first bad anchor: each id or
/// record gets its own outcome entry in the returned [`SessionReport`],
/// and failures leave the store in a retryable state. Construct through
/// [`RegistryBuilder`](crate::builder::RegistryBuilder).
pub struct SpawnedObjectRegistry {
    config: RegistryConfig,
    store: AnchorStore,
    provider: BoxedAnchorProvider,
    spawner: BoxedObjectSpawner,
    records: RwLock<Vec<SpawnedObjectRecord>>,
    selection: Mutex<PrefabSelector>,
}

impl SpawnedObjectRegistry {
    /// Create a new registry (use RegistryBuilder instead)
    pub(crate) fn new(
        config: RegistryConfig,
        store: AnchorStore,
        provider: BoxedAnchorProvider,
        spawner: BoxedObjectSpawner,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            spawner,
            records: RwLock::new(Vec::new()),
            selection: Mutex::new(PrefabSelector::Random),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The anchor store
    pub fn store(&self) -> &AnchorStore {
        &self.store
    }

    /// Selector applied to new spawns
    pub fn selection(&self) -> PrefabSelector {
        *self.selection.lock()
    }

    /// Set the selector applied to new spawns
    pub fn set_selection(&self, selector: PrefabSelector) {
        *self.selection.lock() = selector;
    }

    /// Snapshot of the current records
    pub async fn records(&self) -> Vec<SpawnedObjectRecord> {
        self.records.read().await.clone()
    }

    /// Drive the store's initial load, then either load every stored
    /// anchor (when the load-on-start policy is set) or report the
    /// currently saved contents without spawning anything.
    pub async fn start(&self) -> SessionReport {
        self.store.load().await;

        if self.config.load_on_start {
            self.load_all().await
        } else {
            self.saved().await
        }
    }

    /// List the store contents with display labels, without touching
    /// the provider or spawning anything.
    pub async fn saved(&self) -> SessionReport {
        let mut report = SessionReport::new("Currently Saved Objects");
        let stored = self.store.snapshot().await;

        if stored.is_empty() {
            report.push(ReportEntry::NothingStored);
            return report;
        }
        for (id, selector) in stored {
            report.push(ReportEntry::Stored {
                id,
                label: selector_label(self.spawner.as_ref(), selector),
            });
        }
        report
    }

    /// Register a freshly spawned object and attach an anchor to it.
    ///
    /// The record takes the current selection as its selector and the
    /// persist-new-spawns policy as its persistence flag. Anchor
    /// attachment failure is logged and leaves the record anchor-less;
    /// the object stays registered either way. Returns whether an
    /// anchor was attached.
    pub async fn record_spawned(&self, object: ObjectHandle, pose: Pose) -> bool {
        let selector = self.selection();
        self.records.write().await.push(SpawnedObjectRecord {
            object,
            anchor: None,
            selector,
            persistent: self.config.persist_new_spawns,
            saved_id: None,
        });

        match self.provider.create_anchor(pose).await {
            Ok(anchor) => {
                info!(object = %object, anchor = %anchor.id, "Anchor attached to spawned object");
                let mut records = self.records.write().await;
                if let Some(record) = records.iter_mut().find(|r| r.object == object) {
                    record.anchor = Some(anchor);
                }
                true
            }
            Err(e) => {
                warn!(object = %object, error = %e, "Failed to attach anchor to spawned object");
                false
            }
        }
    }

    /// Save every persistent record's anchor that is not already in the
    /// store.
    ///
    /// Records without an anchor, and provider or flush failures, are
    /// reported and skipped; successful saves land the persistent id on
    /// both the record and the store. No retry.
    pub async fn save_all(&self) -> SessionReport {
        let mut report = SessionReport::new("Saved Persistent Anchors");

        if !self.provider.supports_persistence() {
            warn!(provider = %self.provider.name(), "Anchor persistence not supported");
            report.push(ReportEntry::PersistenceUnsupported);
            return report;
        }

        let candidates = self.records.read().await.clone();
        for record in candidates {
            if !record.persistent {
                continue;
            }
            let label = selector_label(self.spawner.as_ref(), record.selector);

            if let Some(id) = record.saved_id {
                if self.store.contains(id).await {
                    report.push(ReportEntry::AlreadySaved { id, label });
                    continue;
                }
            }
            let Some(anchor) = record.anchor else {
                report.push(ReportEntry::NotAnchored { label });
                continue;
            };

            let id = match self.provider.save_anchor(&anchor).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(object = %record.object, error = %e, "Failed to save anchor");
                    report.push(ReportEntry::SaveFailed {
                        label,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if let Err(e) = self.store.save(id, record.selector).await {
                warn!(id = %id, error = %e, "Failed to record saved anchor");
                report.push(ReportEntry::SaveFailed {
                    label,
                    reason: e.to_string(),
                });
                continue;
            }

            let mut records = self.records.write().await;
            if let Some(live) = records.iter_mut().find(|r| r.object == record.object) {
                live.saved_id = Some(id);
            }
            report.push(ReportEntry::Saved { id, label });
        }

        if report.is_empty() {
            report.push(ReportEntry::NothingToSave);
        }
        report
    }

    /// Load every stored id that does not already have a live record,
    /// spawning an object parented to each loaded anchor.
    ///
    /// Ids with no matching provider anchor are reported and skipped;
    /// partial success is the contract.
    pub async fn load_all(&self) -> SessionReport {
        let mut report = SessionReport::new("Loaded Persistent Anchors");
        let stored = self.store.snapshot().await;

        if stored.is_empty() {
            report.push(ReportEntry::NothingStored);
            return report;
        }

        for (id, selector) in stored {
            if let Some(live) = self
                .records
                .read()
                .await
                .iter()
                .find(|r| r.saved_id == Some(id))
            {
                report.push(ReportEntry::AlreadyLoaded {
                    id,
                    label: selector_label(self.spawner.as_ref(), live.selector),
                });
                continue;
            }

            let anchor = match self.provider.load_anchor(id).await {
                Ok(anchor) => anchor,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to load anchor");
                    report.push(ReportEntry::LoadFailed {
                        id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.spawn_for_selector(selector, &anchor) {
                Ok(object) => {
                    self.records.write().await.push(SpawnedObjectRecord {
                        object,
                        anchor: Some(anchor),
                        selector,
                        persistent: true,
                        saved_id: Some(id),
                    });
                    report.push(ReportEntry::Loaded {
                        id,
                        label: selector_label(self.spawner.as_ref(), selector),
                    });
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to spawn object for loaded anchor");
                    // Don't leave the freshly loaded anchor dangling.
                    if let Err(e) = self.provider.remove_anchor(&anchor).await {
                        warn!(anchor = %anchor.id, error = %e, "Failed to remove unused anchor");
                    }
                    report.push(ReportEntry::LoadFailed {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Erase every stored id from the provider and the store.
    ///
    /// Provider failure leaves the id in the store so deletion stays
    /// retryable. Live objects are not despawned; matching records have
    /// their saved id cleared so a later save can re-save them.
    pub async fn delete_all(&self) -> SessionReport {
        let mut report = SessionReport::new("Deleted Persistent Anchors");
        let stored = self.store.snapshot().await;

        if stored.is_empty() {
            report.push(ReportEntry::NothingStored);
            return report;
        }

        for id in stored.into_keys() {
            if let Err(e) = self.provider.erase_anchor(id).await {
                warn!(id = %id, error = %e, "Failed to erase anchor");
                report.push(ReportEntry::DeleteFailed {
                    id,
                    reason: e.to_string(),
                });
                continue;
            }
            if let Err(e) = self.store.erase(id).await {
                warn!(id = %id, error = %e, "Failed to erase anchor id from store");
                report.push(ReportEntry::DeleteFailed {
                    id,
                    reason: e.to_string(),
                });
                continue;
            }

            let mut records = self.records.write().await;
            for record in records.iter_mut().filter(|r| r.saved_id == Some(id)) {
                record.saved_id = None;
            }
            report.push(ReportEntry::Deleted { id });
        }
        report
    }

    /// Drain every record, removing its anchor and despawning its
    /// object.
    ///
    /// Anchor removal failure is logged and the object is despawned
    /// anyway, so the drain always completes. Persisted ids are
    /// untouched; a later [`load_all`](Self::load_all) restores the
    /// persistent objects. Returns how many objects were despawned.
    pub async fn destroy_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.records.write().await);
        let count = drained.len();

        for record in drained {
            if let Some(anchor) = &record.anchor {
                if let Err(e) = self.provider.remove_anchor(anchor).await {
                    warn!(anchor = %anchor.id, error = %e, "Failed to remove anchor, despawning anyway");
                }
            }
            self.spawner.despawn(record.object);
        }

        info!(count = count, "Spawned objects destroyed");
        count
    }

    fn spawn_for_selector(
        &self,
        selector: PrefabSelector,
        anchor: &AnchorHandle,
    ) -> crate::error::Result<ObjectHandle> {
        let index = match selector {
            PrefabSelector::Prefab(index) => index,
            PrefabSelector::Random => {
                let count = self.spawner.prefab_count();
                if count == 0 {
                    return Err(crate::error::MooringError::spawn("prefab catalog is empty"));
                }
                rand::thread_rng().gen_range(0..count)
            }
        };
        self.spawner.spawn(index, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RegistryBuilder;
    use crate::provider::{AnchorProvider, SimulatedAnchorProvider};
    use crate::spawner::SimulatedSpawner;
    use std::sync::Arc;

    struct Harness {
        registry: SpawnedObjectRegistry,
        provider: Arc<SimulatedAnchorProvider>,
        spawner: Arc<SimulatedSpawner>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        harness_with(|b| b)
    }

    fn harness_with(configure: impl FnOnce(RegistryBuilder) -> RegistryBuilder) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SimulatedAnchorProvider::new());
        let spawner = Arc::new(SimulatedSpawner::new(["cube", "sphere", "cone"]));
        let registry = configure(
            RegistryBuilder::new()
                .with_store_path(dir.path().join("anchors.json"))
                .with_shared_provider(provider.clone())
                .with_shared_spawner(spawner.clone()),
        )
        .build()
        .unwrap();
        Harness {
            registry,
            provider,
            spawner,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_record_spawned_attaches_anchor() {
        let h = harness();
        h.registry.set_selection(PrefabSelector::Prefab(1));

        assert!(
            h.registry
                .record_spawned(ObjectHandle::new(1), Pose::at(0.0, 1.0, 0.0))
                .await
        );

        let records = h.registry.records().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].anchor.is_some());
        assert!(records[0].persistent);
        assert_eq!(records[0].selector, PrefabSelector::Prefab(1));
        assert_eq!(records[0].saved_id, None);
        assert_eq!(h.provider.live_count().await, 1);
    }

    #[tokio::test]
    async fn test_record_spawned_survives_anchor_failure() {
        let h = harness();
        h.provider.set_fail_creates(true);

        assert!(
            !h.registry
                .record_spawned(ObjectHandle::new(1), Pose::identity())
                .await
        );

        let records = h.registry.records().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].anchor.is_none());
    }

    #[tokio::test]
    async fn test_save_all_persists_and_skips_on_resave() {
        let h = harness();
        h.registry.set_selection(PrefabSelector::Prefab(0));
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry
            .record_spawned(ObjectHandle::new(2), Pose::identity())
            .await;

        let report = h.registry.save_all().await;
        assert_eq!(report.saved_count(), 2);
        assert_eq!(report.failure_count(), 0);
        assert_eq!(h.registry.store().len().await, 2);
        assert!(h
            .registry
            .records()
            .await
            .iter()
            .all(|r| r.saved_id.is_some()));

        // A second pass finds everything already in the store.
        let again = h.registry.save_all().await;
        assert_eq!(again.saved_count(), 0);
        assert_eq!(again.entries().len(), 2);
        assert!(again
            .entries()
            .iter()
            .all(|e| matches!(e, ReportEntry::AlreadySaved { .. })));
    }

    #[tokio::test]
    async fn test_save_all_skips_non_persistent_records() {
        let h = harness_with(|b| b.with_persist_new_spawns(false));
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;

        let report = h.registry.save_all().await;
        assert_eq!(report.entries(), &[ReportEntry::NothingToSave]);
        assert!(h.registry.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_save_all_without_persistence_support() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RegistryBuilder::new()
            .with_store_path(dir.path().join("anchors.json"))
            .with_provider(SimulatedAnchorProvider::without_persistence())
            .with_spawner(SimulatedSpawner::new(["cube"]))
            .build()
            .unwrap();
        registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;

        let report = registry.save_all().await;
        assert_eq!(report.entries(), &[ReportEntry::PersistenceUnsupported]);
        assert!(registry.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_save_all_reports_anchorless_and_failed_records() {
        let h = harness();
        h.provider.set_fail_creates(true);
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.provider.set_fail_creates(false);
        h.registry
            .record_spawned(ObjectHandle::new(2), Pose::identity())
            .await;

        h.provider.set_fail_saves(true);
        let report = h.registry.save_all().await;
        assert_eq!(report.saved_count(), 0);
        assert_eq!(report.failure_count(), 1);
        assert!(report
            .entries()
            .iter()
            .any(|e| matches!(e, ReportEntry::NotAnchored { .. })));
        assert!(h.registry.store().is_empty().await);

        // The failure left everything retryable.
        h.provider.set_fail_saves(false);
        assert_eq!(h.registry.save_all().await.saved_count(), 1);
    }

    #[tokio::test]
    async fn test_load_all_restores_destroyed_objects() {
        let h = harness();
        h.registry.set_selection(PrefabSelector::Prefab(2));
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::at(1.0, 0.0, 0.0))
            .await;
        h.registry.save_all().await;

        assert_eq!(h.registry.destroy_all().await, 1);
        assert!(h.registry.records().await.is_empty());

        let report = h.registry.load_all().await;
        assert_eq!(report.loaded_count(), 1);

        let records = h.registry.records().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].persistent);
        assert_eq!(records[0].selector, PrefabSelector::Prefab(2));
        assert!(records[0].saved_id.is_some());
        assert_eq!(h.spawner.live_count(), 1);
    }

    #[tokio::test]
    async fn test_load_all_skips_live_records() {
        let h = harness();
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;

        let report = h.registry.load_all().await;
        assert_eq!(report.loaded_count(), 0);
        assert!(matches!(
            report.entries()[0],
            ReportEntry::AlreadyLoaded { .. }
        ));
        assert_eq!(h.registry.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_all_continues_past_missing_anchors() {
        let h = harness();
        // One id with no provider-side anchor behind it.
        let orphan = AnchorId::random();
        h.registry
            .store()
            .save(orphan, PrefabSelector::Prefab(0))
            .await
            .unwrap();
        // And one real saved anchor.
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;
        h.registry.destroy_all().await;

        let report = h.registry.load_all().await;
        assert_eq!(report.loaded_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(report
            .entries()
            .iter()
            .any(|e| matches!(e, ReportEntry::LoadFailed { id, .. } if *id == orphan)));
    }

    #[tokio::test]
    async fn test_load_all_random_selector_draws_from_catalog() {
        let h = harness();
        h.registry.set_selection(PrefabSelector::Random);
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;
        h.registry.destroy_all().await;

        let report = h.registry.load_all().await;
        assert_eq!(report.loaded_count(), 1);
        // The stored selector stays Random; only the draw is concrete.
        assert_eq!(h.registry.records().await[0].selector, PrefabSelector::Random);
        assert_eq!(h.spawner.live_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_erases_provider_and_store() {
        let h = harness();
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;
        assert_eq!(h.provider.persisted_count().await, 1);

        let report = h.registry.delete_all().await;
        assert_eq!(report.deleted_count(), 1);
        assert!(h.registry.store().is_empty().await);
        assert_eq!(h.provider.persisted_count().await, 0);
        // The live object stays; only its saved id is cleared.
        let records = h.registry.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].saved_id, None);
    }

    #[tokio::test]
    async fn test_delete_all_failure_keeps_id_for_retry() {
        let h = harness();
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;

        h.provider.set_fail_erases(true);
        let report = h.registry.delete_all().await;
        assert_eq!(report.deleted_count(), 0);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(h.registry.store().len().await, 1);

        h.provider.set_fail_erases(false);
        assert_eq!(h.registry.delete_all().await.deleted_count(), 1);
        assert!(h.registry.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_deleted_records_can_be_saved_again() {
        let h = harness();
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry.save_all().await;
        h.registry.delete_all().await;

        let report = h.registry.save_all().await;
        assert_eq!(report.saved_count(), 1);
        assert_eq!(h.registry.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_destroy_all_despawns_despite_remove_failure() {
        let h = harness();
        h.registry
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        h.registry
            .record_spawned(ObjectHandle::new(2), Pose::identity())
            .await;

        // Pull the first anchor out from under the registry so the
        // provider's remove call fails for it.
        let anchor = h.registry.records().await[0].anchor.unwrap();
        h.provider.remove_anchor(&anchor).await.unwrap();

        assert_eq!(h.registry.destroy_all().await, 2);
        assert!(h.registry.records().await.is_empty());
        assert_eq!(h.provider.live_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_lists_saved_contents() {
        let h = harness();
        h.registry
            .store()
            .save(AnchorId::new(1, 2), PrefabSelector::Prefab(1))
            .await
            .unwrap();

        let report = h.registry.start().await;
        assert_eq!(report.title(), "Currently Saved Objects");
        assert!(matches!(
            report.entries()[0],
            ReportEntry::Stored { .. }
        ));
        // Listing spawns nothing.
        assert!(h.registry.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_start_with_load_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SimulatedAnchorProvider::new());
        let spawner = Arc::new(SimulatedSpawner::new(["cube"]));

        // Session one saves an anchor.
        let first = RegistryBuilder::new()
            .with_store_path(dir.path().join("anchors.json"))
            .with_shared_provider(provider.clone())
            .with_shared_spawner(spawner.clone())
            .build()
            .unwrap();
        first
            .record_spawned(ObjectHandle::new(1), Pose::identity())
            .await;
        first.save_all().await;
        first.destroy_all().await;
        drop(first);

        // Session two restores it on start.
        let second = RegistryBuilder::new()
            .with_store_path(dir.path().join("anchors.json"))
            .with_shared_provider(provider)
            .with_shared_spawner(spawner)
            .with_load_on_start(true)
            .build()
            .unwrap();
        let report = second.start().await;
        assert_eq!(report.title(), "Loaded Persistent Anchors");
        assert_eq!(report.loaded_count(), 1);
        assert_eq!(second.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_start_with_empty_store() {
        let h = harness();
        let report = h.registry.start().await;
        assert_eq!(report.entries(), &[ReportEntry::NothingStored]);
    }

    #[tokio::test]
    async fn test_selection_default_is_random() {
        let h = harness();
        assert_eq!(h.registry.selection(), PrefabSelector::Random);
        h.registry.set_selection(PrefabSelector::Prefab(2));
        assert_eq!(h.registry.selection(), PrefabSelector::Prefab(2));
    }
}
