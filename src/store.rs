//! JSON-file-backed anchor persistence
//!
//! ## Table of Contents
//! - **AnchorStore**: mapping from anchor id to prefab selector, flushed
//!   to one JSON file after every mutation

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{MooringError, Result};
use crate::types::{AnchorId, PrefabSelector};

/// Mapping from persisted anchor ids to prefab selectors, backed by a
/// JSON file on disk.
///
/// The backing file holds a single JSON object: keys are canonical anchor
/// id strings, values the signed selector integers. The file is read
/// lazily on the first operation; a missing or unparsable file degrades
/// to an empty mapping without surfacing an error. Every mutation
/// rewrites the whole file through a temp-file-then-rename, so a crash
/// mid-write never leaves a torn store behind.
///
/// All operations serialize on one internal mutex. Concurrent callers are
/// safe, and the initial load runs exactly once: callers that arrive
/// while it is in flight suspend and observe the completed result.
pub struct AnchorStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    initialized: bool,
    entries: HashMap<AnchorId, PrefabSelector>,
}

impl AnchorStore {
    /// Create a store backed by the given file.
    ///
    /// No I/O happens here; the file is read on first use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drive the initial load to completion.
    ///
    /// Safe to call any number of times from any number of tasks. Load
    /// failures are logged and swallowed, leaving the store empty; this
    /// never fails.
    pub async fn load(&self) {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
    }

    /// Insert or update the selector for an anchor id, then flush.
    pub async fn save(&self, id: AnchorId, selector: PrefabSelector) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.entries.insert(id, selector);
        self.flush(&state.entries).await?;
        debug!(id = %id, selector = %selector, "Anchor id saved");
        Ok(())
    }

    /// Remove an anchor id if present, then flush.
    ///
    /// Erasing an id that was never saved is a pure no-op: the mapping is
    /// untouched and the backing file is not rewritten (or created).
    /// Returns whether an entry was removed.
    pub async fn erase(&self, id: AnchorId) -> Result<bool> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        if state.entries.remove(&id).is_none() {
            return Ok(false);
        }
        self.flush(&state.entries).await?;
        debug!(id = %id, "Anchor id erased");
        Ok(true)
    }

    /// Copy of the current mapping.
    ///
    /// Suspends until the initial load has completed if called early.
    pub async fn snapshot(&self) -> HashMap<AnchorId, PrefabSelector> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.entries.clone()
    }

    /// Selector stored for an id, if any
    pub async fn get(&self, id: AnchorId) -> Option<PrefabSelector> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.entries.get(&id).copied()
    }

    /// Whether an id is stored
    pub async fn contains(&self, id: AnchorId) -> bool {
        self.get(id).await.is_some()
    }

    /// Number of stored ids
    pub async fn len(&self) -> usize {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.entries.len()
    }

    /// Whether no ids are stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn ensure_loaded(&self, state: &mut StoreState) {
        if state.initialized {
            return;
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => {
                    state.entries = entries;
                    info!(
                        path = %self.path.display(),
                        count = state.entries.len(),
                        "Anchor store loaded"
                    );
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Anchor store file unparsable, starting empty"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No anchor store file yet, starting empty");
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read anchor store, starting empty"
                );
            }
        }

        state.initialized = true;
    }

    /// Rewrite the backing file from the full mapping.
    ///
    /// Writes beside the target and renames over it, so readers never
    /// observe a partially written store.
    async fn flush(&self, entries: &HashMap<AnchorId, PrefabSelector>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    MooringError::store(format!("failed to create store directory: {}", e))
                })?;
            }
        }

        let tmp = self.tmp_path()?;
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| MooringError::store(format!("failed to write store: {}", e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MooringError::store(format!("failed to commit store: {}", e)))?;

        debug!(path = %self.path.display(), count = entries.len(), "Anchor store flushed");
        Ok(())
    }

    fn tmp_path(&self) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| MooringError::store("store path has no file name"))?;
        let mut tmp_name = name.to_os_string();
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }
}
