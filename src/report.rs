//! User-visible outcomes of bulk registry operations
//!
//! ## Table of Contents
//! - **ReportEntry**: One per-anchor outcome line
//! - **SessionReport**: Ordered entries from one bulk operation
//!
//! The registry never aborts a bulk operation on the first bad anchor;
//! it collects one entry per outcome. Each entry renders to the line a
//! session UI would show the user, and the counts give tests and
//! callers a quick summary.

use std::fmt;

use serde::Serialize;

use crate::types::AnchorId;

/// One per-anchor outcome from a bulk operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportEntry {
    /// A persistent anchor was saved and recorded in the store
    Saved {
        /// Persistent id the anchor was stored under
        id: AnchorId,
        /// Display label of the spawned object
        label: String,
    },
    /// The record's anchor was already present in the store
    AlreadySaved {
        /// Persistent id already stored
        id: AnchorId,
        /// Display label of the spawned object
        label: String,
    },
    /// The provider or store refused the save for this record
    SaveFailed {
        /// Display label of the spawned object
        label: String,
        /// What went wrong
        reason: String,
    },
    /// A persistent record has no anchor handle to save
    NotAnchored {
        /// Display label of the spawned object
        label: String,
    },
    /// A stored id was loaded and its object spawned
    Loaded {
        /// Persistent id that was loaded
        id: AnchorId,
        /// Display label of the spawned object
        label: String,
    },
    /// A stored id already has a live object
    AlreadyLoaded {
        /// Persistent id that was skipped
        id: AnchorId,
        /// Display label of the live object
        label: String,
    },
    /// The provider or spawner refused the load for this id
    LoadFailed {
        /// Persistent id that failed to load
        id: AnchorId,
        /// What went wrong
        reason: String,
    },
    /// A stored id was erased from the provider and the store
    Deleted {
        /// Persistent id that was erased
        id: AnchorId,
    },
    /// The provider or store refused the delete for this id
    DeleteFailed {
        /// Persistent id left in the store for retry
        id: AnchorId,
        /// What went wrong
        reason: String,
    },
    /// One stored id, listed without touching it
    Stored {
        /// Persistent id in the store
        id: AnchorId,
        /// Display label its selector resolves to
        label: String,
    },
    /// The provider cannot persist anchors on this device
    PersistenceUnsupported,
    /// The store held nothing to act on
    NothingStored,
    /// No live record was a candidate for saving
    NothingToSave,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved { id, label } => write!(f, "Saved object {label}, anchor id [{id}]"),
            Self::AlreadySaved { id, label } => {
                write!(f, "Object {label} already saved, anchor id [{id}]")
            }
            Self::SaveFailed { label, reason } => write!(f, "Failed to save {label}: {reason}"),
            Self::NotAnchored { label } => write!(f, "Object {label} has no anchor to save"),
            Self::Loaded { id, label } => write!(f, "Loaded object {label}, anchor id [{id}]"),
            Self::AlreadyLoaded { id, label } => {
                write!(f, "Object {label} is already loaded, anchor id [{id}]")
            }
            Self::LoadFailed { id, reason } => {
                write!(f, "Failed to load anchor id [{id}]: {reason}")
            }
            Self::Deleted { id } => write!(f, "Deleted anchor id [{id}]"),
            Self::DeleteFailed { id, reason } => {
                write!(f, "Failed to delete anchor id [{id}]: {reason}")
            }
            Self::Stored { id, label } => write!(f, "Anchor id [{id}], object {label}"),
            Self::PersistenceUnsupported => {
                write!(f, "Save anchor is not supported on this device")
            }
            Self::NothingStored => write!(f, "No anchors stored"),
            Self::NothingToSave => write!(f, "No anchors to save"),
        }
    }
}

/// Ordered outcomes of one bulk registry operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    title: &'static str,
    entries: Vec<ReportEntry>,
}

impl SessionReport {
    pub(crate) fn new(title: &'static str) -> Self {
        Self {
            title,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Which operation produced the report
    pub fn title(&self) -> &str {
        self.title
    }

    /// The outcome entries, in operation order
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Whether the operation produced no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Anchors newly saved to the store
    pub fn saved_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::Saved { .. }))
    }

    /// Objects spawned from stored ids
    pub fn loaded_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::Loaded { .. }))
    }

    /// Ids erased from provider and store
    pub fn deleted_count(&self) -> usize {
        self.count(|e| matches!(e, ReportEntry::Deleted { .. }))
    }

    /// Per-anchor failures of any kind
    pub fn failure_count(&self) -> usize {
        self.count(|e| {
            matches!(
                e,
                ReportEntry::SaveFailed { .. }
                    | ReportEntry::LoadFailed { .. }
                    | ReportEntry::DeleteFailed { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&ReportEntry) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(e)).count()
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- {} -", self.title)?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_display_lines() {
        let id = AnchorId::new(1, 2);
        assert_eq!(
            ReportEntry::Saved {
                id,
                label: "cube".into()
            }
            .to_string(),
            "Saved object cube, anchor id [0000000000000001-0000000000000002]"
        );
        assert_eq!(
            ReportEntry::DeleteFailed {
                id,
                reason: "provider error: offline".into()
            }
            .to_string(),
            "Failed to delete anchor id [0000000000000001-0000000000000002]: provider error: offline"
        );
        assert_eq!(
            ReportEntry::PersistenceUnsupported.to_string(),
            "Save anchor is not supported on this device"
        );
    }

    #[test]
    fn test_report_counts_and_render() {
        let mut report = SessionReport::new("Saved Persistent Anchors");
        report.push(ReportEntry::Saved {
            id: AnchorId::new(1, 0),
            label: "cube".into(),
        });
        report.push(ReportEntry::SaveFailed {
            label: "sphere".into(),
            reason: "simulated save failure".into(),
        });
        report.push(ReportEntry::NotAnchored {
            label: "cone".into(),
        });

        assert_eq!(report.saved_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.loaded_count(), 0);
        assert!(!report.is_empty());

        let rendered = report.to_string();
        assert!(rendered.starts_with("- Saved Persistent Anchors -\n"));
        assert_eq!(rendered.lines().count(), 4);
    }
}
