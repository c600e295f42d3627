//! In-memory version store for driving the graph builder in tests.

use rustc_hash::{FxHashMap, FxHashSet};

use super::VersionStore;
use crate::error::{DepdyError, Result};

/// Map-backed store keyed by (revision, path).
#[derive(Debug, Default)]
pub struct MemoryStore {
    revisions: FxHashSet<String>,
    objects: FxHashMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` as the content of `path` at `revision`.
    pub fn insert(
        &mut self,
        revision: impl Into<String>,
        path: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) {
        let revision = revision.into();
        self.revisions.insert(revision.clone());
        self.objects.insert((revision, path.into()), bytes.into());
    }
}

impl VersionStore for MemoryStore {
    fn resolve(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        if !self.revisions.contains(revision) {
            return Err(DepdyError::RevisionNotFound {
                revision: revision.to_string(),
            });
        }
        self.objects
            .get(&(revision.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| DepdyError::PathNotFound {
                path: path.to_string(),
                revision: revision.to_string(),
            })
    }
}
