//! Repository façade - one handle over the scan results and the object
//! store of a checked-out repository.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::ast::{ActionRecord, WorkflowRecord};
use crate::error::Result;
use crate::graph::{GraphBuild, GraphBuilder, Warning};
use crate::scan::{scan, ScanOutcome};
use crate::store::GitStore;

/// A scanned repository, ready to build dependency graphs.
pub struct Repository {
    root: PathBuf,
    outcome: ScanOutcome,
    store: Option<GitStore>,
}

impl Repository {
    /// Scan `root` and open its git object store. A missing git repository
    /// is not fatal: historical lookups then degrade to `Unresolved`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let outcome = scan(&root)?;
        let store = match GitStore::open(&root) {
            Ok(store) => Some(store),
            Err(err) => {
                debug!(root = %root.display(), error = %err, "no git object store");
                None
            }
        };
        Ok(Self {
            root,
            outcome,
            store,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workflows(&self) -> &[WorkflowRecord] {
        &self.outcome.workflows
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.outcome.actions
    }

    pub fn scan_warnings(&self) -> &[Warning] {
        &self.outcome.warnings
    }

    /// Build the dependency graph from the scanned records. The returned
    /// warning list starts with the scan-phase warnings so callers see one
    /// consolidated report.
    pub fn build_graph(&self, deadline: Option<Duration>) -> Result<GraphBuild> {
        let mut builder = GraphBuilder::new();
        if let Some(store) = &self.store {
            builder = builder.with_store(store);
        }
        if let Some(deadline) = deadline {
            builder = builder.with_deadline(Instant::now() + deadline);
        }
        let mut build = builder.build(&self.outcome.workflows, &self.outcome.actions)?;
        let mut warnings = self.outcome.warnings.clone();
        warnings.append(&mut build.warnings);
        build.warnings = warnings;
        Ok(build)
    }
}
