//! Graph builder - turns parsed records into nodes and resolved edges.
//!
//! Resolution policy for every `uses:` occurrence, in order:
//! 1. identity-key match against the already-known node set (local-path
//!    references match through a path index over record source paths),
//! 2. versioned references fetch the action manifest at that revision from
//!    the version store, parse it and insert it as a new node,
//! 3. anything else degrades to an `Unresolved` edge plus a warning.
//!
//! Fetched composite actions are queued on an explicit work-list guarded by
//! a visited set of identity keys, so circular `uses` chains terminate and
//! a repeated reference is resolved at most once. Only a duplicate identity
//! in the local set aborts the build.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use camino::Utf8Path;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use super::{DependencyGraph, Edge, EdgeOrigin, EdgeTarget, Node, NodeKind};
use crate::ast::{self, ActionRecord, Metadata, UsesSite, WorkflowRecord};
use crate::error::{DepdyError, Result};
use crate::reference::{RefKind, UsesRef};
use crate::store::VersionStore;

/// A non-fatal problem collected during scanning or building.
#[derive(Debug, Clone)]
pub struct Warning {
    pub context: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

/// A finished build: always a graph, plus everything that degraded along
/// the way. An empty warning list means a clean graph.
#[derive(Debug)]
pub struct GraphBuild {
    pub graph: DependencyGraph,
    pub warnings: Vec<Warning>,
}

/// One `uses:` occurrence waiting for resolution, detached from the
/// document that produced it.
struct PendingRef {
    origin: EdgeOrigin,
    uses: String,
}

fn detach(sites: Vec<UsesSite<'_>>) -> Vec<PendingRef> {
    sites
        .into_iter()
        .map(|site| PendingRef {
            origin: EdgeOrigin {
                job: site.job.map(str::to_string),
                step: site.step,
                step_id: site.step_id.map(str::to_string),
            },
            uses: site.uses.to_string(),
        })
        .collect()
}

pub struct GraphBuilder<'a> {
    store: Option<&'a dyn VersionStore>,
    deadline: Option<Instant>,
}

impl Default for GraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> GraphBuilder<'a> {
    pub fn new() -> Self {
        Self {
            store: None,
            deadline: None,
        }
    }

    /// Attach a version store for historical lookups. Without one, every
    /// versioned out-of-set reference degrades to `Unresolved`.
    pub fn with_store(mut self, store: &'a dyn VersionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Store lookups past this instant degrade to `Unresolved` instead of
    /// delaying the build further.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the graph from the local record set.
    ///
    /// Fails only on a structural problem in the local set itself
    /// (duplicate identities); individual bad references are recorded as
    /// `Unresolved` edges.
    pub fn build(
        &self,
        workflows: &[WorkflowRecord],
        actions: &[ActionRecord],
    ) -> Result<GraphBuild> {
        let mut graph = DependencyGraph::new();
        let mut warnings = Vec::new();
        let mut path_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut worklist: VecDeque<(usize, Vec<PendingRef>)> = VecDeque::new();

        for record in workflows {
            let idx = graph.insert_node(Node {
                meta: record.meta.clone(),
                kind: NodeKind::Workflow,
                source: Some(record.path.clone()),
            })?;
            index_source_path(&mut path_index, &record.path, idx);
            visited.insert(record.meta.key());
            worklist.push_back((idx, detach(record.doc.uses_sites())));
        }
        for record in actions {
            let idx = graph.insert_node(Node {
                meta: record.meta.clone(),
                kind: NodeKind::Action,
                source: Some(record.path.clone()),
            })?;
            index_source_path(&mut path_index, &record.path, idx);
            visited.insert(record.meta.key());
            worklist.push_back((idx, detach(record.doc.uses_sites())));
        }

        while let Some((from, refs)) = worklist.pop_front() {
            for pending in refs {
                self.resolve_reference(
                    from,
                    pending,
                    &mut graph,
                    &path_index,
                    &mut visited,
                    &mut worklist,
                    &mut warnings,
                );
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            warnings = warnings.len(),
            "graph build finished"
        );
        Ok(GraphBuild { graph, warnings })
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_reference(
        &self,
        from: usize,
        pending: PendingRef,
        graph: &mut DependencyGraph,
        path_index: &FxHashMap<String, usize>,
        visited: &mut FxHashSet<String>,
        worklist: &mut VecDeque<(usize, Vec<PendingRef>)>,
        warnings: &mut Vec<Warning>,
    ) {
        let PendingRef { origin, uses } = pending;

        let parsed = match UsesRef::parse(&uses) {
            Ok(parsed) => parsed,
            Err(err) => {
                record_unresolved(graph, warnings, from, origin, uses, err.to_string());
                return;
            }
        };

        // (a) identity match against everything already in the graph
        if let Some(idx) = graph.node_index(&parsed.identity().key()) {
            graph.push_edge(Edge {
                from,
                target: EdgeTarget::Bound(idx),
                origin,
            });
            return;
        }

        match parsed.kind {
            RefKind::LocalPath => match path_index.get(parsed.path.as_str()) {
                Some(&idx) => graph.push_edge(Edge {
                    from,
                    target: EdgeTarget::Bound(idx),
                    origin,
                }),
                None => record_unresolved(
                    graph,
                    warnings,
                    from,
                    origin,
                    uses,
                    format!("local path '{}' not found in scan", parsed.path),
                ),
            },
            RefKind::Docker => record_unresolved(
                graph,
                warnings,
                from,
                origin,
                uses,
                "external docker image".to_string(),
            ),
            RefKind::Repository => {
                let Some(version) = parsed.version.clone() else {
                    record_unresolved(
                        graph,
                        warnings,
                        from,
                        origin,
                        uses,
                        "unversioned reference not present in the working tree".to_string(),
                    );
                    return;
                };
                let Some(store) = self.store else {
                    record_unresolved(
                        graph,
                        warnings,
                        from,
                        origin,
                        uses,
                        "no version store available".to_string(),
                    );
                    return;
                };
                if self.deadline_exceeded() {
                    record_unresolved(
                        graph,
                        warnings,
                        from,
                        origin,
                        uses,
                        DepdyError::LookupDeadlineExceeded.to_string(),
                    );
                    return;
                }

                let fetched = fetch_manifest(store, &parsed, &version)
                    .and_then(|bytes| ast::parse_action(&parsed.raw, &bytes));
                match fetched {
                    Ok(doc) => {
                        let meta = Metadata::new(parsed.full_path(), version);
                        let inserted = graph.insert_node(Node {
                            meta: meta.clone(),
                            kind: NodeKind::Action,
                            source: None,
                        });
                        match inserted {
                            Ok(idx) => {
                                graph.push_edge(Edge {
                                    from,
                                    target: EdgeTarget::Bound(idx),
                                    origin,
                                });
                                // Resolve the fetched action's own steps at
                                // most once, cycles included.
                                if visited.insert(meta.key()) {
                                    worklist.push_back((idx, detach(doc.uses_sites())));
                                }
                            }
                            Err(err) => record_unresolved(
                                graph,
                                warnings,
                                from,
                                origin,
                                uses,
                                err.to_string(),
                            ),
                        }
                    }
                    Err(err) => {
                        record_unresolved(graph, warnings, from, origin, uses, err.to_string())
                    }
                }
            }
        }
    }

    fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Index a record's source path so local-path references can bind to it.
/// Action manifests are also reachable through their directory
/// (`uses: ./actions/build` names the directory holding `action.yml`).
fn index_source_path(index: &mut FxHashMap<String, usize>, path: &Utf8Path, idx: usize) {
    index.insert(path.as_str().to_string(), idx);
    if path.file_stem() == Some("action") {
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                index.insert(parent.as_str().to_string(), idx);
            }
        }
    }
}

fn record_unresolved(
    graph: &mut DependencyGraph,
    warnings: &mut Vec<Warning>,
    from: usize,
    origin: EdgeOrigin,
    reference: String,
    reason: String,
) {
    let context = graph
        .node(from)
        .map(|node| format!("{} ({origin})", node.meta.key()))
        .unwrap_or_else(|| origin.to_string());
    warn!(reference = %reference, reason = %reason, context = %context, "unresolved reference");
    warnings.push(Warning {
        context,
        message: format!("unresolved '{reference}': {reason}"),
    });
    graph.push_edge(Edge {
        from,
        target: EdgeTarget::Unresolved { reference, reason },
        origin,
    });
}

/// Fetch an action manifest at `version`, trying the reference's candidate
/// paths in order. An unknown revision short-circuits; an unknown path
/// falls through to the next candidate.
fn fetch_manifest(store: &dyn VersionStore, reference: &UsesRef, version: &str) -> Result<Vec<u8>> {
    let mut last_err = DepdyError::PathNotFound {
        path: reference.full_path(),
        revision: version.to_string(),
    };
    for candidate in reference.manifest_candidates() {
        match store.resolve(version, &candidate) {
            Ok(bytes) => return Ok(bytes),
            Err(err @ DepdyError::RevisionNotFound { .. }) => return Err(err),
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}
