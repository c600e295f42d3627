//! DOT serialization of the dependency graph.
//!
//! The rendering backend proper is an external collaborator; this module
//! only emits the deterministic text form it consumes. Node and edge lines
//! follow arena insertion order.

use std::fmt::Write as _;

use super::{DependencyGraph, EdgeTarget, NodeKind};

impl DependencyGraph {
    /// Serialize the graph as a DOT digraph. Workflows render as boxes,
    /// actions as ellipses; unresolved edges are dashed and point at the
    /// raw reference text.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph dependencies {\n");
        for node in self.nodes() {
            let shape = match node.kind {
                NodeKind::Workflow => "box",
                NodeKind::Action => "ellipse",
            };
            let _ = writeln!(out, "    {:?} [shape={shape}];", node.meta.key());
        }
        for edge in self.edges() {
            let from = match self.node(edge.from) {
                Some(node) => node.meta.key(),
                None => continue,
            };
            let label = edge.origin.to_string();
            match &edge.target {
                EdgeTarget::Bound(to) => {
                    if let Some(target) = self.node(*to) {
                        let _ = writeln!(
                            out,
                            "    {:?} -> {:?} [label={:?}];",
                            from,
                            target.meta.key(),
                            label
                        );
                    }
                }
                EdgeTarget::Unresolved { reference, .. } => {
                    let _ = writeln!(
                        out,
                        "    {from:?} -> {reference:?} [style=dashed, label={label:?}];"
                    );
                }
            }
        }
        out.push_str("}\n");
        out
    }
}
