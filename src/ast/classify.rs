//! Document classifier - decides whether a YAML file is a workflow or an
//! action manifest before the strict typed parse runs.

use rustc_hash::FxHashMap;
use serde_yaml::Value;

use crate::error::{DepdyError, Result};

/// The two document kinds the graph cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Workflow,
    Action,
}

/// Classify a YAML document by its discriminating top-level key.
///
/// A `jobs` mapping makes it a workflow; otherwise a `runs` block makes it
/// an action manifest. The decoded mapping is dropped after the decision -
/// the typed parse redecodes from the same bytes. Malformed YAML is a parse
/// error, a document with neither key is a classification error.
pub fn classify(file: &str, bytes: &[u8]) -> Result<DocumentKind> {
    let doc: FxHashMap<String, Value> =
        serde_yaml::from_slice(bytes).map_err(|e| DepdyError::ParseError {
            file: file.to_string(),
            details: e.to_string(),
        })?;

    if doc.contains_key("jobs") {
        return Ok(DocumentKind::Workflow);
    }
    if doc.contains_key("runs") {
        return Ok(DocumentKind::Action);
    }

    Err(DepdyError::UnknownDocumentKind {
        file: file.to_string(),
    })
}
