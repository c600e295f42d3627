//! AST Module - typed records parsed from CI pipeline YAML
//!
//! Contains the document model for the two kinds of pipeline definition:
//! - `workflow`: WorkflowDoc, Job, Trigger and the workflow-level unions
//! - `action`: ActionDoc, Runs (node / docker / composite)
//! - `step`: Step, shared by jobs and composite actions
//! - `classify`: document-kind probe run before the typed parse
//!
//! These types represent the "what" - static structure parsed from YAML.
//! Edge resolution lives in the `graph` module.

mod action;
mod classify;
mod step;
mod workflow;

pub use action::{ActionDoc, ActionInput, ActionOutput, Branding, Runs};
pub use classify::{classify, DocumentKind};
pub use step::{BoolOrExpr, NumberOrExpr, Step};
pub use workflow::{
    Concurrency, Container, ContainerSpec, Defaults, EnvMap, Environment, Job, OneOrMany,
    Permissions, RunDefaults, RunsOn, Strategy, Trigger, WorkflowDoc,
};

use camino::Utf8PathBuf;

use crate::error::{DepdyError, Result};

/// Identity of a graph component: name plus version.
///
/// Two components with the same name but different versions are distinct
/// nodes. The name is never empty; an empty version means unversioned/local.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Metadata {
    pub name: String,
    pub version: String,
}

impl Metadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// An unversioned component from the current working tree.
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    /// Identity key used to index graph nodes.
    pub fn key(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }
}

/// A workflow definition tied to its identity and source path.
#[derive(Debug)]
pub struct WorkflowRecord {
    pub meta: Metadata,
    pub path: Utf8PathBuf,
    pub doc: WorkflowDoc,
}

/// An action manifest tied to its identity and source path.
#[derive(Debug)]
pub struct ActionRecord {
    pub meta: Metadata,
    pub path: Utf8PathBuf,
    pub doc: ActionDoc,
}

/// One `uses:` occurrence inside a document, with enough context for
/// edge diagnostics. `job` is `None` for composite-action steps; `step`
/// is `None` for job-level reusable-workflow calls.
#[derive(Debug, Clone, Copy)]
pub struct UsesSite<'a> {
    pub job: Option<&'a str>,
    pub step: Option<usize>,
    pub step_id: Option<&'a str>,
    pub uses: &'a str,
}

/// Parse workflow bytes into a typed document.
///
/// The error carries the file identity; serde_yaml's message includes the
/// offending field path.
pub fn parse_workflow(file: &str, bytes: &[u8]) -> Result<WorkflowDoc> {
    serde_yaml::from_slice(bytes).map_err(|e| DepdyError::ParseError {
        file: file.to_string(),
        details: e.to_string(),
    })
}

/// Parse action manifest bytes into a typed document.
pub fn parse_action(file: &str, bytes: &[u8]) -> Result<ActionDoc> {
    serde_yaml::from_slice(bytes).map_err(|e| DepdyError::ParseError {
        file: file.to_string(),
        details: e.to_string(),
    })
}
