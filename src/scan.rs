//! Scanner - discovers and parses pipeline YAML across a directory tree.
//!
//! Discovery matches the case-insensitive YAML extension family and skips
//! the version-control object database entirely. Classify+parse runs on the
//! walker's worker threads (each file is independent); results and per-file
//! failures funnel through a channel into one final merge, so a bad file
//! never aborts the scan.

use std::path::Path;
use std::sync::mpsc;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::{WalkBuilder, WalkState};
use tracing::{debug, warn};

use crate::ast::{self, ActionRecord, DocumentKind, Metadata, WorkflowRecord};
use crate::error::{DepdyError, Result};
use crate::graph::Warning;

/// Everything a scan produced: parsed records plus per-file failures.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub workflows: Vec<WorkflowRecord>,
    pub actions: Vec<ActionRecord>,
    pub warnings: Vec<Warning>,
}

enum ScanMessage {
    Workflow(WorkflowRecord),
    Action(ActionRecord),
    Warning(Warning),
}

fn yaml_matcher() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["*.yml", "*.yaml"] {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

/// Walk `root`, classify and parse every YAML file, and collect the local
/// record set. Records come back sorted by source path so downstream graph
/// output is stable regardless of walk order.
pub fn scan(root: impl AsRef<Path>) -> Result<ScanOutcome> {
    let root = root.as_ref();
    let matcher = yaml_matcher()?;
    let (tx, rx) = mpsc::channel::<ScanMessage>();

    debug!(root = %root.display(), "scanning for pipeline definitions");

    // Hidden files stay visible (workflows live under .github/); only the
    // object database itself is skipped.
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .filter_entry(|entry| entry.file_name() != std::ffi::OsStr::new(".git"))
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        let matcher = matcher.clone();
        let root = root.to_path_buf();
        Box::new(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let _ = tx.send(ScanMessage::Warning(Warning {
                        context: "scan".to_string(),
                        message: err.to_string(),
                    }));
                    return WalkState::Continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                return WalkState::Continue;
            }
            if !matcher.is_match(entry.file_name()) {
                return WalkState::Continue;
            }
            let message = match process_file(&root, entry.path()) {
                Ok(message) => message,
                Err(err) => ScanMessage::Warning(Warning {
                    context: entry.path().display().to_string(),
                    message: err.to_string(),
                }),
            };
            let _ = tx.send(message);
            WalkState::Continue
        })
    });
    drop(tx);

    let mut outcome = ScanOutcome::default();
    for message in rx {
        match message {
            ScanMessage::Workflow(record) => outcome.workflows.push(record),
            ScanMessage::Action(record) => outcome.actions.push(record),
            ScanMessage::Warning(warning) => {
                warn!(warning = %warning, "skipping file");
                outcome.warnings.push(warning);
            }
        }
    }
    outcome.workflows.sort_by(|a, b| a.path.cmp(&b.path));
    outcome.actions.sort_by(|a, b| a.path.cmp(&b.path));
    outcome.warnings.sort_by(|a, b| a.context.cmp(&b.context));

    debug!(
        workflows = outcome.workflows.len(),
        actions = outcome.actions.len(),
        warnings = outcome.warnings.len(),
        "scan finished"
    );
    Ok(outcome)
}

fn process_file(root: &Path, path: &Path) -> Result<ScanMessage> {
    let bytes = std::fs::read(path)?;
    let relative = path.strip_prefix(root).unwrap_or(path);
    let file = relative.display().to_string();
    let path = Utf8PathBuf::from_path_buf(relative.to_path_buf()).map_err(|p| {
        DepdyError::ParseError {
            file: p.display().to_string(),
            details: "non-UTF-8 path".to_string(),
        }
    })?;

    match ast::classify(&file, &bytes)? {
        DocumentKind::Workflow => {
            let doc = ast::parse_workflow(&file, &bytes)?;
            let name = doc
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| fallback_workflow_name(&path));
            Ok(ScanMessage::Workflow(WorkflowRecord {
                meta: Metadata::local(name),
                path,
                doc,
            }))
        }
        DocumentKind::Action => {
            let doc = ast::parse_action(&file, &bytes)?;
            let name = doc
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| fallback_action_name(&path));
            Ok(ScanMessage::Action(ActionRecord {
                meta: Metadata::local(name),
                path,
                doc,
            }))
        }
    }
}

/// Workflows without a `name:` take the file stem, like the Actions UI.
fn fallback_workflow_name(path: &Utf8Path) -> String {
    path.file_stem().unwrap_or("workflow").to_string()
}

/// An `action.yml` without a `name:` takes the directory that holds it.
fn fallback_action_name(path: &Utf8Path) -> String {
    path.parent()
        .and_then(Utf8Path::file_name)
        .or_else(|| path.file_stem())
        .unwrap_or("action")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    const CI_WORKFLOW: &str = r#"
name: CI
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: ./actions/build
      - run: cargo test
"#;

    const BUILD_ACTION: &str = r#"
name: build
description: Build the project
runs:
  using: composite
  steps:
    - run: cargo build
      shell: bash
"#;

    #[test]
    fn test_scan_collects_workflows_and_actions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".github/workflows/ci.yml", CI_WORKFLOW);
        write(dir.path(), "actions/build/action.yml", BUILD_ACTION);
        write(dir.path(), "README.md", "# not yaml");

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.workflows.len(), 1);
        assert_eq!(outcome.actions.len(), 1);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.workflows[0].meta.name, "CI");
        assert_eq!(outcome.actions[0].meta.key(), "build_");
    }

    #[test]
    fn test_scan_skips_the_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".github/workflows/ci.yml", CI_WORKFLOW);
        write(dir.path(), ".git/leftover.yml", "jobs: {}\n");

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.workflows.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_scan_matches_uppercase_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "DEPLOY.YAML", CI_WORKFLOW);
        write(dir.path(), "release.YML", CI_WORKFLOW);

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.workflows.len(), 2);
    }

    #[test]
    fn test_bad_file_becomes_warning_not_failure() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".github/workflows/ci.yml", CI_WORKFLOW);
        write(dir.path(), ".github/workflows/broken.yml", "jobs: [unclosed");
        write(dir.path(), "docker-compose.yml", "services:\n  db:\n    image: postgres\n");

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.workflows.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn test_workflow_name_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ".github/workflows/nightly.yml",
            "on: schedule\njobs: {}\n",
        );

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.workflows[0].meta.name, "nightly");
    }

    #[test]
    fn test_action_name_falls_back_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "actions/greet/action.yml",
            "description: hi\nruns:\n  using: composite\n  steps: []\n",
        );

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.actions[0].meta.name, "greet");
    }

    #[test]
    fn test_record_paths_are_repo_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "z/action.yml", BUILD_ACTION.replace("build", "zeta").as_str());
        write(dir.path(), "a/action.yml", BUILD_ACTION.replace("build", "alpha").as_str());

        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.actions[0].path.as_str(), "a/action.yml");
        assert_eq!(outcome.actions[1].path.as_str(), "z/action.yml");
    }
}
