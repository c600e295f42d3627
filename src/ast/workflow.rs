//! Workflow document schema - triggers, jobs and the workflow-level unions.
//!
//! Several fields in the public schema are legitimately polymorphic
//! (`on:` is a single event name, an array of names, or a per-event config
//! map; `concurrency` is a bare group string or a structured policy; ...).
//! Each such field is a tagged union decoded by trial, and the variant
//! declaration order IS the trial order: structured object first, then
//! array, then scalar.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_yaml::Value;

use super::step::{BoolOrExpr, NumberOrExpr, Step};
use super::UsesSite;

/// The `on:` trigger field. Tried in order: per-event config map, event
/// array, single event name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    Events(IndexMap<String, Value>),
    List(Vec<String>),
    Event(String),
}

impl Trigger {
    /// Flatten any of the three shapes into the list of event names.
    pub fn event_names(&self) -> Vec<&str> {
        match self {
            Trigger::Events(map) => map.keys().map(String::as_str).collect(),
            Trigger::List(list) => list.iter().map(String::as_str).collect(),
            Trigger::Event(name) => vec![name.as_str()],
        }
    }
}

/// `concurrency:` - structured group first, then bare group string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Concurrency {
    Group {
        group: String,
        #[serde(rename = "cancel-in-progress")]
        cancel_in_progress: Option<BoolOrExpr>,
    },
    Label(String),
}

/// `permissions:` - per-scope map first, then blanket `read-all`/`write-all`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    Scopes(FxHashMap<String, String>),
    Blanket(String),
}

/// `env:` - variable map first, then a whole-map expression string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvMap {
    Map(FxHashMap<String, Value>),
    Expr(String),
}

/// `runs-on:` - runner-group selector first, then label array, then label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Selector(FxHashMap<String, Value>),
    Labels(Vec<String>),
    Label(String),
}

/// `needs:` (and similar one-or-many string fields) - array before scalar.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<String>),
    One(String),
}

impl OneOrMany {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            OneOrMany::Many(v) => v.iter().map(String::as_str).collect(),
            OneOrMany::One(s) => vec![s],
        }
    }
}

/// `container:`/`services:` entries - structured spec first, then image name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Container {
    Spec(ContainerSpec),
    Image(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    pub credentials: Option<Value>,
    #[serde(default)]
    pub env: FxHashMap<String, Value>,
    pub ports: Option<Vec<Value>>,
    pub volumes: Option<Vec<String>>,
    pub options: Option<String>,
}

/// `environment:` - structured name+url first, then bare name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    Spec { name: String, url: Option<String> },
    Name(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    pub run: Option<RunDefaults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunDefaults {
    pub shell: Option<String>,
    #[serde(rename = "working-directory")]
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Strategy {
    pub matrix: Option<Value>,
    #[serde(rename = "fail-fast")]
    pub fail_fast: Option<BoolOrExpr>,
    #[serde(rename = "max-parallel")]
    pub max_parallel: Option<NumberOrExpr>,
}

/// One job of a workflow. Jobs are owned by their workflow and are not
/// addressable outside it.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: Option<String>,
    #[serde(rename = "runs-on")]
    pub runs_on: Option<RunsOn>,
    pub needs: Option<OneOrMany>,
    #[serde(rename = "if")]
    pub condition: Option<BoolOrExpr>,
    /// Reusable-workflow call; a dependency edge source like step `uses`.
    pub uses: Option<String>,
    #[serde(default)]
    pub with: FxHashMap<String, Value>,
    /// Secret map or the literal `inherit`.
    pub secrets: Option<Value>,
    pub permissions: Option<Permissions>,
    pub env: Option<EnvMap>,
    pub defaults: Option<Defaults>,
    pub concurrency: Option<Concurrency>,
    pub environment: Option<Environment>,
    #[serde(rename = "continue-on-error")]
    pub continue_on_error: Option<BoolOrExpr>,
    #[serde(rename = "timeout-minutes")]
    pub timeout_minutes: Option<NumberOrExpr>,
    pub strategy: Option<Strategy>,
    pub container: Option<Container>,
    #[serde(default)]
    pub services: FxHashMap<String, Container>,
    #[serde(default)]
    pub outputs: FxHashMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A full workflow document. `jobs` keeps document order so discovered
/// references (and therefore diagnostics) are stable.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDoc {
    pub name: Option<String>,
    #[serde(rename = "run-name")]
    pub run_name: Option<String>,
    pub on: Option<Trigger>,
    pub permissions: Option<Permissions>,
    pub env: Option<EnvMap>,
    pub defaults: Option<Defaults>,
    pub concurrency: Option<Concurrency>,
    pub jobs: IndexMap<String, Job>,
}

impl WorkflowDoc {
    /// Event names this workflow is triggered by, across all `on:` shapes.
    pub fn trigger_events(&self) -> Vec<&str> {
        self.on.as_ref().map(Trigger::event_names).unwrap_or_default()
    }

    /// Every `uses:` occurrence in document order: job-level reusable
    /// workflow calls first, then the job's steps.
    pub fn uses_sites(&self) -> Vec<UsesSite<'_>> {
        let mut sites = Vec::new();
        for (job_id, job) in &self.jobs {
            if let Some(uses) = job.uses.as_deref() {
                sites.push(UsesSite {
                    job: Some(job_id),
                    step: None,
                    step_id: None,
                    uses,
                });
            }
            for (idx, step) in job.steps.iter().enumerate() {
                if let Some(uses) = step.uses_ref() {
                    sites.push(UsesSite {
                        job: Some(job_id),
                        step: Some(idx),
                        step_id: step.id.as_deref(),
                        uses,
                    });
                }
            }
        }
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ═══════════════════════════════════════════════════════════════
    // TRIGGER SHAPE TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_on_single_event() {
        let doc: WorkflowDoc = serde_yaml::from_str("on: push\njobs: {}\n").unwrap();
        assert_eq!(doc.trigger_events(), vec!["push"]);
    }

    #[test]
    fn test_on_event_array() {
        let doc: WorkflowDoc =
            serde_yaml::from_str("on: [push, pull_request]\njobs: {}\n").unwrap();
        assert_eq!(doc.trigger_events(), vec!["push", "pull_request"]);
    }

    #[test]
    fn test_on_event_config_map() {
        let yaml = r#"
on:
  push:
    branches: [main]
  schedule:
    - cron: '0 4 * * *'
  workflow_dispatch:
jobs: {}
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            doc.trigger_events(),
            vec!["push", "schedule", "workflow_dispatch"]
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // UNION FIELD TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_concurrency_bare_string() {
        let doc: WorkflowDoc =
            serde_yaml::from_str("concurrency: release\njobs: {}\n").unwrap();
        assert!(matches!(doc.concurrency, Some(Concurrency::Label(ref s)) if s == "release"));
    }

    #[test]
    fn test_concurrency_structured_group() {
        let yaml = r#"
concurrency:
  group: ${{ github.workflow }}-${{ github.ref }}
  cancel-in-progress: true
jobs: {}
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        match doc.concurrency {
            Some(Concurrency::Group {
                group,
                cancel_in_progress,
            }) => {
                assert!(group.contains("github.workflow"));
                assert_eq!(cancel_in_progress, Some(BoolOrExpr::Bool(true)));
            }
            other => panic!("expected structured concurrency, got {other:?}"),
        }
    }

    #[test]
    fn test_permissions_blanket_and_scoped() {
        let blanket: WorkflowDoc =
            serde_yaml::from_str("permissions: read-all\njobs: {}\n").unwrap();
        assert!(matches!(
            blanket.permissions,
            Some(Permissions::Blanket(ref s)) if s == "read-all"
        ));

        let scoped: WorkflowDoc = serde_yaml::from_str(
            "permissions:\n  contents: read\n  id-token: write\njobs: {}\n",
        )
        .unwrap();
        match scoped.permissions {
            Some(Permissions::Scopes(map)) => assert_eq!(map.len(), 2),
            other => panic!("expected scoped permissions, got {other:?}"),
        }
    }

    #[test]
    fn test_runs_on_label_array_and_selector() {
        let yaml = r#"
jobs:
  a:
    runs-on: ubuntu-latest
    steps: []
  b:
    runs-on: [self-hosted, linux]
    steps: []
  c:
    runs-on:
      group: builders
      labels: [linux]
    steps: []
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(doc.jobs["a"].runs_on, Some(RunsOn::Label(_))));
        assert!(matches!(doc.jobs["b"].runs_on, Some(RunsOn::Labels(_))));
        assert!(matches!(doc.jobs["c"].runs_on, Some(RunsOn::Selector(_))));
    }

    #[test]
    fn test_needs_one_or_many() {
        let yaml = r#"
jobs:
  build:
    steps: []
  lint:
    steps: []
  deploy:
    needs: [build, lint]
    steps: []
  notify:
    needs: deploy
    steps: []
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            doc.jobs["deploy"].needs.as_ref().unwrap().as_vec(),
            vec!["build", "lint"]
        );
        assert_eq!(
            doc.jobs["notify"].needs.as_ref().unwrap().as_vec(),
            vec!["deploy"]
        );
    }

    #[test]
    fn test_job_container_and_services() {
        let yaml = r#"
jobs:
  test:
    runs-on: ubuntu-latest
    container:
      image: rust:1.86
      options: --cpus 2
    services:
      db:
        image: postgres:16
      cache: redis:7
    steps:
      - run: cargo test
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        let job = &doc.jobs["test"];
        assert!(matches!(job.container, Some(Container::Spec(_))));
        assert!(matches!(job.services["db"], Container::Spec(_)));
        assert!(matches!(job.services["cache"], Container::Image(_)));
    }

    // ═══════════════════════════════════════════════════════════════
    // USES SITE DISCOVERY TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_uses_sites_in_document_order() {
        let yaml = r#"
name: CI
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: cargo build
      - id: toolchain
        uses: ./actions/toolchain
  release:
    uses: ./.github/workflows/release.yml
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        let sites = doc.uses_sites();
        assert_eq!(sites.len(), 3);

        assert_eq!(sites[0].job, Some("build"));
        assert_eq!(sites[0].step, Some(0));
        assert_eq!(sites[0].uses, "actions/checkout@v4");

        assert_eq!(sites[1].step, Some(2));
        assert_eq!(sites[1].step_id, Some("toolchain"));

        assert_eq!(sites[2].job, Some("release"));
        assert_eq!(sites[2].step, None);
        assert_eq!(sites[2].uses, "./.github/workflows/release.yml");
    }

    #[test]
    fn test_run_only_workflow_has_no_sites() {
        let yaml = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: make
      - run: make test
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        assert!(doc.uses_sites().is_empty());
    }

    #[test]
    fn test_parser_accepts_fields_the_builder_ignores() {
        // Round-tripping/diagnostics need the whole schema accepted, not
        // just the edge-bearing parts.
        let yaml = r#"
name: Full
run-name: Deploy by @${{ github.actor }}
on:
  workflow_call:
    inputs:
      environment:
        type: string
env:
  CARGO_TERM_COLOR: always
defaults:
  run:
    shell: bash
    working-directory: crates
jobs:
  big:
    runs-on: ubuntu-latest
    environment:
      name: production
      url: https://example.com
    strategy:
      fail-fast: false
      matrix:
        os: [ubuntu-latest, macos-latest]
    outputs:
      digest: ${{ steps.push.outputs.digest }}
    timeout-minutes: 45
    steps:
      - run: echo ok
"#;
        let doc: WorkflowDoc = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.name.as_deref(), Some("Full"));
        assert!(doc.defaults.is_some());
        let job = &doc.jobs["big"];
        assert!(job.strategy.is_some());
        assert!(matches!(job.environment, Some(Environment::Spec { .. })));
        assert_eq!(job.outputs.len(), 1);
    }
}
