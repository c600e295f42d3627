//! Action manifest schema - metadata, inputs/outputs and the `runs` block.

use rustc_hash::FxHashMap;
use serde::de::Error as _;
use serde::Deserialize;
use serde_yaml::Value;

use super::step::Step;
use super::UsesSite;

/// One declared action input.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionInput {
    pub description: Option<String>,
    pub required: Option<bool>,
    pub default: Option<Value>,
    #[serde(rename = "deprecationMessage")]
    pub deprecation_message: Option<String>,
}

/// One declared action output.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionOutput {
    pub description: Option<String>,
    /// Only composite actions carry a value expression here.
    pub value: Option<String>,
}

/// Marketplace badge styling. Free-form strings: validating icon and color
/// enums is not this crate's job.
#[derive(Debug, Clone, Deserialize)]
pub struct Branding {
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Raw `runs` block as it appears on disk, before narrowing by `using`.
#[derive(Debug, Deserialize)]
struct RunsRaw {
    using: String,
    main: Option<String>,
    pre: Option<String>,
    #[serde(rename = "pre-if")]
    pre_if: Option<String>,
    post: Option<String>,
    #[serde(rename = "post-if")]
    post_if: Option<String>,
    image: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    entrypoint: Option<String>,
    #[serde(rename = "pre-entrypoint")]
    pre_entrypoint: Option<String>,
    #[serde(rename = "post-entrypoint")]
    post_entrypoint: Option<String>,
    #[serde(default)]
    env: FxHashMap<String, String>,
    #[serde(default)]
    steps: Vec<Step>,
}

/// The `runs` specification, narrowed to its three legal shapes.
#[derive(Debug, Clone)]
pub enum Runs {
    /// JavaScript/binary entry point (`using: node20`, ...).
    Node {
        using: String,
        main: String,
        pre: Option<String>,
        pre_if: Option<String>,
        post: Option<String>,
        post_if: Option<String>,
    },
    /// Container-backed action (`using: docker`).
    Docker {
        image: String,
        args: Vec<String>,
        entrypoint: Option<String>,
        pre_entrypoint: Option<String>,
        post_entrypoint: Option<String>,
        env: FxHashMap<String, String>,
    },
    /// Composite sequence of steps (`using: composite`).
    Composite { steps: Vec<Step> },
}

impl<'de> Deserialize<'de> for Runs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RunsRaw::deserialize(deserializer)?;
        match raw.using.as_str() {
            "composite" => Ok(Runs::Composite { steps: raw.steps }),
            "docker" => {
                let image = raw
                    .image
                    .ok_or_else(|| D::Error::custom("runs.using is 'docker' but runs.image is missing"))?;
                Ok(Runs::Docker {
                    image,
                    args: raw.args,
                    entrypoint: raw.entrypoint,
                    pre_entrypoint: raw.pre_entrypoint,
                    post_entrypoint: raw.post_entrypoint,
                    env: raw.env,
                })
            }
            using if using.starts_with("node") => {
                let main = raw.main.ok_or_else(|| {
                    D::Error::custom(format!("runs.using is '{using}' but runs.main is missing"))
                })?;
                Ok(Runs::Node {
                    using: raw.using,
                    main,
                    pre: raw.pre,
                    pre_if: raw.pre_if,
                    post: raw.post,
                    post_if: raw.post_if,
                })
            }
            other => Err(D::Error::custom(format!(
                "unsupported runs.using '{other}' (expected composite, docker or node*)"
            ))),
        }
    }
}

impl Runs {
    /// Steps owned by this action; empty unless composite.
    pub fn steps(&self) -> &[Step] {
        match self {
            Runs::Composite { steps } => steps,
            _ => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Runs::Composite { .. })
    }
}

/// A full action manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDoc {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: FxHashMap<String, ActionInput>,
    #[serde(default)]
    pub outputs: FxHashMap<String, ActionOutput>,
    pub branding: Option<Branding>,
    pub runs: Runs,
}

impl ActionDoc {
    /// Every `uses:` occurrence in step order. Only composite actions can
    /// reference other actions.
    pub fn uses_sites(&self) -> Vec<UsesSite<'_>> {
        self.runs
            .steps()
            .iter()
            .enumerate()
            .filter_map(|(idx, step)| {
                step.uses_ref().map(|uses| UsesSite {
                    job: None,
                    step: Some(idx),
                    step_id: step.id.as_deref(),
                    uses,
                })
            })
            .collect()
    }
}
