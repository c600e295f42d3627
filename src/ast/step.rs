//! Step - the shared unit of execution inside jobs and composite actions.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_yaml::Value;

/// Fields like `continue-on-error` and `if` accept a literal boolean or an
/// expression string. Variants are tried in declaration order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoolOrExpr {
    Bool(bool),
    Expr(String),
}

/// Fields like `timeout-minutes` accept a number or an expression string.
/// Variants are tried in declaration order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrExpr {
    Number(f64),
    Expr(String),
}

/// A single step of a job or composite action.
///
/// A step is a dependency edge only when `uses` is set; `run` steps are
/// terminal leaves.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "if")]
    pub condition: Option<BoolOrExpr>,
    pub uses: Option<String>,
    pub run: Option<String>,
    pub shell: Option<String>,
    #[serde(rename = "working-directory")]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub with: FxHashMap<String, Value>,
    #[serde(default)]
    pub env: FxHashMap<String, Value>,
    #[serde(rename = "continue-on-error")]
    pub continue_on_error: Option<BoolOrExpr>,
    #[serde(rename = "timeout-minutes")]
    pub timeout_minutes: Option<NumberOrExpr>,
}

impl Step {
    /// The `uses` reference when this step is a dependency edge source.
    pub fn uses_ref(&self) -> Option<&str> {
        self.uses.as_deref()
    }
}
