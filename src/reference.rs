//! Uses-reference parsing.
//!
//! A `uses:` string takes one of three shapes:
//! - repository: `{owner}/{repo}[/subdir...]@{ref}` (the `@{ref}` may be
//!   absent for working-tree references)
//! - local path: `./path/to/action`
//! - docker image: `docker://image[:tag]`

use crate::ast::Metadata;
use crate::error::{DepdyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Repository,
    LocalPath,
    Docker,
}

/// A parsed `uses:` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesRef {
    pub raw: String,
    pub kind: RefKind,
    /// Repository slug (`owner/repo`, or a bare name for same-repo
    /// references), local path, or docker image.
    pub path: String,
    /// Directory inside the repository for subdirectory actions.
    pub subpath: Option<String>,
    /// Tag, branch or commit-ish. `None` resolves against the working tree.
    pub version: Option<String>,
}

impl UsesRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| DepdyError::InvalidReference {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty reference"));
        }

        if let Some(image) = trimmed.strip_prefix("docker://") {
            if image.is_empty() {
                return Err(invalid("docker reference has no image"));
            }
            return Ok(Self {
                raw: raw.to_string(),
                kind: RefKind::Docker,
                path: image.to_string(),
                subpath: None,
                version: None,
            });
        }

        if trimmed.starts_with("./") || trimmed.starts_with("../") {
            let path = trimmed.trim_start_matches("./").trim_end_matches('/');
            if path.is_empty() {
                return Err(invalid("local path reference is empty"));
            }
            return Ok(Self {
                raw: raw.to_string(),
                kind: RefKind::LocalPath,
                path: path.to_string(),
                subpath: None,
                version: None,
            });
        }

        let (slug, version) = match trimmed.split_once('@') {
            Some((slug, version)) if !version.is_empty() => (slug, Some(version.to_string())),
            Some((slug, _)) => (slug, None),
            None => (trimmed, None),
        };

        let segments: Vec<&str> = slug.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(invalid("missing action path"));
        }

        let (path, subpath) = if segments.len() <= 2 {
            (segments.join("/"), None)
        } else {
            (segments[..2].join("/"), Some(segments[2..].join("/")))
        };

        Ok(Self {
            raw: raw.to_string(),
            kind: RefKind::Repository,
            path,
            subpath,
            version,
        })
    }

    /// Full path identifying the action, subdirectory included.
    pub fn full_path(&self) -> String {
        match &self.subpath {
            Some(sub) => format!("{}/{}", self.path, sub),
            None => self.path.clone(),
        }
    }

    /// The identity this reference binds to in the graph.
    pub fn identity(&self) -> Metadata {
        Metadata::new(self.full_path(), self.version.clone().unwrap_or_default())
    }

    /// Candidate manifest paths to try at the referenced revision:
    /// the subdirectory when present, otherwise the slug's final segment,
    /// each under the repository root and under `actions/`.
    pub fn manifest_candidates(&self) -> Vec<String> {
        let dir = match &self.subpath {
            Some(sub) => sub.as_str(),
            None => self.path.rsplit('/').next().unwrap_or(self.path.as_str()),
        };
        vec![
            format!("{dir}/action.yml"),
            format!("{dir}/action.yaml"),
            format!("actions/{dir}/action.yml"),
            format!("actions/{dir}/action.yaml"),
        ]
    }
}
