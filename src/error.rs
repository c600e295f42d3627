//! Depdy Error Types with Error Codes
//!
//! Error code ranges:
//! - DEPDY-000-009: Parse/classification errors
//! - DEPDY-010-019: Graph structure errors
//! - DEPDY-020-029: Version store errors
//! - DEPDY-090-099: IO/pattern errors
//!
//! `Unresolved` is deliberately NOT an error: a reference that cannot be
//! bound is recorded as an edge state and surfaced through the build's
//! warning list (see [`crate::graph`]).

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DepdyError>;

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
#[diagnostic(url(docsrs))]
pub enum DepdyError {
    // ═══════════════════════════════════════════
    // PARSE / CLASSIFICATION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[DEPDY-001] failed to parse {file}: {details}")]
    #[diagnostic(
        code(depdy::parse_error),
        help("check YAML syntax and field types against the workflow/action schema")
    )]
    ParseError { file: String, details: String },

    #[error("[DEPDY-002] cannot classify {file}: neither 'jobs' nor 'runs' key present")]
    #[diagnostic(
        code(depdy::unknown_document),
        help("workflow files need a top-level 'jobs' mapping, action manifests a 'runs' block")
    )]
    UnknownDocumentKind { file: String },

    #[error("[DEPDY-003] invalid uses reference '{reference}': {reason}")]
    #[diagnostic(
        code(depdy::invalid_reference),
        help("expected '{{owner}}/{{repo}}[/path]@{{ref}}', './local/path' or 'docker://image'")
    )]
    InvalidReference { reference: String, reason: String },

    // ═══════════════════════════════════════════
    // GRAPH STRUCTURE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[DEPDY-010] duplicate identity '{key}' ({first} and {second})")]
    #[diagnostic(
        code(depdy::duplicate_identity),
        help("two records share the same name and version; rename one or version them apart")
    )]
    DuplicateIdentity {
        key: String,
        first: String,
        second: String,
    },

    // ═══════════════════════════════════════════
    // VERSION STORE ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[DEPDY-020] revision not found: '{revision}'")]
    #[diagnostic(
        code(depdy::revision_not_found),
        help("the revision must be a commit id, branch, tag or symbolic ref known to the repository")
    )]
    RevisionNotFound { revision: String },

    #[error("[DEPDY-021] path '{path}' not found at revision '{revision}'")]
    PathNotFound { path: String, revision: String },

    #[error("[DEPDY-022] unsupported object kind: {kind}")]
    UnsupportedObjectKind { kind: String },

    #[error("[DEPDY-023] version store lookup deadline exceeded")]
    LookupDeadlineExceeded,

    #[error("[DEPDY-024] git error: {0}")]
    Git(#[from] git2::Error),

    // ═══════════════════════════════════════════
    // IO / PATTERN ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[DEPDY-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[DEPDY-091] YAML error: {0}")]
    #[diagnostic(
        code(depdy::yaml_parse),
        help("check YAML syntax: indentation must be consistent, strings with special chars need quoting")
    )]
    Yaml(#[from] serde_yaml::Error),

    #[error("[DEPDY-092] glob pattern error: {0}")]
    Pattern(#[from] globset::Error),
}

impl DepdyError {
    /// Get the error code (e.g., "DEPDY-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "DEPDY-001",
            Self::UnknownDocumentKind { .. } => "DEPDY-002",
            Self::InvalidReference { .. } => "DEPDY-003",
            Self::DuplicateIdentity { .. } => "DEPDY-010",
            Self::RevisionNotFound { .. } => "DEPDY-020",
            Self::PathNotFound { .. } => "DEPDY-021",
            Self::UnsupportedObjectKind { .. } => "DEPDY-022",
            Self::LookupDeadlineExceeded => "DEPDY-023",
            Self::Git(_) => "DEPDY-024",
            Self::Io(_) => "DEPDY-090",
            Self::Yaml(_) => "DEPDY-091",
            Self::Pattern(_) => "DEPDY-092",
        }
    }

    /// Check if the error aborts a whole graph build.
    ///
    /// Everything else degrades: per-file failures become scan warnings,
    /// store failures become `Unresolved` edges.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateIdentity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_code_and_display() {
        let err = DepdyError::ParseError {
            file: ".github/workflows/ci.yml".to_string(),
            details: "jobs.build.steps[0]: invalid type".to_string(),
        };
        assert_eq!(err.code(), "DEPDY-001");
        let msg = err.to_string();
        assert!(msg.contains("[DEPDY-001]"));
        assert!(msg.contains("ci.yml"));
        assert!(msg.contains("steps[0]"));
    }

    #[test]
    fn test_unknown_document_kind_error() {
        let err = DepdyError::UnknownDocumentKind {
            file: "docker-compose.yml".to_string(),
        };
        assert_eq!(err.code(), "DEPDY-002");
        let msg = err.to_string();
        assert!(msg.contains("[DEPDY-002]"));
        assert!(msg.contains("jobs"));
        assert!(msg.contains("runs"));
    }

    #[test]
    fn test_duplicate_identity_is_fatal() {
        let err = DepdyError::DuplicateIdentity {
            key: "build_v1".to_string(),
            first: "actions/build/action.yml".to_string(),
            second: "tools/build/action.yml".to_string(),
        };
        assert_eq!(err.code(), "DEPDY-010");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("build_v1"));
    }

    #[test]
    fn test_store_errors_are_not_fatal() {
        let errs = [
            DepdyError::RevisionNotFound {
                revision: "deadbeef".to_string(),
            },
            DepdyError::PathNotFound {
                path: "actions/gone/action.yml".to_string(),
                revision: "v1".to_string(),
            },
            DepdyError::UnsupportedObjectKind {
                kind: "ofs_delta".to_string(),
            },
            DepdyError::LookupDeadlineExceeded,
        ];
        for err in errs {
            assert!(!err.is_fatal(), "{} should not be fatal", err.code());
        }
    }

    #[test]
    fn test_revision_not_found_error() {
        let err = DepdyError::RevisionNotFound {
            revision: "deadbeef".to_string(),
        };
        assert_eq!(err.code(), "DEPDY-020");
        assert!(err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: DepdyError = io_err.into();
        assert_eq!(err.code(), "DEPDY-090");
        assert!(err.to_string().contains("[DEPDY-090]"));
    }

    #[test]
    fn test_yaml_error_from_serde() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("invalid: yaml: syntax:");
        if let Err(e) = yaml_err {
            let err: DepdyError = e.into();
            assert_eq!(err.code(), "DEPDY-091");
            assert!(err.to_string().contains("[DEPDY-091]"));
        }
    }
}
