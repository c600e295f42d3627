//! Git-backed version store.

use std::path::Path;

use git2::{Object, ObjectType, Repository};
use tracing::debug;

use super::VersionStore;
use crate::error::{DepdyError, Result};

/// Version store over a repository's git object database. Read-only.
pub struct GitStore {
    repo: Repository,
}

impl GitStore {
    /// Open the repository containing `path` (walks up like git itself).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Ok(Self { repo })
    }
}

impl VersionStore for GitStore {
    fn resolve(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        if revision.is_empty() {
            return Err(DepdyError::RevisionNotFound {
                revision: revision.to_string(),
            });
        }
        debug!(revision, path, "resolving file in object store");
        let object = self
            .repo
            .revparse_single(revision)
            .map_err(|_| DepdyError::RevisionNotFound {
                revision: revision.to_string(),
            })?;
        dereference(&self.repo, object, revision, path)
    }
}

/// Recursive dispatch over the closed set of object kinds: a commit yields
/// its tree, a tag its target, a tree the entry at `path`, and a blob its
/// content. Anything else is unsupported.
fn dereference<'r>(
    repo: &'r Repository,
    object: Object<'r>,
    revision: &str,
    path: &str,
) -> Result<Vec<u8>> {
    match object.kind() {
        Some(ObjectType::Commit) => {
            let commit = object
                .into_commit()
                .map_err(|_| unsupported(Some(ObjectType::Commit)))?;
            dereference(repo, commit.tree()?.into_object(), revision, path)
        }
        Some(ObjectType::Tag) => {
            let tag = object
                .into_tag()
                .map_err(|_| unsupported(Some(ObjectType::Tag)))?;
            dereference(repo, tag.target()?, revision, path)
        }
        Some(ObjectType::Tree) => {
            let tree = object
                .into_tree()
                .map_err(|_| unsupported(Some(ObjectType::Tree)))?;
            let entry = tree
                .get_path(Path::new(path))
                .map_err(|_| DepdyError::PathNotFound {
                    path: path.to_string(),
                    revision: revision.to_string(),
                })?;
            dereference(repo, entry.to_object(repo)?, revision, path)
        }
        Some(ObjectType::Blob) => {
            let blob = object
                .into_blob()
                .map_err(|_| unsupported(Some(ObjectType::Blob)))?;
            Ok(blob.content().to_vec())
        }
        other => Err(unsupported(other)),
    }
}

fn unsupported(kind: Option<ObjectType>) -> DepdyError {
    DepdyError::UnsupportedObjectKind {
        kind: kind.map_or_else(|| "unknown".to_string(), |k| k.to_string()),
    }
}
