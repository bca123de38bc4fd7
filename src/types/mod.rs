//! Identifier types shared by the protocol layer and the storage backends.

pub mod digest;

use serde::Serialize;

pub use digest::{Algorithm, Digest, DigestError};

/// A validated `namespace/repo` pair. The namespace may itself contain
/// slashes; the repo is always the final path segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPath {
    pub namespace: String,
    pub repo: String,
}

impl RepoPath {
    pub fn new(namespace: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoPath {
            namespace: namespace.into(),
            repo: repo.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.repo)
    }
}

/// Identifies one blob within one repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobId {
    pub namespace: String,
    pub repo: String,
    pub digest: Digest,
}

impl BlobId {
    pub fn new(repo: &RepoPath, digest: Digest) -> Self {
        BlobId {
            namespace: repo.namespace.clone(),
            repo: repo.repo.clone(),
            digest,
        }
    }
}

/// Identifies a manifest by tag, digest, or both. At least one of the two is
/// always present once a request path has been validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestId {
    pub namespace: String,
    pub repo: String,
    pub tag: Option<String>,
    pub digest: Option<Digest>,
}

impl ManifestId {
    pub fn by_tag(repo: &RepoPath, tag: impl Into<String>) -> Self {
        ManifestId {
            namespace: repo.namespace.clone(),
            repo: repo.repo.clone(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    pub fn by_digest(repo: &RepoPath, digest: Digest) -> Self {
        ManifestId {
            namespace: repo.namespace.clone(),
            repo: repo.repo.clone(),
            tag: None,
            digest: Some(digest),
        }
    }

    /// The reference the client used: the tag when present, the digest
    /// string otherwise.
    pub fn reference(&self) -> String {
        if let Some(tag) = &self.tag {
            return tag.clone();
        }
        if let Some(digest) = &self.digest {
            return digest.to_string();
        }
        String::new()
    }
}

/// Response body of the tag-list endpoint.
#[derive(Debug, Serialize)]
pub struct TagList {
    pub name: String,
    pub tags: Vec<String>,
}
