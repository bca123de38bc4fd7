// PathLayout maps object identities to their locations under the data root.
//
// The layout is split into a global content-addressable blob store and
// per-repository link files:
//
//	<root>/
//	├── _blobs
//	│   ├── <digest>          content-addressed immutable blob files
//	│   └── _<uuid>           active upload session files
//	└── <ns>/<repo>
//	    ├── _blobs/<digest>   empty file marking repo participation
//	    ├── _tags/<tag>       text file holding the target digest string
//	    └── <digest>          text file holding the digest string
//
// Content lives once under _blobs regardless of how many repositories
// publish it; access goes through the repo-local link files.

use std::path::PathBuf;

use uuid::Uuid;

use crate::types::{BlobId, Digest};

pub const BLOB_DIR_NAME: &str = "_blobs";
pub const TAG_DIR_NAME: &str = "_tags";

#[derive(Clone, Debug)]
pub struct PathLayout {
    root: PathBuf,
}

impl PathLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PathLayout { root: root.into() }
    }

    /// `<root>/_blobs`
    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join(BLOB_DIR_NAME)
    }

    /// `<root>/_blobs/<digest>`
    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.blobs_dir().join(digest.to_string())
    }

    /// `<root>/_blobs/_<uuid>`
    pub fn session_path(&self, sid: Uuid) -> PathBuf {
        self.blobs_dir().join(format!("_{sid}"))
    }

    /// `<root>/<ns>/<repo>`
    pub fn repo_dir(&self, namespace: &str, repo: &str) -> PathBuf {
        self.root.join(namespace).join(repo)
    }

    /// `<root>/<ns>/<repo>/_blobs`
    pub fn repo_blobs_dir(&self, namespace: &str, repo: &str) -> PathBuf {
        self.repo_dir(namespace, repo).join(BLOB_DIR_NAME)
    }

    /// `<root>/<ns>/<repo>/_blobs/<digest>`
    pub fn repo_blob_link(&self, bid: &BlobId) -> PathBuf {
        self.repo_blobs_dir(&bid.namespace, &bid.repo)
            .join(bid.digest.to_string())
    }

    /// `<root>/<ns>/<repo>/_tags`
    pub fn tags_dir(&self, namespace: &str, repo: &str) -> PathBuf {
        self.repo_dir(namespace, repo).join(TAG_DIR_NAME)
    }

    /// `<root>/<ns>/<repo>/_tags/<tag>`
    pub fn tag_link(&self, namespace: &str, repo: &str, tag: &str) -> PathBuf {
        self.tags_dir(namespace, repo).join(tag)
    }

    /// `<root>/<ns>/<repo>/<digest>`
    pub fn manifest_marker(&self, namespace: &str, repo: &str, digest: &Digest) -> PathBuf {
        self.repo_dir(namespace, repo).join(digest.to_string())
    }
}
