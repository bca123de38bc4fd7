//! Storage backends for the registry.
//!
//! The protocol layer talks to a [`Storage`] trait object so tests can swap
//! the on-disk store for an in-memory one.

pub mod driver;
pub mod paths;

use std::pin::Pin;

use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::types::{BlobId, Digest, ManifestId};

/// Request bodies flow into the store as the raw axum data stream; nothing
/// buffers a whole blob in memory.
pub type ByteStream = axum::body::BodyDataStream;

/// Readable handle onto stored content.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("blob or manifest not found")]
    NotFound,

    #[error("upload session {0} not found")]
    SessionNotFound(Uuid),

    #[error("upload chunk out of order: expected {expected} but got {actual}")]
    OutOfOrderChunk { expected: u64, actual: u64 },

    #[error("digests don't match: provided: {provided}, expected: {computed}")]
    DigestMismatch { provided: Digest, computed: Digest },

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Stores a blob and links it into the repository named by `bid`.
    /// Returns the digest computed from the actual content; callers that
    /// require an identity match compare it against `bid.digest` themselves.
    async fn store_blob(&self, bid: &BlobId, stream: ByteStream) -> Result<Digest, StorageError>;

    /// Returns a reader over the blob plus its size in bytes. Fails with
    /// `NotFound` unless the repository named by `bid` has published the
    /// blob, even when the content exists globally.
    async fn fetch_blob(&self, bid: &BlobId) -> Result<(BlobReader, u64), StorageError>;

    /// Unlinks the blob from the repository. The deduplicated content
    /// survives for other repositories.
    async fn delete_blob(&self, bid: &BlobId) -> Result<(), StorageError>;

    /// Opens a resumable upload session.
    async fn start_session(&self) -> Result<Uuid, StorageError>;

    /// Returns the number of bytes accumulated in the session so far.
    async fn session_info(&self, sid: Uuid) -> Result<u64, StorageError>;

    /// Appends a chunk to the session. `content_range` is the raw
    /// `start-end` header value when the client sent one; the start must
    /// equal the current session size. Returns the absolute offset of the
    /// last byte now held by the session.
    async fn store_session_data(
        &self,
        sid: Uuid,
        stream: ByteStream,
        content_range: Option<&str>,
    ) -> Result<u64, StorageError>;

    /// Turns the accumulated session data into a content-addressed blob
    /// attributed to the repository named by `bid`. The returned digest is
    /// computed from the data; `bid.digest` is attribution only.
    async fn close_session(&self, sid: Uuid, bid: &BlobId) -> Result<Digest, StorageError>;

    /// Stores a manifest transactionally: the blob plus the tag and digest
    /// indirections, with every completed step undone on failure.
    /// `mid.digest` must be set.
    async fn store_manifest(&self, mid: &ManifestId, stream: ByteStream)
        -> Result<(), StorageError>;

    /// Resolves the tag or digest indirection and returns the manifest
    /// content.
    async fn fetch_manifest(&self, mid: &ManifestId) -> Result<BlobReader, StorageError>;

    /// Whether the indirection named by `mid` exists.
    async fn has_manifest(&self, mid: &ManifestId) -> Result<bool, StorageError>;

    /// Removes the indirection named by `mid` (tag link or digest marker).
    async fn delete_manifest(&self, mid: &ManifestId) -> Result<(), StorageError>;

    /// Lists the tags of a repository. Fails with `NotFound` when the
    /// repository has none.
    async fn tags(&self, namespace: &str, repo: &str) -> Result<Vec<String>, StorageError>;
}
