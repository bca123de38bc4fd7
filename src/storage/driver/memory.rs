use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::{self, Cursor};

use bytes::Bytes;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::storage::{BlobReader, ByteStream, Storage, StorageError};
use crate::types::{Algorithm, BlobId, Digest, ManifestId};

type RepoKey = (String, String);

#[derive(Default)]
struct Inner {
    /// digest string -> content, shared across repositories
    blobs: HashMap<String, Bytes>,
    /// (ns, repo, digest string) markers
    links: HashSet<(String, String, String)>,
    /// open upload sessions
    sessions: HashMap<Uuid, Vec<u8>>,
    /// (ns, repo) + reference (tag or digest string) -> manifest digest
    manifests: HashMap<(String, String, String), Digest>,
    /// tag names per repository
    tags: HashMap<RepoKey, BTreeSet<String>>,
}

/// In-memory backend mirroring the on-disk semantics, blob links and
/// sessions included. Content is buffered whole, which is fine for tests.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage::default()
    }
}

async fn read_stream(stream: ByteStream) -> Result<Vec<u8>, StorageError> {
    let mut reader = StreamReader::new(stream.map_err(io::Error::other));
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn link_key(bid: &BlobId) -> (String, String, String) {
    (
        bid.namespace.clone(),
        bid.repo.clone(),
        bid.digest.to_string(),
    )
}

#[async_trait::async_trait]
impl Storage for MemStorage {
    async fn store_blob(&self, bid: &BlobId, stream: ByteStream) -> Result<Digest, StorageError> {
        let data = read_stream(stream).await?;
        let digest = Digest::of_bytes(Algorithm::Sha256, &data);

        let mut inner = self.inner.write().await;
        inner.blobs.insert(digest.to_string(), Bytes::from(data));
        inner.links.insert((
            bid.namespace.clone(),
            bid.repo.clone(),
            digest.to_string(),
        ));
        Ok(digest)
    }

    async fn fetch_blob(&self, bid: &BlobId) -> Result<(BlobReader, u64), StorageError> {
        let inner = self.inner.read().await;
        if !inner.links.contains(&link_key(bid)) {
            return Err(StorageError::NotFound);
        }
        let data = inner
            .blobs
            .get(&bid.digest.to_string())
            .cloned()
            .ok_or(StorageError::NotFound)?;
        let size = data.len() as u64;
        Ok((Box::pin(Cursor::new(data.to_vec())), size))
    }

    async fn delete_blob(&self, bid: &BlobId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.links.remove(&link_key(bid)) {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    async fn start_session(&self) -> Result<Uuid, StorageError> {
        let sid = Uuid::new_v4();
        self.inner.write().await.sessions.insert(sid, Vec::new());
        Ok(sid)
    }

    async fn session_info(&self, sid: Uuid) -> Result<u64, StorageError> {
        let inner = self.inner.read().await;
        let session = inner
            .sessions
            .get(&sid)
            .ok_or(StorageError::SessionNotFound(sid))?;
        Ok(session.len() as u64)
    }

    async fn store_session_data(
        &self,
        sid: Uuid,
        stream: ByteStream,
        content_range: Option<&str>,
    ) -> Result<u64, StorageError> {
        let range = super::filesystem::parse_range(content_range)?;
        let data = read_stream(stream).await?;

        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(&sid)
            .ok_or(StorageError::SessionNotFound(sid))?;

        let size = session.len() as u64;
        if let Some((start, _end)) = range {
            if start != size {
                return Err(StorageError::OutOfOrderChunk {
                    expected: size + 1,
                    actual: start,
                });
            }
        }

        session.extend_from_slice(&data);
        Ok((session.len() as u64).saturating_sub(1))
    }

    async fn close_session(&self, sid: Uuid, bid: &BlobId) -> Result<Digest, StorageError> {
        let mut inner = self.inner.write().await;
        let data = inner
            .sessions
            .remove(&sid)
            .ok_or(StorageError::SessionNotFound(sid))?;

        let digest = Digest::of_bytes(Algorithm::Sha256, &data);
        inner.blobs.insert(digest.to_string(), Bytes::from(data));
        inner.links.insert((
            bid.namespace.clone(),
            bid.repo.clone(),
            digest.to_string(),
        ));
        Ok(digest)
    }

    async fn store_manifest(
        &self,
        mid: &ManifestId,
        stream: ByteStream,
    ) -> Result<(), StorageError> {
        let digest = mid.digest.clone().ok_or_else(|| {
            StorageError::InvalidInput("digest cannot be empty when storing manifest".to_string())
        })?;

        let data = read_stream(stream).await?;
        let computed = Digest::of_bytes(Algorithm::Sha256, &data);
        if computed != digest {
            return Err(StorageError::DigestMismatch {
                provided: digest,
                computed,
            });
        }

        let mut inner = self.inner.write().await;
        inner.blobs.insert(digest.to_string(), Bytes::from(data));
        inner.links.insert((
            mid.namespace.clone(),
            mid.repo.clone(),
            digest.to_string(),
        ));

        let repo = (mid.namespace.clone(), mid.repo.clone());
        inner.manifests.insert(
            (repo.0.clone(), repo.1.clone(), digest.to_string()),
            digest.clone(),
        );
        if let Some(tag) = &mid.tag {
            inner
                .manifests
                .insert((repo.0.clone(), repo.1.clone(), tag.clone()), digest);
            inner.tags.entry(repo).or_default().insert(tag.clone());
        }
        Ok(())
    }

    async fn fetch_manifest(&self, mid: &ManifestId) -> Result<BlobReader, StorageError> {
        let inner = self.inner.read().await;
        let digest = inner
            .manifests
            .get(&(
                mid.namespace.clone(),
                mid.repo.clone(),
                mid.reference(),
            ))
            .ok_or(StorageError::NotFound)?;
        let data = inner
            .blobs
            .get(&digest.to_string())
            .cloned()
            .ok_or(StorageError::NotFound)?;
        Ok(Box::pin(Cursor::new(data.to_vec())))
    }

    async fn has_manifest(&self, mid: &ManifestId) -> Result<bool, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.manifests.contains_key(&(
            mid.namespace.clone(),
            mid.repo.clone(),
            mid.reference(),
        )))
    }

    async fn delete_manifest(&self, mid: &ManifestId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let key = (mid.namespace.clone(), mid.repo.clone(), mid.reference());
        inner
            .manifests
            .remove(&key)
            .ok_or(StorageError::NotFound)?;

        if let Some(tag) = &mid.tag {
            if let Some(tags) = inner
                .tags
                .get_mut(&(mid.namespace.clone(), mid.repo.clone()))
            {
                tags.remove(tag);
            }
        }
        Ok(())
    }

    async fn tags(&self, namespace: &str, repo: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.read().await;
        let tags = inner
            .tags
            .get(&(namespace.to_string(), repo.to_string()))
            .ok_or(StorageError::NotFound)?;
        Ok(tags.iter().cloned().collect())
    }
}
