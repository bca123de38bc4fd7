use std::io;
#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::storage::paths::PathLayout;
use crate::storage::{BlobReader, ByteStream, Storage, StorageError};
use crate::types::{Algorithm, BlobId, Digest, ManifestId};

static CONTENT_RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)-([0-9]+)$").unwrap());

const FILE_MODE: u32 = 0o600;
const LINK_MODE: u32 = 0o640;
const DIR_MODE: u32 = 0o750;

/// Content-addressed on-disk store. Blob content lives once under
/// `_blobs/<digest>`; repositories reference it through empty link files.
/// All writes land in a temp file first and are committed by rename.
pub struct FileStorage {
    layout: PathLayout,
}

impl FileStorage {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let layout = PathLayout::new(root);
        ensure_dir(&layout.blobs_dir()).await?;
        Ok(FileStorage { layout })
    }

    /// Streams the body into `tmp`, then hands it to `finalize_blob`. The
    /// temp file never survives a failure.
    async fn write_blob_tmp(
        &self,
        tmp: &Path,
        bid: &BlobId,
        stream: ByteStream,
    ) -> Result<Digest, StorageError> {
        let file = create_file(tmp, FILE_MODE).await?;
        let res = async {
            copy_stream(stream, file).await?;
            self.finalize_blob(tmp, bid).await
        }
        .await;
        if res.is_err() {
            let _ = fs::remove_file(tmp).await;
        }
        res
    }

    /// Commits a fully-written temp file: digest it, rename it into the
    /// global blob store and link it into the repository.
    async fn finalize_blob(&self, tmp: &Path, bid: &BlobId) -> Result<Digest, StorageError> {
        let file = File::open(tmp).await?;
        let digest = Digest::from_reader(Algorithm::Sha256, file).await?;

        fs::rename(tmp, self.layout.blob_path(&digest)).await?;

        ensure_dir(&self.layout.repo_blobs_dir(&bid.namespace, &bid.repo)).await?;
        let link = BlobId {
            namespace: bid.namespace.clone(),
            repo: bid.repo.clone(),
            digest: digest.clone(),
        };
        create_link_file(&self.layout.repo_blob_link(&link)).await?;

        Ok(digest)
    }

    /// `_tags/<tag>` when the id carries a tag, the digest marker otherwise.
    fn file_name_for(&self, mid: &ManifestId) -> Result<PathBuf, StorageError> {
        if let Some(tag) = &mid.tag {
            return Ok(self.layout.tag_link(&mid.namespace, &mid.repo, tag));
        }
        if let Some(digest) = &mid.digest {
            return Ok(self.layout.manifest_marker(&mid.namespace, &mid.repo, digest));
        }
        Err(StorageError::InvalidInput(
            "neither tag nor digest set for manifest".to_string(),
        ))
    }

    async fn store_manifest_inner(
        &self,
        mid: &ManifestId,
        digest: &Digest,
        stream: ByteStream,
        rollbacks: &mut Vec<Undo>,
    ) -> Result<(), StorageError> {
        let bid = BlobId {
            namespace: mid.namespace.clone(),
            repo: mid.repo.clone(),
            digest: digest.clone(),
        };
        let computed = self.store_blob(&bid, stream).await?;

        let stored = BlobId {
            digest: computed.clone(),
            ..bid
        };
        rollbacks.push(Undo::RemoveFile(self.layout.repo_blob_link(&stored)));

        if computed != *digest {
            return Err(StorageError::DigestMismatch {
                provided: digest.clone(),
                computed,
            });
        }

        let repo_dir = self.layout.repo_dir(&mid.namespace, &mid.repo);
        ensure_dir(&repo_dir).await?;

        let tmp = repo_dir.join(format!(".{}", Uuid::new_v4()));
        let res = async {
            let mut file = create_file(&tmp, FILE_MODE).await?;
            file.write_all(digest.to_string().as_bytes()).await?;
            file.flush().await?;
            drop(file);

            let link = self.file_name_for(mid)?;
            if let Some(parent) = link.parent() {
                ensure_dir(parent).await?;
            }
            fs::rename(&tmp, &link).await?;
            rollbacks.push(Undo::RemoveFile(link));

            write_file(
                &self.layout.manifest_marker(&mid.namespace, &mid.repo, digest),
                digest.to_string().as_bytes(),
            )
            .await?;
            Ok(())
        }
        .await;
        if res.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        res
    }
}

/// Compensating action recorded after a completed step of a manifest store.
enum Undo {
    RemoveFile(PathBuf),
}

impl Undo {
    async fn run(self) {
        match self {
            Undo::RemoveFile(path) => {
                if let Err(err) = fs::remove_file(&path).await {
                    tracing::error!(path = %path.display(), error = %err, "failed performing rollback");
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn store_blob(&self, bid: &BlobId, stream: ByteStream) -> Result<Digest, StorageError> {
        ensure_dir(&self.layout.blobs_dir()).await?;
        let tmp = self.layout.blobs_dir().join(format!(".{}", Uuid::new_v4()));
        self.write_blob_tmp(&tmp, bid, stream).await
    }

    async fn fetch_blob(&self, bid: &BlobId) -> Result<(BlobReader, u64), StorageError> {
        fs::metadata(self.layout.repo_blob_link(bid))
            .await
            .map_err(not_found)?;

        let meta = fs::metadata(self.layout.blob_path(&bid.digest)).await?;
        let file = File::open(self.layout.blob_path(&bid.digest)).await?;
        Ok((Box::pin(file), meta.len()))
    }

    async fn delete_blob(&self, bid: &BlobId) -> Result<(), StorageError> {
        fs::remove_file(self.layout.repo_blob_link(bid))
            .await
            .map_err(not_found)
    }

    async fn start_session(&self) -> Result<Uuid, StorageError> {
        let sid = Uuid::new_v4();
        let file = create_file(&self.layout.session_path(sid), FILE_MODE).await?;
        drop(file);
        Ok(sid)
    }

    async fn session_info(&self, sid: Uuid) -> Result<u64, StorageError> {
        let meta = fs::metadata(self.layout.session_path(sid))
            .await
            .map_err(|e| session_not_found(sid, e))?;
        Ok(meta.len())
    }

    async fn store_session_data(
        &self,
        sid: Uuid,
        stream: ByteStream,
        content_range: Option<&str>,
    ) -> Result<u64, StorageError> {
        let range = parse_range(content_range)?;

        let path = self.layout.session_path(sid);
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| session_not_found(sid, e))?;
        let size = meta.len();

        if let Some((start, _end)) = range {
            if start != size {
                return Err(StorageError::OutOfOrderChunk {
                    expected: size + 1,
                    actual: start,
                });
            }
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| session_not_found(sid, e))?;
        let copied = copy_stream(stream, file).await?;

        tracing::trace!(session = %sid, bytes = copied, "wrote data to session");

        Ok((size + copied).saturating_sub(1))
    }

    async fn close_session(&self, sid: Uuid, bid: &BlobId) -> Result<Digest, StorageError> {
        let path = self.layout.session_path(sid);
        fs::metadata(&path)
            .await
            .map_err(|e| session_not_found(sid, e))?;

        self.finalize_blob(&path, bid).await
    }

    async fn store_manifest(
        &self,
        mid: &ManifestId,
        stream: ByteStream,
    ) -> Result<(), StorageError> {
        let digest = mid.digest.clone().ok_or_else(|| {
            StorageError::InvalidInput("digest cannot be empty when storing manifest".to_string())
        })?;

        let mut rollbacks = Vec::new();
        let res = self
            .store_manifest_inner(mid, &digest, stream, &mut rollbacks)
            .await;
        if res.is_err() {
            for undo in rollbacks.into_iter().rev() {
                undo.run().await;
            }
        }
        res
    }

    async fn fetch_manifest(&self, mid: &ManifestId) -> Result<BlobReader, StorageError> {
        let link = self.file_name_for(mid)?;
        let content = fs::read_to_string(&link).await.map_err(not_found)?;
        let digest = Digest::parse(&content)
            .map_err(|e| StorageError::InvalidInput(format!("failed parsing digest: {e}")))?;

        let (reader, _) = self
            .fetch_blob(&BlobId {
                namespace: mid.namespace.clone(),
                repo: mid.repo.clone(),
                digest,
            })
            .await?;
        Ok(reader)
    }

    async fn has_manifest(&self, mid: &ManifestId) -> Result<bool, StorageError> {
        let link = self.file_name_for(mid)?;
        match fs::metadata(&link).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(StorageError::InvalidInput(
                "manifest file is not a regular file".to_string(),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_manifest(&self, mid: &ManifestId) -> Result<(), StorageError> {
        let link = self.file_name_for(mid)?;
        fs::remove_file(&link).await.map_err(not_found)
    }

    async fn tags(&self, namespace: &str, repo: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.layout.tags_dir(namespace, repo);
        let mut entries = fs::read_dir(&dir).await.map_err(not_found)?;

        let mut tags = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                tags.push(name.to_string());
            }
        }
        Ok(tags)
    }
}

fn not_found(e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        StorageError::Io(e)
    }
}

fn session_not_found(sid: Uuid, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::SessionNotFound(sid)
    } else {
        StorageError::Io(e)
    }
}

/// Parses an optional `start-end` content-range value. Both bounds are
/// required whenever the header is given.
pub(crate) fn parse_range(s: Option<&str>) -> Result<Option<(u64, u64)>, StorageError> {
    let s = match s {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    let caps = CONTENT_RANGE_RE.captures(s).ok_or_else(|| {
        StorageError::InvalidInput(format!("range string {s:?} doesn't match expected format"))
    })?;

    let start = caps[1]
        .parse::<u64>()
        .map_err(|e| StorageError::InvalidInput(format!("failed parsing start of range: {e}")))?;
    let end = caps[2]
        .parse::<u64>()
        .map_err(|e| StorageError::InvalidInput(format!("failed parsing end of range: {e}")))?;

    Ok(Some((start, end)))
}

async fn ensure_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await
}

async fn create_file(path: &Path, _mode: u32) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(_mode);
    opts.open(path).await
}

/// Creates the empty repo-link marker. The file name is the assertion; the
/// content stays empty.
async fn create_link_file(path: &Path) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true);
    #[cfg(unix)]
    opts.mode(LINK_MODE);
    let file = opts.open(path).await?;
    drop(file);
    Ok(())
}

async fn write_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = create_file(path, FILE_MODE).await?;
    file.write_all(content).await?;
    file.flush().await?;
    Ok(())
}

async fn copy_stream(stream: ByteStream, file: File) -> io::Result<u64> {
    let mut reader = StreamReader::new(stream.map_err(io::Error::other));
    let mut writer = BufWriter::new(file);
    let copied = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::Path;

    use axum::body::Body;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use walkdir::WalkDir;

    use super::*;
    use crate::types::RepoPath;

    fn stream_of(data: &[u8]) -> ByteStream {
        Body::from(data.to_vec()).into_data_stream()
    }

    fn bid(ns: &str, repo: &str, digest: Digest) -> BlobId {
        BlobId {
            namespace: ns.to_string(),
            repo: repo.to_string(),
            digest,
        }
    }

    fn tagged_mid(ns: &str, repo: &str, tag: &str, digest: Digest) -> ManifestId {
        ManifestId {
            namespace: ns.to_string(),
            repo: repo.to_string(),
            tag: Some(tag.to_string()),
            digest: Some(digest),
        }
    }

    async fn read_all(mut reader: BlobReader) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    /// Collects every non-directory path below `root`, relative to it.
    fn files_under(root: &Path) -> BTreeSet<String> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn blob_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let data = b"some blob content";
        let expected = Digest::of_bytes(Algorithm::Sha256, data);
        let id = bid("foo-ns", "bar-repo", expected.clone());

        let stored = store.store_blob(&id, stream_of(data)).await.unwrap();
        assert_eq!(stored, expected);

        let (reader, size) = store.fetch_blob(&id).await.unwrap();
        assert_eq!(size, data.len() as u64);
        assert_eq!(read_all(reader).await, data);
    }

    #[tokio::test]
    async fn blob_is_repo_scoped() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let data = b"shared content";
        let digest = Digest::of_bytes(Algorithm::Sha256, data);
        store
            .store_blob(&bid("ns", "repo1", digest.clone()), stream_of(data))
            .await
            .unwrap();

        let err = match store
            .fetch_blob(&bid("ns", "repo2", digest.clone()))
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(matches!(err, StorageError::NotFound));

        // The content itself exists exactly once, globally.
        assert!(dir.path().join("_blobs").join(digest.to_string()).is_file());
    }

    #[tokio::test]
    async fn delete_blob_removes_link_only() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let data = b"to be unlinked";
        let digest = Digest::of_bytes(Algorithm::Sha256, data);
        let id = bid("ns", "repo", digest.clone());
        store.store_blob(&id, stream_of(data)).await.unwrap();

        store.delete_blob(&id).await.unwrap();
        assert!(matches!(
            store.fetch_blob(&id).await,
            Err(StorageError::NotFound)
        ));
        assert!(dir.path().join("_blobs").join(digest.to_string()).is_file());

        assert!(matches!(
            store.delete_blob(&id).await.unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn session_accumulates_chunks_in_order() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let sid = store.start_session().await.unwrap();
        assert_eq!(store.session_info(sid).await.unwrap(), 0);

        let last = store
            .store_session_data(sid, stream_of(b"hello"), None)
            .await
            .unwrap();
        assert_eq!(last, 4);

        let last = store
            .store_session_data(sid, stream_of(b" world"), Some("5-10"))
            .await
            .unwrap();
        assert_eq!(last, 10);
        assert_eq!(store.session_info(sid).await.unwrap(), 11);

        let err = store
            .store_session_data(sid, stream_of(b"again"), Some("5-10"))
            .await
            .unwrap_err();
        match err {
            StorageError::OutOfOrderChunk { expected, actual } => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected error: {other}"),
        }

        let id = bid("ns", "repo", Digest::of_bytes(Algorithm::Sha256, b"hello world"));
        let closed = store.close_session(sid, &id).await.unwrap();
        assert_eq!(closed, id.digest);

        let (reader, size) = store.fetch_blob(&id).await.unwrap();
        assert_eq!(size, 11);
        assert_eq!(read_all(reader).await, b"hello world");

        // The session file was consumed by the close.
        assert!(matches!(
            store.session_info(sid).await.unwrap_err(),
            StorageError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn session_rejects_malformed_range() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let sid = store.start_session().await.unwrap();

        let err = store
            .store_session_data(sid, stream_of(b"x"), Some("5-"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_session_surfaces_as_session_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let sid = Uuid::new_v4();

        assert!(matches!(
            store.session_info(sid).await.unwrap_err(),
            StorageError::SessionNotFound(_)
        ));
        assert!(matches!(
            store
                .store_session_data(sid, stream_of(b"x"), None)
                .await
                .unwrap_err(),
            StorageError::SessionNotFound(_)
        ));
        let id = bid("ns", "repo", Digest::of_bytes(Algorithm::Sha256, b"x"));
        assert!(matches!(
            store.close_session(sid, &id).await.unwrap_err(),
            StorageError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn store_manifest_writes_expected_files() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let manifest = br#"{"foo":"bar"}"#;
        let digest = Digest::of_bytes(Algorithm::Sha256, manifest);
        let mid = tagged_mid("foo-ns", "bar-repo", "baz-tag", digest.clone());

        store.store_manifest(&mid, stream_of(manifest)).await.unwrap();

        let digs = digest.to_string();
        let expected: BTreeSet<String> = [
            format!("_blobs/{digs}"),
            format!("foo-ns/bar-repo/_blobs/{digs}"),
            "foo-ns/bar-repo/_tags/baz-tag".to_string(),
            format!("foo-ns/bar-repo/{digs}"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files_under(dir.path()), expected);

        let link = std::fs::read_to_string(dir.path().join("foo-ns/bar-repo/_tags/baz-tag")).unwrap();
        assert_eq!(link, digs);
    }

    #[tokio::test]
    async fn store_manifest_rolls_back_on_digest_mismatch() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let manifest = br#"{"some":"manifest"}"#;
        let wrong = Digest::of_bytes(Algorithm::Sha256, b"wrong-digest");
        let mid = tagged_mid("foo-ns", "bar-repo", "baz-tag", wrong);

        let err = store
            .store_manifest(&mid, stream_of(manifest))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("digests don't match"), "{err}");

        // Only the globally deduplicated content file survives the rollback.
        let actual = Digest::of_bytes(Algorithm::Sha256, manifest);
        let expected: BTreeSet<String> = [format!("_blobs/{actual}")].into_iter().collect();
        assert_eq!(files_under(dir.path()), expected);
    }

    #[tokio::test]
    async fn store_manifest_without_digest_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let mid = ManifestId {
            namespace: "foo-ns".to_string(),
            repo: "bar-repo".to_string(),
            tag: Some("baz-tag".to_string()),
            digest: None,
        };

        assert!(store.store_manifest(&mid, stream_of(b"{}")).await.is_err());
        assert!(files_under(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn manifest_fetchable_by_tag_and_digest() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let manifest = br#"{"some":"manifest"}"#;
        let digest = Digest::of_bytes(Algorithm::Sha256, manifest);
        let mid = tagged_mid("ns", "repo", "v1", digest.clone());
        store.store_manifest(&mid, stream_of(manifest)).await.unwrap();

        let repo = RepoPath::new("ns", "repo");
        let by_tag = ManifestId::by_tag(&repo, "v1");
        let by_digest = ManifestId::by_digest(&repo, digest);

        assert!(store.has_manifest(&by_tag).await.unwrap());
        assert!(store.has_manifest(&by_digest).await.unwrap());

        let content = read_all(store.fetch_manifest(&by_tag).await.unwrap()).await;
        assert_eq!(content, manifest);
        let content = read_all(store.fetch_manifest(&by_digest).await.unwrap()).await;
        assert_eq!(content, manifest);

        let missing = ManifestId::by_tag(&repo, "v2");
        assert!(!store.has_manifest(&missing).await.unwrap());
        assert!(matches!(
            store.fetch_manifest(&missing).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_manifest_removes_chosen_indirection() {
        let manifest = br#"{"some":"manifest"}"#;
        let digest = Digest::of_bytes(Algorithm::Sha256, manifest);
        let digs = digest.to_string();
        let repo = RepoPath::new("foo-ns", "bar-repo");

        // Delete by tag: the digest marker stays behind.
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let mid = tagged_mid("foo-ns", "bar-repo", "baz-tag", digest.clone());
        store.store_manifest(&mid, stream_of(manifest)).await.unwrap();
        store
            .delete_manifest(&ManifestId::by_tag(&repo, "baz-tag"))
            .await
            .unwrap();
        let expected: BTreeSet<String> = [
            format!("_blobs/{digs}"),
            format!("foo-ns/bar-repo/_blobs/{digs}"),
            format!("foo-ns/bar-repo/{digs}"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files_under(dir.path()), expected);

        // Delete by digest: the tag link stays behind.
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let mid = tagged_mid("foo-ns", "bar-repo", "another-tag", digest.clone());
        store.store_manifest(&mid, stream_of(manifest)).await.unwrap();
        store
            .delete_manifest(&ManifestId::by_digest(&repo, digest.clone()))
            .await
            .unwrap();
        let expected: BTreeSet<String> = [
            format!("_blobs/{digs}"),
            format!("foo-ns/bar-repo/_blobs/{digs}"),
            "foo-ns/bar-repo/_tags/another-tag".to_string(),
        ]
        .into_iter()
        .collect();
        assert_eq!(files_under(dir.path()), expected);

        assert!(matches!(
            store
                .delete_manifest(&ManifestId::by_tag(&repo, "gone"))
                .await
                .unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn tags_lists_tag_directory() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();

        let manifest = br#"{"some":"manifest"}"#;
        let digest = Digest::of_bytes(Algorithm::Sha256, manifest);
        for tag in ["v1.0", "latest"] {
            let mid = tagged_mid("ns", "repo", tag, digest.clone());
            store.store_manifest(&mid, stream_of(manifest)).await.unwrap();
        }

        let mut tags = store.tags("ns", "repo").await.unwrap();
        tags.sort();
        assert_eq!(tags, vec!["latest".to_string(), "v1.0".to_string()]);

        assert!(matches!(
            store.tags("does-not-exist", "repo").await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
