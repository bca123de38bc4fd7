use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{self, HeaderMap, LOCATION, RANGE};
use axum::http::{Response, StatusCode};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::error::AppError;
use crate::features;
use crate::state::AppState;
use crate::storage::StorageError;
use crate::types::{BlobId, Digest, RepoPath};

const OCTET_STREAM: &str = "application/octet-stream";

fn upload_location(repo: &RepoPath, sid: Uuid) -> String {
    format!("/v2/{}/{}/blobs/uploads/{}", repo.namespace, repo.repo, sid)
}

fn blob_location(repo: &RepoPath, digest: &Digest) -> String {
    format!("/v2/{}/{}/blobs/{}", repo.namespace, repo.repo, digest)
}

/// POST `/v2/<name>/blobs/uploads/` — open an upload session.
pub async fn start_session(
    state: Arc<AppState>,
    repo: RepoPath,
    headers: &HeaderMap,
) -> Result<Response<Body>, AppError> {
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    if content_length != 0 {
        tracing::debug!(content_length, "POST request with non-zero content length");
    }

    let sid = state.storage.start_session().await?;

    Ok(Response::builder()
        .status(StatusCode::ACCEPTED)
        .header(LOCATION, upload_location(&repo, sid))
        .body(Body::empty())
        .unwrap())
}

/// PATCH `/v2/<name>/blobs/uploads/<uuid>` — append one chunk.
pub async fn append_chunk(
    state: Arc<AppState>,
    repo: RepoPath,
    sid: Uuid,
    headers: HeaderMap,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.is_empty() && content_type != OCTET_STREAM {
        return Err(AppError::bad_request(format!(
            "content-type must be '{OCTET_STREAM}' but is {content_type:?}"
        )));
    }

    if headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        == Some(0)
    {
        return Err(AppError::bad_request("no data in request body"));
    }

    let content_range = headers
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let last = state
        .storage
        .store_session_data(
            sid,
            request.into_body().into_data_stream(),
            content_range.as_deref(),
        )
        .await?;

    Ok(Response::builder()
        .status(StatusCode::ACCEPTED)
        .header(LOCATION, upload_location(&repo, sid))
        .header(RANGE, format!("0-{last}"))
        .body(Body::empty())
        .unwrap())
}

/// PUT `/v2/<name>/blobs/uploads/<uuid>` — append any trailing bytes, then
/// turn the session into a content-addressed blob.
pub async fn close_session(
    state: Arc<AppState>,
    repo: RepoPath,
    sid: Uuid,
    params: &HashMap<String, String>,
    headers: HeaderMap,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let digest = params
        .get("digest")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::bad_request("'digest' query parameter missing"))?;
    let digest = Digest::parse(digest).map_err(|e| AppError::bad_request(e.to_string()))?;

    let content_range = headers
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Save the final chunk, unless the client declared an empty body.
    let empty_body = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        == Some(0);
    if !empty_body {
        state
            .storage
            .store_session_data(
                sid,
                request.into_body().into_data_stream(),
                content_range.as_deref(),
            )
            .await?;
    }

    let bid = BlobId::new(&repo, digest);
    let stored = state.storage.close_session(sid, &bid).await?;

    let mut builder = Response::builder()
        .status(StatusCode::CREATED)
        .header(LOCATION, blob_location(&repo, &stored));
    if state
        .config
        .features
        .enabled(features::SEND_LEGACY_DIGEST_HEADER)
    {
        builder = builder.header("Docker-Content-Digest", stored.to_string());
    }
    Ok(builder.body(Body::empty()).unwrap())
}

/// GET `/v2/<name>/blobs/uploads/<uuid>` — report upload progress.
pub async fn session_status(
    state: Arc<AppState>,
    repo: RepoPath,
    sid: Uuid,
) -> Result<Response<Body>, AppError> {
    let size = state.storage.session_info(sid).await?;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(LOCATION, upload_location(&repo, sid))
        .header(RANGE, format!("0-{}", size as i64 - 1))
        .body(Body::empty())
        .unwrap())
}

/// GET `/v2/<name>/blobs/<digest>` — stream the blob back.
pub async fn pull(state: Arc<AppState>, bid: BlobId) -> Result<Response<Body>, AppError> {
    let (reader, size) = state.storage.fetch_blob(&bid).await.map_err(|e| match e {
        StorageError::NotFound => AppError::BlobUnknown(bid.digest.to_string()),
        other => AppError::from(other),
    })?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, OCTET_STREAM)
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(ReaderStream::new(reader)))
        .unwrap())
}

/// DELETE `/v2/<name>/blobs/<digest>` — unlink the blob from the repo.
pub async fn delete(state: Arc<AppState>, bid: BlobId) -> Result<Response<Body>, AppError> {
    state.storage.delete_blob(&bid).await.map_err(|e| match e {
        StorageError::NotFound => AppError::BlobUnknown(bid.digest.to_string()),
        other => AppError::from(other),
    })?;

    Ok(Response::builder()
        .status(StatusCode::ACCEPTED)
        .body(Body::empty())
        .unwrap())
}
