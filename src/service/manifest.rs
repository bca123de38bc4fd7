use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{self, HeaderMap, LOCATION};
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;

use crate::error::AppError;
use crate::features;
use crate::state::AppState;
use crate::types::{Algorithm, Digest, ManifestId, RepoPath, TagList};

/// Default media type for manifests that don't carry one.
const DEFAULT_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// PUT `/v2/<name>/manifests/<reference>`.
///
/// The body is read whole (capped by `max_manifest_bytes`), decoded as a
/// JSON object, and checked against the Content-Type header before the
/// transactional store runs.
pub async fn push(
    state: Arc<AppState>,
    mut mid: ManifestId,
    headers: HeaderMap,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let limit = state.config.max_manifest_bytes;
    let mut body: Vec<u8> = Vec::new();
    let mut stream = request.into_body().into_data_stream();
    while let Some(chunk) = stream
        .try_next()
        .await
        .map_err(|e| AppError::Internal(format!("failed reading body: {e}")))?
    {
        body.extend_from_slice(&chunk);
        if body.len() as u64 > limit {
            return Err(AppError::PayloadTooLarge);
        }
    }

    if body.is_empty() {
        return Err(AppError::ManifestInvalid("manifest is empty".to_string()));
    }

    let manifest: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&body)
        .map_err(|_| AppError::ManifestInvalid("failed decoding body".to_string()))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // "mediaType", if it exists, must match the Content-Type header.
    if let Some(media_type) = manifest.get("mediaType") {
        match media_type.as_str() {
            Some(mt) if mt == content_type => {}
            _ => {
                return Err(AppError::bad_request("Content-Type doesn't match mediaType"));
            }
        }
    }
    if content_type.is_empty() {
        return Err(AppError::bad_request("no content-type set"));
    }

    if mid.digest.is_none() {
        mid.digest = Some(Digest::of_bytes(Algorithm::Sha256, &body));
    }

    state
        .storage
        .store_manifest(&mid, Body::from(body).into_data_stream())
        .await?;

    let mut builder = Response::builder().status(StatusCode::CREATED).header(
        LOCATION,
        format!(
            "/v2/{}/{}/manifests/{}",
            mid.namespace,
            mid.repo,
            mid.reference()
        ),
    );
    if state
        .config
        .features
        .enabled(features::SEND_LEGACY_DIGEST_HEADER)
    {
        if let Some(digest) = &mid.digest {
            builder = builder.header("Docker-Content-Digest", digest.to_string());
        }
    }
    Ok(builder.body(Body::empty()).unwrap())
}

/// GET/HEAD `/v2/<name>/manifests/<reference>`.
pub async fn pull(
    state: Arc<AppState>,
    mid: ManifestId,
    headers: HeaderMap,
    head: bool,
) -> Result<Response<Body>, AppError> {
    if !state.storage.has_manifest(&mid).await? {
        tracing::debug!(
            namespace = %mid.namespace,
            repo = %mid.repo,
            reference = %mid.reference(),
            "request for unknown manifest"
        );
        return Err(AppError::not_found("manifest unknown"));
    }

    let mut reader = state.storage.fetch_manifest(&mid).await?;
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .await
        .map_err(|e| AppError::Internal(format!("failed reading manifest from storage: {e}")))?;

    let manifest: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&raw)
        .map_err(|e| AppError::Internal(format!("failed decoding manifest to JSON object: {e}")))?;

    let media_type = manifest
        .get("mediaType")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_MANIFEST_MEDIA_TYPE);

    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    if !accepts(accept, media_type) {
        return Err(AppError::UnsupportedMediaType);
    }

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media_type);
    let response = if head {
        builder.body(Body::empty())
    } else {
        builder.body(Body::from(raw))
    };
    Ok(response.unwrap())
}

/// DELETE `/v2/<name>/manifests/<reference>` — removes the tag link or the
/// digest marker, whichever the reference names.
pub async fn delete(state: Arc<AppState>, mid: ManifestId) -> Result<Response<Body>, AppError> {
    state.storage.delete_manifest(&mid).await?;

    Ok(Response::builder()
        .status(StatusCode::ACCEPTED)
        .body(Body::empty())
        .unwrap())
}

/// GET `/v2/<name>/tags/list` with `n`/`last` pagination.
pub async fn list_tags(
    state: Arc<AppState>,
    repo: RepoPath,
    params: &HashMap<String, String>,
) -> Result<Response<Body>, AppError> {
    let mut tags = state.storage.tags(&repo.namespace, &repo.repo).await?;
    tags.sort();

    if let Some(last) = params.get("last").filter(|l| !l.is_empty()) {
        tags = match tags.iter().position(|t| t == last) {
            Some(i) => tags.split_off(i + 1),
            None => Vec::new(),
        };
    }

    let n = params
        .get("n")
        .and_then(|n| n.parse::<i64>().ok())
        .unwrap_or(-1);
    if n >= 0 {
        tags.truncate(n as usize);
    }

    let body = TagList {
        name: repo.full_name(),
        tags,
    };
    Ok(Json(body).into_response())
}

/// Whether an Accept header admits the offered media type. An absent or
/// empty header admits everything.
fn accepts(header: Option<&str>, offer: &str) -> bool {
    let header = match header {
        None => return true,
        Some(h) if h.trim().is_empty() => return true,
        Some(h) => h,
    };

    for part in header.split(',') {
        let token = part.split(';').next().unwrap_or("").trim();
        if token == "*/*" || token == offer {
            return true;
        }
        if let Some(prefix) = token.strip_suffix("/*") {
            if offer.split('/').next() == Some(prefix) {
                return true;
            }
        }
    }
    false
}
