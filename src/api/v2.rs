use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use uuid::Uuid;

use crate::error::AppError;
use crate::service::{blob, manifest};
use crate::state::AppState;
use crate::types::{BlobId, Digest, ManifestId, RepoPath};
use crate::utils::validation::{is_valid_digest, is_valid_name, is_valid_tag, split_name};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Determine support
        .route("/", get(|| async { StatusCode::OK.into_response() }))
        .route("/{*tail}", any(dispatch))
}

/// Routes every `/v2/...` request by pattern-matching on the path segments.
/// `name` is greedy; namespace and repo are recovered by splitting on the
/// LAST slash. Validation failures never reach a handler.
async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path(tail): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Result<axum::response::Response, AppError> {
    let method = request.method().clone();
    let headers: HeaderMap = request.headers().clone();
    let segments: Vec<&str> = tail.split('/').collect();

    match segments.as_slice() {
        // tail: <name>/manifests/<reference>
        [name @ .., "manifests", reference] if !name.is_empty() => {
            let mid = parse_manifest_path(&name.join("/"), reference)?;
            match method {
                Method::GET => manifest::pull(state, mid, headers, false).await,
                Method::HEAD => manifest::pull(state, mid, headers, true).await,
                Method::PUT => manifest::push(state, mid, headers, request).await,
                Method::DELETE => manifest::delete(state, mid).await,
                _ => Ok(method_not_allowed()),
            }
        }
        // tail: <name>/blobs/uploads/ (trailing slash: open a session)
        [name @ .., "blobs", "uploads", session] if !name.is_empty() && session.is_empty() => {
            let repo = parse_namespace_path(&name.join("/"))?;
            if method == Method::POST {
                blob::start_session(state, repo, &headers).await
            } else {
                Ok(method_not_allowed())
            }
        }
        // tail: <name>/blobs/uploads/<uuid>
        [name @ .., "blobs", "uploads", session] if !name.is_empty() => {
            let repo = parse_namespace_path(&name.join("/"))?;
            let sid = Uuid::parse_str(session)
                .map_err(|_| AppError::bad_request(format!("invalid session ID {session:?}")))?;
            match method {
                Method::PATCH => blob::append_chunk(state, repo, sid, headers, request).await,
                Method::PUT => {
                    blob::close_session(state, repo, sid, &params, headers, request).await
                }
                Method::GET => blob::session_status(state, repo, sid).await,
                _ => Ok(method_not_allowed()),
            }
        }
        // tail: <name>/blobs/<digest>
        [name @ .., "blobs", digest] if !name.is_empty() && *digest != "uploads" => {
            let bid = parse_blob_path(&name.join("/"), digest)?;
            match method {
                Method::GET => blob::pull(state, bid).await,
                Method::DELETE => blob::delete(state, bid).await,
                _ => Ok(method_not_allowed()),
            }
        }
        // tail: <name>/tags/list
        [name @ .., "tags", "list"] if !name.is_empty() => {
            let repo = parse_namespace_path(&name.join("/"))?;
            if method == Method::GET {
                manifest::list_tags(state, repo, &params).await
            } else {
                Ok(method_not_allowed())
            }
        }
        _ => Err(AppError::not_found("not found")),
    }
}

fn method_not_allowed() -> axum::response::Response {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response()
}

/// Namespace-only routes (uploads, tag list) reject bad paths with 400.
fn parse_namespace_path(name: &str) -> Result<RepoPath, AppError> {
    if !is_valid_name(name) {
        return Err(AppError::bad_request("wrong path"));
    }
    split_name(name).ok_or_else(|| AppError::bad_request("failed parsing name"))
}

fn parse_blob_path(name: &str, digest: &str) -> Result<BlobId, AppError> {
    if !is_valid_name(name) || !is_valid_digest(digest) {
        return Err(AppError::bad_request("wrong path"));
    }
    let repo = split_name(name).ok_or_else(|| AppError::bad_request("failed parsing name"))?;
    let digest = Digest::parse(digest).map_err(|e| AppError::bad_request(e.to_string()))?;
    Ok(BlobId::new(&repo, digest))
}

/// Manifest routes answer 404 for malformed paths; the reference is a tag
/// when it matches the tag grammar, a digest when it matches the digest
/// grammar, and invalid otherwise.
fn parse_manifest_path(name: &str, reference: &str) -> Result<ManifestId, AppError> {
    if !is_valid_name(name) {
        return Err(AppError::not_found("wrong name path"));
    }
    let repo = split_name(name).ok_or_else(|| AppError::not_found("failed parsing name"))?;

    if is_valid_tag(reference) {
        return Ok(ManifestId::by_tag(&repo, reference));
    }
    if is_valid_digest(reference) {
        let digest =
            Digest::parse(reference).map_err(|_| AppError::not_found("wrong reference path"))?;
        return Ok(ManifestId::by_digest(&repo, digest));
    }
    Err(AppError::not_found("wrong reference path"))
}
