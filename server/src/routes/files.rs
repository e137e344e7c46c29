//! File access endpoints: listing, signed read URLs and downloads.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docuhub_core::errors::{ErrorKind, RegistryError};
use docuhub_core::files::mime::content_type_for;
use docuhub_core::files::{FileEntry, ObjectKey};
use docuhub_core::storage::{ListOptions, SignedUrl};
use serde::Deserialize;
use tracing::debug;

use crate::auth::Owner;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let options = ListOptions {
        limit: query.limit.unwrap_or(state.list_limit),
        offset: query.offset.unwrap_or(0),
    };
    debug!("list {} {:?}", owner, options);
    let files = state.store.list(&owner, options).await?;
    Ok(Json(files))
}

pub async fn signed_url(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(name): Path<String>,
) -> Result<Json<SignedUrl>, ApiError> {
    let key = ObjectKey::new(&owner, &name)?;
    let url = state.store.signed_url(&key, state.signed_url_ttl).await?;
    Ok(Json(url))
}

pub async fn download(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let key = ObjectKey::new(&owner, &name)?;
    let data = state.store.download(&key).await?;
    Ok(object_response(
        data.bytes,
        content_type_for(&name),
        &format!("attachment; filename=\"{name}\""),
    ))
}

/// Serve an object through a signed URL token. No credential is needed.
pub async fn redeem_signed(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let key = state.signer.redeem(&token).ok_or_else(|| {
        RegistryError::new(ErrorKind::NotFound, "Signed URL is invalid or has expired")
    })?;
    let data = state.store.download(&key).await?;
    Ok(object_response(
        data.bytes,
        &data.content_type,
        &format!("inline; filename=\"{}\"", key.name()),
    ))
}

fn object_response(bytes: Vec<u8>, content_type: &str, disposition: &str) -> Response {
    let mut response = Body::from(bytes).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}
