//! Bearer-token authentication extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use docuhub_core::errors::RegistryError;
use docuhub_core::identity::{bearer_token, OwnerId};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Rejects with 401 when the credential is
/// missing or unknown.
pub struct Owner(pub OwnerId);

/// The caller if authenticated. Used by server actions, which report
/// authentication failures inside their envelope.
pub struct MaybeOwner(pub Option<OwnerId>);

async fn resolve(parts: &Parts, state: &AppState) -> Option<OwnerId> {
    let credential = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    state.identity.resolve(credential).await
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await
            .map(Owner)
            .ok_or_else(|| ApiError(RegistryError::unauthorized()))
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for MaybeOwner {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeOwner(resolve(parts, state).await))
    }
}
