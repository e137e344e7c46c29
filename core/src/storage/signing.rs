//! Signed URL issuing for the built-in storage backends.
//!
//! A grant maps an opaque random token to one object key until it expires.
//! Tokens are reusable until then; the server redeems them on
//! `GET /signed/{token}` without any other credential.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::SignedUrl;
use crate::files::ObjectKey;

struct Grant {
    key: ObjectKey,
    expires_at: DateTime<Utc>,
}

pub struct UrlSigner {
    base_url: String,
    grants: Mutex<HashMap<String, Grant>>,
}

impl UrlSigner {
    /// `base_url` is the public prefix the token is appended to, e.g.
    /// `http://localhost:8080/signed`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            grants: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, key: &ObjectKey, ttl: Duration) -> SignedUrl {
        self.issue_at(key, ttl, Utc::now())
    }

    fn issue_at(&self, key: &ObjectKey, ttl: Duration, now: DateTime<Utc>) -> SignedUrl {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = now + ttl;

        let mut grants = self.grants.lock().unwrap_or_else(|p| p.into_inner());
        grants.retain(|_, grant| grant.expires_at > now);
        grants.insert(
            token.clone(),
            Grant {
                key: key.clone(),
                expires_at,
            },
        );
        debug!("Issued signed url for {} until {}", key, expires_at);

        SignedUrl {
            signed_url: format!("{}/{}", self.base_url, token),
            expires_at,
        }
    }

    /// Resolve a token to its object key if it has not expired.
    pub fn redeem(&self, token: &str) -> Option<ObjectKey> {
        self.redeem_at(token, Utc::now())
    }

    fn redeem_at(&self, token: &str, now: DateTime<Utc>) -> Option<ObjectKey> {
        let mut grants = self.grants.lock().unwrap_or_else(|p| p.into_inner());
        match grants.get(token) {
            Some(grant) if grant.expires_at > now => Some(grant.key.clone()),
            Some(_) => {
                grants.remove(token);
                None
            }
            None => None,
        }
    }

    /// Number of grants currently held, expired or not.
    pub fn grant_count(&self) -> usize {
        self.grants.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
