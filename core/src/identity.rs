//! Owner identities and the providers that resolve them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated user.
///
/// Used verbatim as the storage namespace prefix, so only ASCII letters,
/// digits, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err("owner id must not be empty".to_string());
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!("owner id contains unsupported character {c:?}"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

/// Resolves a request credential to an owner, or `None` when the caller
/// is not authenticated.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credential: Option<&str>) -> Option<OwnerId>;
}

/// Identity provider backed by a fixed bearer-token table.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, OwnerId>,
}

impl StaticTokenProvider {
    pub fn new(tokens: HashMap<String, OwnerId>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, owner: OwnerId) -> Self {
        self.tokens.insert(token.into(), owner);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, credential: Option<&str>) -> Option<OwnerId> {
        let token = credential?;
        self.tokens.get(token).cloned()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
