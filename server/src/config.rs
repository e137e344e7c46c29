//! Server configuration.
//!
//! Settings come from an optional JSON file; command-line flags and
//! `DOCUHUB_*` environment variables override individual fields.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use docuhub_core::identity::{OwnerId, StaticTokenProvider};
use docuhub_core::storage::{DEFAULT_LIST_LIMIT, SIGNED_URL_TTL_SECS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Command-line flags.
#[derive(Parser, Debug, Default)]
#[command(name = "docuhub-server", version, about = "docuhub file access server")]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, env = "DOCUHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:8080
    #[arg(short, long, env = "DOCUHUB_BIND")]
    pub bind: Option<SocketAddr>,

    /// Public base URL used in signed URLs
    #[arg(long, env = "DOCUHUB_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Store files on disk under this directory instead of in memory
    #[arg(long, env = "DOCUHUB_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Bearer tokens as `token=owner,token=owner`
    #[arg(long, env = "DOCUHUB_TOKENS")]
    pub tokens: Option<String>,

    /// Lifetime of signed read URLs in seconds
    #[arg(long, env = "DOCUHUB_SIGNED_URL_TTL_SECS")]
    pub signed_url_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StorageConfig {
    Memory,
    Local { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,
    /// Bearer token → owner id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

/// Longest signed URL lifetime accepted from configuration (7 days).
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_storage() -> StorageConfig {
    StorageConfig::Memory
}

fn default_signed_url_ttl_secs() -> u64 {
    SIGNED_URL_TTL_SECS as u64
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: None,
            storage: default_storage(),
            tokens: HashMap::new(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            list_limit: default_list_limit(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the file named by `cli` (if any) and apply the flag overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        if let Some(url) = &cli.public_url {
            config.public_url = Some(url.clone());
        }
        if let Some(root) = &cli.storage_dir {
            config.storage = StorageConfig::Local { root: root.clone() };
        }
        if let Some(raw) = &cli.tokens {
            config.tokens.extend(parse_token_list(raw)?);
        }
        if let Some(ttl) = cli.signed_url_ttl_secs {
            config.signed_url_ttl_secs = ttl;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signed_url_ttl()?;
        if self.list_limit == 0 {
            return Err(ConfigError::Invalid("listLimit must be positive".into()));
        }
        if let Some(url) = &self.public_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "publicUrl must be an http(s) URL, got {url:?}"
                )));
            }
        }
        self.identity().map(|_| ())
    }

    /// Lifetime of issued signed URLs, bounded to `1..=MAX_SIGNED_URL_TTL_SECS`.
    pub fn signed_url_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if !(1..=MAX_SIGNED_URL_TTL_SECS).contains(&self.signed_url_ttl_secs) {
            return Err(ConfigError::Invalid(format!(
                "signedUrlTtlSecs must be between 1 and {MAX_SIGNED_URL_TTL_SECS}, got {}",
                self.signed_url_ttl_secs
            )));
        }
        i64::try_from(self.signed_url_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "signedUrlTtlSecs out of range: {}",
                    self.signed_url_ttl_secs
                ))
            })
    }

    /// Base URL clients use to reach this server.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind),
        }
    }

    /// Prefix signed URL tokens are appended to.
    pub fn signed_base_url(&self) -> String {
        format!("{}/signed", self.public_url())
    }

    pub fn identity(&self) -> Result<StaticTokenProvider, ConfigError> {
        let mut provider = StaticTokenProvider::default();
        for (token, owner) in &self.tokens {
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid("empty bearer token".into()));
            }
            let owner = OwnerId::parse(owner.as_str())
                .map_err(|e| ConfigError::Invalid(format!("owner for token: {e}")))?;
            provider = provider.with_token(token.clone(), owner);
        }
        Ok(provider)
    }
}

/// Parse `token=owner,token=owner`.
pub fn parse_token_list(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (token, owner) = pair.split_once('=').ok_or_else(|| {
                ConfigError::Invalid(format!("expected token=owner, got {pair:?}"))
            })?;
            Ok((token.trim().to_string(), owner.trim().to_string()))
        })
        .collect()
}
