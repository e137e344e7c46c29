//! Shared helpers for docuhub server integration tests.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use docuhub_core::identity::OwnerId;
use docuhub_core::intake::IncomingFile;
use docuhub_core::registry::http::HttpFileApi;
use docuhub_core::registry::{FileApi, FileRegistry, Notice};
use docuhub_server::config::ServerConfig;
use docuhub_server::{build_router, AppState};
use tokio::sync::mpsc;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

/// Start the real router on an ephemeral port with in-memory storage.
pub async fn spawn_server() -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        bind: addr,
        tokens: HashMap::from([
            (ALICE_TOKEN.to_string(), "alice".to_string()),
            (BOB_TOKEN.to_string(), "bob".to_string()),
        ]),
        ..Default::default()
    };
    let state = AppState::from_config(&config).unwrap();
    let router = build_router(state.clone());
    tokio::spawn(async move { axum::serve(listener, router).await });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn api(&self, token: Option<&str>) -> Arc<dyn FileApi> {
        Arc::new(HttpFileApi::new(&self.base_url, token.map(str::to_string)).unwrap())
    }

    /// A registry for `owner` talking to this server over HTTP.
    pub fn registry(
        &self,
        owner: &str,
        token: &str,
    ) -> (FileRegistry, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = FileRegistry::new(self.api(Some(token)), OwnerId::parse(owner).unwrap(), tx);
        (registry, rx)
    }
}

pub fn pdf(name: &str) -> IncomingFile {
    IncomingFile {
        name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n".to_vec(),
    }
}
