//! [`FileApi`] over the server's HTTP endpoints.

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::api::{FileApi, ProgressFn};
use crate::errors::{ErrorKind, RegistryError};
use crate::files::mime::effective_content_type;
use crate::files::FileEntry;
use crate::intake::{IncomingFile, Intake};
use crate::protocol::{ApiEnvelope, ErrorBody};
use crate::storage::{ListOptions, ObjectData, SignedUrl};

/// Upload bodies are streamed in chunks of this size so progress can be
/// reported as they are sent.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub struct HttpFileApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpFileApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`. `token`
    /// is sent as a bearer credential on every request.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RegistryError> {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, RegistryError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            RegistryError::invalid_input(format!("Invalid server URL {base_url:?}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::invalid_input(format!(
                "Server URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Join percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::invalid_input("Server URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn action(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<FileEntry, RegistryError> {
        let response = self
            .request(Method::POST, self.url(&["actions", path])?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        match response.json::<ApiEnvelope<FileEntry>>().await {
            Ok(envelope) => envelope.into_result(),
            Err(_) => Err(RegistryError::new(
                ErrorKind::from_status(status),
                format!("Request failed with status {status}"),
            )),
        }
    }
}

fn transport_error(e: reqwest::Error) -> RegistryError {
    RegistryError::unknown(format!("Network error: {e}"))
}

/// Classify a non-success response from its `{error, errorKind}` body, or
/// from the status alone when the body is not JSON.
async fn error_from(response: Response) -> RegistryError {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.into_error(status),
        Err(_) => RegistryError::new(
            ErrorKind::from_status(status),
            format!("Request failed with status {status}"),
        ),
    }
}

async fn json_or_error<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    response.json::<T>().await.map_err(transport_error)
}

#[async_trait::async_trait]
impl FileApi for HttpFileApi {
    async fn list(&self, options: ListOptions) -> Result<Vec<FileEntry>, RegistryError> {
        let mut url = self.url(&["files"])?;
        url.query_pairs_mut()
            .append_pair("limit", &options.limit.to_string())
            .append_pair("offset", &options.offset.to_string());
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        json_or_error(response).await
    }

    async fn signed_url(&self, name: &str) -> Result<SignedUrl, RegistryError> {
        let response = self
            .request(Method::GET, self.url(&["files", name])?)
            .send()
            .await
            .map_err(transport_error)?;
        json_or_error(response).await
    }

    async fn download(&self, name: &str) -> Result<ObjectData, RegistryError> {
        let response = self
            .request(Method::GET, self.url(&["files", name, "download"])?)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(transport_error)?.to_vec();
        Ok(ObjectData {
            content_type: effective_content_type(content_type.as_deref(), name),
            bytes,
        })
    }

    async fn delete(&self, name: &str) -> Result<FileEntry, RegistryError> {
        self.action("delete-file", json!({ "name": name })).await
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<FileEntry, RegistryError> {
        self.action("rename-file", json!({ "name": name, "newName": new_name }))
            .await
    }

    async fn upload(
        &self,
        file: IncomingFile,
        intake: Intake,
        progress: ProgressFn,
    ) -> Result<FileEntry, RegistryError> {
        let total = file.bytes.len();
        let content_type = effective_content_type(file.content_type.as_deref(), &file.name);
        let chunks: Vec<Vec<u8>> = file
            .bytes
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();

        let reporter = progress.clone();
        let mut sent = 0usize;
        let body = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len();
            // 100 is reported only once the server has answered.
            reporter((sent * 99 / total.max(1)) as u8);
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total as u64)
            .file_name(file.name.clone())
            .mime_str(&content_type)
            .map_err(transport_error)?;
        let form = Form::new().part("file", part);

        progress(0);
        let path = intake.path().trim_start_matches('/');
        let response = self
            .request(Method::POST, self.url(&[path])?)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let entry: FileEntry = json_or_error(response).await?;
        progress(100);
        Ok(entry)
    }
}
