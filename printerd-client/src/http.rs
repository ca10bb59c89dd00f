//! HTTP client for the printerd API

use crate::{ClientConfig, ClientError, ClientResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use shared::{ApiResult, ConnectionStatus, Job, Printer};
use std::path::Path;
use std::time::Duration;

/// Multipart field the daemon reads print files from
const PRINT_FIELD: &str = "printfile";

/// Typed client for a printerd daemon
#[derive(Debug, Clone)]
pub struct PrinterdClient {
    client: Client,
    base_url: Url,
}

impl PrinterdClient {
    /// Client with the default 30s timeout
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        Self::from_config(&ClientConfig::new(base_url).with_timeout(timeout))
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus percent-encoded path segments
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn printer_url(&self, id: &str, rest: &[&str]) -> ClientResult<Url> {
        let mut segments = vec!["api", "v1", "printers", id];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    async fn send(&self, method: Method, url: Url) -> ClientResult<Response> {
        tracing::debug!(%method, %url, "Sending request");
        Ok(self.client.request(method, url).send().await?)
    }

    /// Decode the envelope; an `error` string becomes [`ClientError::Api`]
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<Option<T>> {
        let status = response.status();
        let body = response.bytes().await?;

        let envelope: ApiResult<T> = serde_json::from_slice(&body).map_err(|e| {
            if status.is_success() {
                ClientError::Serialization(e)
            } else {
                ClientError::InvalidResponse(format!(
                    "{}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ))
            }
        })?;

        envelope
            .into_result()
            .map_err(|message| ClientError::Api { status, message })
    }

    async fn required<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        Self::handle_response(response)
            .await?
            .ok_or_else(|| ClientError::InvalidResponse("missing result".to_string()))
    }

    /// Commands answer `{"result":true}` on success
    async fn command(&self, method: Method, url: Url) -> ClientResult<()> {
        let response = self.send(method, url).await?;
        Self::required::<bool>(response).await.map(|_| ())
    }

    // ========== Printers ==========

    /// Connected printers
    pub async fn printers(&self) -> ClientResult<Vec<Printer>> {
        let url = self.url(&["api", "v1", "printers"])?;
        Self::required(self.send(Method::GET, url).await?).await
    }

    /// Printer by serial or machine name
    pub async fn printer(&self, id: &str) -> ClientResult<Printer> {
        let url = self.printer_url(id, &[])?;
        Self::required(self.send(Method::GET, url).await?).await
    }

    /// Raw camera frame
    pub async fn snapshot(&self, id: &str) -> ClientResult<Vec<u8>> {
        let url = self.printer_url(id, &["snapshot.jpg"])?;
        let response = self.send(Method::GET, url).await?;
        if !response.status().is_success() {
            Self::handle_response::<serde_json::Value>(response).await?;
            return Err(ClientError::InvalidResponse("expected an image".to_string()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Current job; `None` when idle or when the printer has not reported
    /// any state yet
    pub async fn current_job(&self, id: &str) -> ClientResult<Option<Job>> {
        let url = self.printer_url(id, &["current_job"])?;
        let response = self.send(Method::GET, url).await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Bare `null` before the printer reports metadata
        if status.is_success() && serde_json::from_slice::<serde_json::Value>(&body)?.is_null() {
            return Ok(None);
        }

        let envelope: ApiResult<Job> = serde_json::from_slice(&body)?;
        envelope
            .into_result()
            .map_err(|message| ClientError::Api { status, message })
    }

    pub async fn suspend_current_job(&self, id: &str) -> ClientResult<()> {
        let url = self.printer_url(id, &["current_job", "suspend"])?;
        self.command(Method::POST, url).await
    }

    pub async fn resume_current_job(&self, id: &str) -> ClientResult<()> {
        let url = self.printer_url(id, &["current_job", "resume"])?;
        self.command(Method::POST, url).await
    }

    pub async fn cancel_current_job(&self, id: &str) -> ClientResult<()> {
        let url = self.printer_url(id, &["current_job"])?;
        self.command(Method::DELETE, url).await
    }

    /// Upload and start the print file at `path`
    pub async fn print(&self, id: &str, path: impl AsRef<Path>) -> ClientResult<()> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file: {}", path.display()),
                )
            })?;
        let data = tokio::fs::read(path).await?;
        self.print_bytes(id, &filename, data).await
    }

    /// Upload and start a print file held in memory
    pub async fn print_bytes(&self, id: &str, filename: &str, data: Vec<u8>) -> ClientResult<()> {
        let url = self.printer_url(id, &["prints"])?;
        let size = data.len();
        let form = Form::new().part(PRINT_FIELD, Part::bytes(data).file_name(filename.to_string()));

        tracing::debug!(printer = %id, filename = %filename, size, "Uploading print");
        let response = self.client.post(url).multipart(form).send().await?;
        Self::required::<bool>(response).await.map(|_| ())
    }

    pub async fn load_filament(&self, id: &str, tool_index: u32) -> ClientResult<()> {
        let tool = tool_index.to_string();
        let url = self.printer_url(id, &["load_filament", tool.as_str()])?;
        self.command(Method::POST, url).await
    }

    pub async fn unload_filament(&self, id: &str, tool_index: u32) -> ClientResult<()> {
        let tool = tool_index.to_string();
        let url = self.printer_url(id, &["unload_filament", tool.as_str()])?;
        self.command(Method::POST, url).await
    }

    // ========== Daemon ==========

    /// Supervisor state of every configured printer
    pub async fn connections(&self) -> ClientResult<Vec<ConnectionStatus>> {
        let url = self.url(&["api", "v1", "connections"])?;
        Self::required(self.send(Method::GET, url).await?).await
    }
}
