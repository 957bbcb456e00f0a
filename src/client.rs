use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::models::{
    api_key_from_value, api_keys_from_value, status_report_from_value, ApiKey,
    ExtractionRequest, PollOptions, StatusReport, SubmitResponse, TaskKind, TaskResult,
};
use crate::task::Task;

/// Environment variable read when no host URL is given to the builder.
pub const HOST_URL_ENV: &str = "YT_DLP_HOST_URL";
/// Environment variable read when no API key is given to the builder.
pub const API_KEY_ENV: &str = "YT_DLP_HOST_API_KEY";

const API_KEY_HEADER: &str = "X-API-Key";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Builder for constructing a [`Client`] with custom configuration.
///
/// Nothing here times out unless asked to: requests wait for the server and
/// [`Task::get_result`] polls until the task finishes.
///
/// # Example
///
/// ```no_run
/// use yt_dlp_host_api::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> yt_dlp_host_api::Result<()> {
/// let client = ClientBuilder::new()
///     .host_url("http://localhost:5000")
///     .api_key("your_api_key")
///     .poll_interval(Duration::from_millis(500))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host_url: Option<String>,
    api_key: Option<String>,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            host_url: None,
            api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
            request_timeout: None,
        }
    }

    /// Base URL of the yt-dlp-host server, e.g. `http://localhost:5000`.
    pub fn host_url(mut self, url: impl Into<String>) -> Self {
        self.host_url = Some(url.into());
        self
    }

    /// Key sent in the `X-API-Key` header.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Delay between status polls (defaults to 1 second).
    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    /// Give up polling a task after this long. Unset by default.
    pub fn poll_timeout(mut self, d: Duration) -> Self {
        self.poll_timeout = Some(d);
        self
    }

    /// Per-request HTTP timeout. Unset by default.
    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.request_timeout = Some(d);
        self
    }

    /// Build the [`Client`].
    ///
    /// Missing settings are read from [`HOST_URL_ENV`] and [`API_KEY_ENV`].
    /// Returns [`Error::Configuration`] if either is still missing, the URL
    /// does not parse, or the key cannot be sent as a header.
    pub fn build(self) -> Result<Client> {
        let host_url = self
            .host_url
            .or_else(|| std::env::var(HOST_URL_ENV).ok())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "host URL is required. Pass it to ClientBuilder::host_url() \
                     or set the {HOST_URL_ENV} environment variable."
                ))
            })?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "API key is required. Pass it to ClientBuilder::api_key() \
                     or set the {API_KEY_ENV} environment variable."
                ))
            })?;

        let base_url = Url::parse(host_url.trim_end_matches('/'))
            .map_err(|e| Error::Configuration(format!("invalid host URL {host_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "host URL {host_url:?} cannot carry a path"
            )));
        }

        let mut key_value = HeaderValue::from_str(&api_key)
            .map_err(|_| Error::Configuration("API key contains invalid characters".into()))?;
        key_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key_value);

        let mut http = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        Ok(Client {
            base_url,
            http,
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The yt-dlp-host API client.
///
/// Use [`Client::new`] for quick construction or [`ClientBuilder`] for full
/// control. The client is cheap to clone and safe to share between tasks.
///
/// # Example
///
/// ```no_run
/// use yt_dlp_host_api::Client;
///
/// # async fn example() -> yt_dlp_host_api::Result<()> {
/// let client = Client::new("http://localhost:5000", "your_api_key")?;
///
/// // Submit and wait until the server has the file ready
/// let result = client.fetch_video("https://youtu.be/dQw4w9WgXcQ", Some("720p")).await?;
/// client.save(&result, "video.mp4").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with default settings.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(host_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new()
            .host_url(host_url)
            .api_key(api_key)
            .build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Task submission
    // -----------------------------------------------------------------------

    /// Submit an extraction job and return a handle to it without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::Request`] if the server answers anything but `200`.
    /// - [`Error::Json`] if the answer has no `task_id`.
    pub async fn request_extraction(&self, request: ExtractionRequest) -> Result<Task<'_>> {
        let kind = request.kind();
        let resp: SubmitResponse = self
            .request(Method::POST, &[kind.as_str()], Some(request.body()), StatusCode::OK)
            .await?;
        debug!(task_id = %resp.task_id, %kind, "task submitted");
        Ok(Task::new(self, resp.task_id, kind))
    }

    /// Submit a video download. `None` quality means `"best"`.
    pub async fn submit_video(&self, url: &str, quality: Option<&str>) -> Result<Task<'_>> {
        self.request_extraction(ExtractionRequest::video(url, quality))
            .await
    }

    pub async fn submit_audio(&self, url: &str) -> Result<Task<'_>> {
        self.request_extraction(ExtractionRequest::audio(url)).await
    }

    pub async fn submit_info(&self, url: &str) -> Result<Task<'_>> {
        self.request_extraction(ExtractionRequest::info(url)).await
    }

    /// Submit a video download and poll until the server finishes it.
    pub async fn fetch_video(&self, url: &str, quality: Option<&str>) -> Result<TaskResult> {
        self.submit_video(url, quality).await?.get_result().await
    }

    /// Submit an audio download and poll until the server finishes it.
    pub async fn fetch_audio(&self, url: &str) -> Result<TaskResult> {
        self.submit_audio(url).await?.get_result().await
    }

    /// Submit a metadata extraction and poll until the server finishes it.
    ///
    /// The metadata itself lives in the result file; read it with
    /// [`info_json`](Self::info_json).
    pub async fn fetch_info(&self, url: &str) -> Result<TaskResult> {
        self.submit_info(url).await?.get_result().await
    }

    /// Re-attach to a task submitted earlier, e.g. by another process.
    pub fn task(&self, task_id: impl Into<String>, kind: TaskKind) -> Task<'_> {
        Task::new(self, task_id.into(), kind)
    }

    /// Fetch the current status of a task by its identifier.
    pub async fn task_status(&self, task_id: &str) -> Result<StatusReport> {
        let raw: Value = self
            .request(Method::GET, &["status", task_id], None, StatusCode::OK)
            .await?;
        Ok(status_report_from_value(task_id, raw))
    }

    // -----------------------------------------------------------------------
    // Result files
    // -----------------------------------------------------------------------

    /// Absolute URL of a finished task's file, if the server reported one.
    pub fn file_url(&self, result: &TaskResult) -> Option<String> {
        let file = result.file()?;
        if file.starts_with("http://") || file.starts_with("https://") {
            return Some(file.to_string());
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Some(format!("{}/{}", base, file.trim_start_matches('/')))
    }

    /// Download a finished task's file into memory.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingFile`] if the result carries no file path.
    /// - [`Error::Request`] if the server answers anything but `200`.
    pub async fn download(&self, result: &TaskResult) -> Result<Vec<u8>> {
        let url = self.file_url(result).ok_or_else(|| Error::MissingFile {
            task_id: result.task_id.clone(),
        })?;
        debug!(task_id = %result.task_id, %url, "downloading result file");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status.as_u16(), &text));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Download a finished task's file and write it to `path`.
    ///
    /// Returns the number of bytes written.
    pub async fn save(&self, result: &TaskResult, path: impl AsRef<Path>) -> Result<u64> {
        let bytes = self.download(result).await?;
        tokio::fs::write(path.as_ref(), &bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Download a finished task's file and parse it as JSON.
    ///
    /// Intended for [`TaskKind::Info`] results.
    pub async fn info_json(&self, result: &TaskResult) -> Result<Value> {
        let bytes = self.download(result).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // -----------------------------------------------------------------------
    // API keys
    // -----------------------------------------------------------------------

    /// Ask the server whether the current key holds every one of `permissions`.
    ///
    /// This never fails: a non-`200` answer or a transport error both read
    /// as `false`.
    pub async fn check_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        let permissions: Vec<&str> = permissions.iter().map(|p| p.as_ref()).collect();
        let url = match self.endpoint(&["check_permissions"]) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "permission check skipped");
                return false;
            }
        };
        let body = json!({ "permissions": permissions });

        match self.send(Method::POST, url, Some(&body)).await {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "permission check denied");
                false
            }
            Err(err) => {
                warn!(error = %err, "permission check failed");
                false
            }
        }
    }

    /// Create a key. The server answers `201` with the new record.
    pub async fn create_key<S: AsRef<str>>(&self, name: &str, permissions: &[S]) -> Result<ApiKey> {
        let permissions: Vec<&str> = permissions.iter().map(|p| p.as_ref()).collect();
        let body = json!({ "name": name, "permissions": permissions });
        let raw: Value = self
            .request(Method::POST, &["create_key"], Some(body), StatusCode::CREATED)
            .await?;
        Ok(api_key_from_value(raw, Some(name)))
    }

    /// Delete a key by name and return the server's confirmation.
    pub async fn delete_key(&self, name: &str) -> Result<Value> {
        self.request(Method::DELETE, &["delete_key", name], None, StatusCode::OK)
            .await
    }

    pub async fn get_key(&self, name: &str) -> Result<ApiKey> {
        let raw: Value = self
            .request(Method::GET, &["get_key", name], None, StatusCode::OK)
            .await?;
        Ok(api_key_from_value(raw, Some(name)))
    }

    pub async fn list_keys(&self) -> Result<Vec<ApiKey>> {
        let raw: Value = self
            .request(Method::GET, &["list_keys"], None, StatusCode::OK)
            .await?;
        Ok(api_keys_from_value(raw))
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Polling settings configured on the builder.
    pub(crate) fn poll_options(&self) -> PollOptions {
        PollOptions {
            poll_interval: self.poll_interval,
            timeout: self.poll_timeout,
            on_progress: None,
        }
    }

    /// Append percent-encoded path segments to the host URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Configuration(format!("host URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<reqwest::Response> {
        debug!(%method, %url, "sending request");
        let mut req = self.http.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }
        Ok(req.send().await?)
    }

    /// Send one request and decode the body, mapping any status other than
    /// `expected` to [`Error::Request`]. No retries.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        expected: StatusCode,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.send(method, url, body.as_ref()).await?;

        let status = response.status();
        let text = response.text().await?;

        if status != expected {
            debug!(status = status.as_u16(), "request rejected");
            return Err(Error::from_response(status.as_u16(), &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
