use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// Quality sent with video requests when the caller does not pick one.
pub const DEFAULT_QUALITY: &str = "best";

/// The three kinds of extraction job the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Video,
    Audio,
    Info,
}

impl TaskKind {
    /// Wire name, which is also the submission endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Video => "get_video",
            TaskKind::Audio => "get_audio",
            TaskKind::Info => "get_info",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission for [`Client::request_extraction`](crate::Client::request_extraction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRequest {
    Video { url: String, quality: String },
    Audio { url: String },
    Info { url: String },
}

impl ExtractionRequest {
    /// Video request; `None` quality means [`DEFAULT_QUALITY`].
    pub fn video(url: impl Into<String>, quality: Option<&str>) -> Self {
        ExtractionRequest::Video {
            url: url.into(),
            quality: quality.unwrap_or(DEFAULT_QUALITY).to_string(),
        }
    }

    pub fn audio(url: impl Into<String>) -> Self {
        ExtractionRequest::Audio { url: url.into() }
    }

    pub fn info(url: impl Into<String>) -> Self {
        ExtractionRequest::Info { url: url.into() }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            ExtractionRequest::Video { .. } => TaskKind::Video,
            ExtractionRequest::Audio { .. } => TaskKind::Audio,
            ExtractionRequest::Info { .. } => TaskKind::Info,
        }
    }

    /// JSON body for the submission endpoint.
    pub(crate) fn body(&self) -> Value {
        match self {
            ExtractionRequest::Video { url, quality } => {
                serde_json::json!({ "url": url, "quality": quality })
            }
            ExtractionRequest::Audio { url } | ExtractionRequest::Info { url } => {
                serde_json::json!({ "url": url })
            }
        }
    }
}

/// Status string reported by `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Waiting,
    Processing,
    Completed,
    Error,
    /// Anything else the server sends. Treated as still running.
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::Other(s) => s,
        }
    }

    pub fn state(&self) -> TaskState {
        match self {
            TaskStatus::Completed => TaskState::Succeeded,
            TaskStatus::Error => TaskState::Failed,
            _ => TaskState::Pending,
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "waiting" => TaskStatus::Waiting,
            "processing" => TaskStatus::Processing,
            "completed" => TaskStatus::Completed,
            "error" => TaskStatus::Error,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

/// Client-side view of where a task is. Only ever observed, never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Succeeded or Failed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

/// One answer from the status endpoint.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub task_id: String,
    pub status: TaskStatus,
    /// Server-relative path of the result file, once there is one.
    pub file: Option<String>,
    /// Failure message for tasks in the `error` state.
    pub error: Option<String>,
    /// Full API response JSON.
    pub raw: Value,
}

impl StatusReport {
    pub fn state(&self) -> TaskState {
        self.status.state()
    }
}

/// Returned by [`Task::get_result`](crate::Task::get_result) and the
/// `fetch_*` helpers once a task completes.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    pub kind: TaskKind,
    /// Server-relative path of the produced file.
    pub file: Option<String>,
    /// The final status JSON, exactly as the server sent it.
    pub raw: Value,
}

impl TaskResult {
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

/// A server-held API key and its permissions.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKey {
    pub name: String,
    pub permissions: Vec<String>,
    /// The secret itself. Only some endpoints return it.
    pub key: Option<String>,
    /// Full API response JSON.
    pub raw: Value,
}

/// Polling config for [`Task::get_result_with`](crate::Task::get_result_with).
pub struct PollOptions {
    /// Default: 1s.
    pub poll_interval: Duration,
    /// Default: none, poll until the task finishes.
    pub timeout: Option<Duration>,
    /// Called with every status report, terminal ones included.
    #[allow(clippy::type_complexity)]
    pub on_progress: Option<Box<dyn Fn(&StatusReport) + Send + Sync>>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: None,
            on_progress: None,
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Internal deserialization helpers (not part of the public API surface)
// ---------------------------------------------------------------------------

/// POST /get_video, /get_audio, /get_info response.
#[derive(Deserialize)]
pub(crate) struct SubmitResponse {
    pub task_id: String,
}

pub(crate) fn json_str_opt(val: &Value, key: &str) -> Option<String> {
    val.get(key).and_then(|v| v.as_str()).map(String::from)
}

pub(crate) fn status_report_from_value(task_id: &str, val: Value) -> StatusReport {
    let status = val
        .get("status")
        .and_then(|v| v.as_str())
        .map(TaskStatus::from)
        .unwrap_or_else(|| TaskStatus::Other(String::new()));

    StatusReport {
        task_id: task_id.to_string(),
        status,
        file: json_str_opt(&val, "file"),
        error: json_str_opt(&val, "error"),
        raw: val,
    }
}

/// Parse one key record. `fallback_name` covers responses that omit the name,
/// such as `get_key` and the map form of `list_keys`.
pub(crate) fn api_key_from_value(val: Value, fallback_name: Option<&str>) -> ApiKey {
    let permissions = val
        .get("permissions")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| p.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    ApiKey {
        name: json_str_opt(&val, "name")
            .or_else(|| fallback_name.map(String::from))
            .unwrap_or_default(),
        permissions,
        key: json_str_opt(&val, "key"),
        raw: val,
    }
}

/// Accepts a bare array of records, a `{"keys": ...}` wrapper, or a map of
/// name to record.
pub(crate) fn api_keys_from_value(val: Value) -> Vec<ApiKey> {
    match val {
        Value::Array(items) => items
            .into_iter()
            .map(|item| api_key_from_value(item, None))
            .collect(),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove("keys") {
                return api_keys_from_value(inner);
            }
            map.into_iter()
                .map(|(name, item)| api_key_from_value(item, Some(&name)))
                .collect()
        }
        _ => Vec::new(),
    }
}
