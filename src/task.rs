use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::client::Client;
use crate::errors::{Error, Result, UNKNOWN_ERROR};
use crate::models::{PollOptions, StatusReport, TaskKind, TaskResult, TaskState};

/// Handle to one job running on the server.
///
/// Obtained from [`Client::request_extraction`] or one of the `submit_*`
/// helpers. The handle holds nothing but the server-issued id; all state is
/// read back through the status endpoint.
#[derive(Debug, Clone)]
pub struct Task<'a> {
    client: &'a Client,
    id: String,
    kind: TaskKind,
}

impl<'a> Task<'a> {
    pub(crate) fn new(client: &'a Client, id: String, kind: TaskKind) -> Self {
        Self { client, id, kind }
    }

    /// The `task_id` exactly as the server issued it.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// One status round trip.
    pub async fn status(&self) -> Result<StatusReport> {
        self.client.task_status(&self.id).await
    }

    /// Poll with the client's configured interval and deadline until the task
    /// finishes.
    pub async fn get_result(&self) -> Result<TaskResult> {
        let opts = self.client.poll_options();
        self.get_result_with(&opts).await
    }

    /// Poll until the task reaches a terminal state.
    ///
    /// # Errors
    ///
    /// - [`Error::Request`] with the server's message if the task ends in
    ///   `error`, or if a status request is rejected.
    /// - [`Error::Timeout`] only when `opts.timeout` is set and passes.
    pub async fn get_result_with(&self, opts: &PollOptions) -> Result<TaskResult> {
        let deadline: Option<(Instant, Duration)> =
            opts.timeout.map(|timeout| (Instant::now() + timeout, timeout));

        loop {
            let report = self.status().await?;
            debug!(task_id = %self.id, status = report.status.as_str(), "polled task");

            if let Some(ref cb) = opts.on_progress {
                cb(&report);
            }

            match report.state() {
                TaskState::Succeeded => {
                    return Ok(TaskResult {
                        task_id: self.id.clone(),
                        kind: self.kind,
                        file: report.file,
                        raw: report.raw,
                    });
                }
                TaskState::Failed => {
                    return Err(Error::Request {
                        status_code: None,
                        message: report.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
                    });
                }
                TaskState::Pending => {}
            }

            if let Some((at, timeout)) = deadline {
                if Instant::now() >= at {
                    return Err(Error::Timeout(timeout));
                }
            }

            tokio::time::sleep(opts.poll_interval).await;
        }
    }
}
