//! # yt-dlp-host API client
//!
//! Async Rust client for a [yt-dlp-host](https://github.com/Vasysik/yt-dlp-host)
//! server. Submit video, audio, or metadata extraction jobs, poll them until
//! the server finishes, download the produced files, and manage API keys.
//!
//! ## Quick start
//!
//! ```no_run
//! use yt_dlp_host_api::Client;
//!
//! #[tokio::main]
//! async fn main() -> yt_dlp_host_api::Result<()> {
//!     let client = Client::new("http://localhost:5000", "your_api_key")?;
//!
//!     // Submit and wait for the server to finish
//!     let info = client.fetch_info("https://youtu.be/dQw4w9WgXcQ").await?;
//!     let json = client.info_json(&info).await?;
//!     println!("Title: {}", json["title"]);
//!
//!     // Or keep the handle and poll later
//!     let task = client.submit_audio("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("Task {} submitted", task.id());
//!     let audio = task.get_result().await?;
//!     client.save(&audio, "audio.m4a").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key management
//!
//! ```no_run
//! # async fn example(client: yt_dlp_host_api::Client) -> yt_dlp_host_api::Result<()> {
//! if client.check_permissions(&["create_key"]).await {
//!     let key = client.create_key("bot1", &["get_video", "get_info"]).await?;
//!     println!("{} -> {:?}", key.name, key.key);
//! }
//! for key in client.list_keys().await? {
//!     println!("{}: {}", key.name, key.permissions.join(", "));
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod errors;
mod models;
mod task;

pub use client::{Client, ClientBuilder, API_KEY_ENV, HOST_URL_ENV};
pub use errors::{Error, Result, UNKNOWN_ERROR};
pub use models::{
    ApiKey, ExtractionRequest, PollOptions, StatusReport, TaskKind, TaskResult, TaskState,
    TaskStatus, DEFAULT_QUALITY,
};
pub use task::Task;
