//! Quick-start examples for the yt-dlp-host Rust client.
//!
//! Run with:
//!   YT_DLP_HOST_URL=http://localhost:5000 YT_DLP_HOST_API_KEY=... \
//!     cargo run --example quickstart
//!
//! Set `RUST_LOG=yt_dlp_host_api=debug` to see every request and poll.

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use yt_dlp_host_api::{ClientBuilder, PollOptions};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::main]
async fn main() -> yt_dlp_host_api::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // 1. Create a client (reads host URL and key from the environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().build()?;

    // Or provide them directly:
    // let client = yt_dlp_host_api::Client::new("http://localhost:5000", "your_api_key")?;

    // -----------------------------------------------------------------------
    // 2. Check what this key may do
    // -----------------------------------------------------------------------
    for permission in ["get_video", "get_audio", "get_info", "create_key"] {
        let allowed = client.check_permissions(&[permission]).await;
        println!("{permission}: {}", if allowed { "yes" } else { "no" });
    }
    println!();

    // -----------------------------------------------------------------------
    // 3. Fetch metadata (submit + poll until complete)
    // -----------------------------------------------------------------------
    let info = client.fetch_info(VIDEO_URL).await?;
    let json = client.info_json(&info).await?;
    println!("Title: {}", json["title"]);
    println!("Duration: {}s", json["duration"]);
    println!();

    // -----------------------------------------------------------------------
    // 4. Download audio with a progress callback
    // -----------------------------------------------------------------------
    let task = client.submit_audio(VIDEO_URL).await?;
    println!("Submitted audio task {}", task.id());

    let opts = PollOptions {
        poll_interval: Duration::from_secs(2),
        timeout: Some(Duration::from_secs(600)),
        on_progress: Some(Box::new(|report| {
            println!("  Status: {}", report.status.as_str());
        })),
    };
    let audio = task.get_result_with(&opts).await?;
    let written = client.save(&audio, "audio.m4a").await?;
    println!("Saved {written} bytes to audio.m4a");
    println!();

    // -----------------------------------------------------------------------
    // 5. Video at a fixed quality, file left on the server
    // -----------------------------------------------------------------------
    let video = client.fetch_video(VIDEO_URL, Some("720p")).await?;
    if let Some(url) = client.file_url(&video) {
        println!("Video ready at {url}");
    }
    println!();

    // -----------------------------------------------------------------------
    // 6. List keys
    // -----------------------------------------------------------------------
    for key in client.list_keys().await? {
        println!("  {} | {}", key.name, key.permissions.join(", "));
    }

    Ok(())
}
