use std::time::Duration;

use wiremock::MockServer;
use yt_dlp_host_api::{Client, ClientBuilder};

pub const API_KEY: &str = "test_key";

/// Client pointed at the mock server with a fast poll cadence.
pub fn client(server: &MockServer) -> Client {
    ClientBuilder::new()
        .host_url(server.uri())
        .api_key(API_KEY)
        .poll_interval(Duration::from_millis(10))
        .build()
        .expect("client should build")
}
