mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yt_dlp_host_api::{Error, ExtractionRequest, PollOptions, TaskKind, TaskState, UNKNOWN_ERROR};

async fn mount_status(server: &MockServer, task_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/status/{task_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn submit_video_sends_url_and_quality() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video"))
        .and(header("X-API-Key", common::API_KEY))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({ "url": "https://x/y", "quality": "720p" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let task = client.submit_video("https://x/y", Some("720p")).await.unwrap();

    assert_eq!(task.id(), "abc123");
    assert_eq!(task.kind(), TaskKind::Video);
}

#[tokio::test]
async fn submit_video_defaults_to_best() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video"))
        .and(body_json(json!({ "url": "https://x/y", "quality": "best" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "t1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let task = client.submit_video("https://x/y", None).await.unwrap();
    assert_eq!(task.id(), "t1");
}

#[tokio::test]
async fn audio_and_info_send_url_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_audio"))
        .and(body_json(json!({ "url": "https://a" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "aud" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get_info"))
        .and(body_json(json!({ "url": "https://i" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "inf" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);

    let audio = client.submit_audio("https://a").await.unwrap();
    assert_eq!((audio.id(), audio.kind()), ("aud", TaskKind::Audio));

    let info = client
        .request_extraction(ExtractionRequest::info("https://i"))
        .await
        .unwrap();
    assert_eq!((info.id(), info.kind()), ("inf", TaskKind::Info));
}

#[tokio::test]
async fn submission_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_audio"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "forbidden" })))
        .mount(&server)
        .await;

    let client = common::client(&server);
    let err = client.submit_audio("https://a").await.unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.message(), Some("forbidden"));
}

#[tokio::test]
async fn submission_rejection_with_html_body_uses_default_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_info"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = common::client(&server);
    let err = client.submit_info("https://i").await.unwrap_err();

    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.message(), Some(UNKNOWN_ERROR));
}

#[tokio::test]
async fn submission_without_task_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let client = common::client(&server);
    let err = client.submit_info("https://i").await.unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_video_returns_completed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "abc123" })))
        .mount(&server)
        .await;
    let payload = json!({
        "status": "completed",
        "task_type": "get_video",
        "file": "/files/abc123/video.mp4"
    });
    mount_status(&server, "abc123", payload.clone()).await;

    let client = common::client(&server);
    let result = client.fetch_video("https://x/y", None).await.unwrap();

    assert_eq!(result.task_id, "abc123");
    assert_eq!(result.kind, TaskKind::Video);
    assert_eq!(result.file(), Some("/files/abc123/video.mp4"));
    assert_eq!(result.raw, payload);
}

#[tokio::test]
async fn get_result_polls_until_completed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "waiting" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_status(
        &server,
        "slow",
        json!({ "status": "completed", "file": "/files/slow/audio.m4a" }),
    )
    .await;

    let client = common::client(&server);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let opts = PollOptions {
        poll_interval: Duration::from_millis(5),
        on_progress: Some(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..PollOptions::default()
    };

    let result = client
        .task("slow", TaskKind::Audio)
        .get_result_with(&opts)
        .await
        .unwrap();

    assert_eq!(result.file(), Some("/files/slow/audio.m4a"));
    assert_eq!(seen.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn failed_task_reports_server_error() {
    let server = MockServer::start().await;
    mount_status(
        &server,
        "bad",
        json!({ "status": "error", "error": "Video unavailable" }),
    )
    .await;

    let client = common::client(&server);
    let err = client
        .task("bad", TaskKind::Video)
        .get_result()
        .await
        .unwrap_err();

    match err {
        Error::Request {
            status_code,
            message,
        } => {
            assert_eq!(status_code, None);
            assert_eq!(message, "Video unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_task_without_message_uses_default() {
    let server = MockServer::start().await;
    mount_status(&server, "bad", json!({ "status": "error" })).await;

    let client = common::client(&server);
    let err = client
        .task("bad", TaskKind::Info)
        .get_result()
        .await
        .unwrap_err();
    assert_eq!(err.message(), Some(UNKNOWN_ERROR));
}

#[tokio::test]
async fn status_rejection_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Task not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let err = client
        .task("gone", TaskKind::Video)
        .get_result()
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.message(), Some("Task not found"));
}

#[tokio::test]
async fn status_reports_pending_state() {
    let server = MockServer::start().await;
    mount_status(&server, "t1", json!({ "status": "processing" })).await;

    let client = common::client(&server);
    let report = client.task("t1", TaskKind::Video).status().await.unwrap();

    assert_eq!(report.task_id, "t1");
    assert_eq!(report.state(), TaskState::Pending);
}

#[tokio::test]
async fn configured_timeout_ends_polling() {
    let server = MockServer::start().await;
    mount_status(&server, "stuck", json!({ "status": "processing" })).await;

    let client = common::client(&server);
    let opts = PollOptions {
        poll_interval: Duration::from_millis(10),
        timeout: Some(Duration::from_millis(50)),
        on_progress: None,
    };
    let err = client
        .task("stuck", TaskKind::Video)
        .get_result_with(&opts)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn task_ids_are_path_encoded() {
    let server = MockServer::start().await;
    mount_status(&server, "a%2Fb", json!({ "status": "completed" })).await;

    let client = common::client(&server);
    let result = client
        .task("a/b", TaskKind::Info)
        .get_result()
        .await
        .unwrap();
    assert_eq!(result.task_id, "a/b");
    assert_eq!(result.file(), None);
}
