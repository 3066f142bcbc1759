//! Router-level tests with an in-memory store, a mocked provider and a
//! recording ffmpeg executor.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use reelcut_api::{create_router, ApiConfig, AppState, InMemoryVideoStore, VideoStore};
use reelcut_media::testing::RecordingExecutor;
use reelcut_media::FfmpegRunner;
use reelcut_models::{TaskHandle, VideoId, VideoRecord, VideoSource, VideoStatus};
use reelcut_provider::{
    MockAnalysisProvider, ProviderError, ProviderTaskStatus, SubmitSource, TaskSnapshot,
};
use reelcut_render::{LocalSourceLocator, RenderConfig, RenditionDriver};

const BOUNDARY: &str = "reelcut-test-boundary";

struct TestApp {
    router: Router,
    store: Arc<InMemoryVideoStore>,
    executor: RecordingExecutor,
    dir: TempDir,
}

impl TestApp {
    fn new(provider: MockAnalysisProvider) -> Self {
        Self::with_executor(provider, RecordingExecutor::new())
    }

    fn with_executor(provider: MockAnalysisProvider, executor: RecordingExecutor) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let render_config = RenderConfig::with_data_dir(dir.path());
        let locator = LocalSourceLocator::new(render_config.sources_dir()).unwrap();
        let driver = RenditionDriver::new(
            FfmpegRunner::with_executor(Arc::new(executor.clone())),
            render_config,
        );
        let store = Arc::new(InMemoryVideoStore::new());

        let state = AppState::from_parts(
            ApiConfig::default(),
            store.clone(),
            Arc::new(provider),
            driver,
            Arc::new(locator),
        );

        Self {
            router: create_router(state, None),
            store,
            executor,
            dir,
        }
    }

    fn sources_dir(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_multipart(&self, parts: &[Part<'_>]) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/videos")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
    }

    /// Seed a record whose upload already sits in the sources dir.
    async fn seed_upload(&self, id: &str, analysis: Option<Value>) -> VideoId {
        let id = VideoId::from(id);
        let path = self.sources_dir().join(format!("{}.mp4", id));
        std::fs::create_dir_all(self.sources_dir()).unwrap();
        std::fs::write(&path, b"source video").unwrap();

        let mut record = VideoRecord::submitted(
            id.clone(),
            TaskHandle::new("task-seeded"),
            VideoSource::Upload {
                path,
                file_name: Some("ad.mp4".into()),
            },
        );
        if let Some(analysis) = analysis {
            record.set_status(VideoStatus::Completed, 100, "Analysis complete", None);
            record.attach_analysis(analysis);
        }
        self.store.put(record).await;
        id
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: video/mp4\r\n\r\n",
                        file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn configured_provider() -> MockAnalysisProvider {
    let mut provider = MockAnalysisProvider::new();
    provider.expect_is_configured().return_const(true);
    provider
}

fn edit_body(video_id: &VideoId, captions: &str) -> Value {
    json!({
        "videoId": video_id,
        "selections": [
            {"startMs": 0, "endMs": 4000},
            {"startMs": 10000, "endMs": 16000},
            {"startMs": 20000, "endMs": 30000}
        ],
        "templateId": "tpl-promo",
        "aspectRatios": ["9:16", "16:9"],
        "durationsSec": [15, 30],
        "captions": captions
    })
}

#[tokio::test]
async fn test_root_and_health() {
    let app = TestApp::new(configured_provider());

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Video Analysis API", "status": "running"}));

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providerConfigured"], true);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_request_id_echoed_or_generated() {
    let app = TestApp::new(configured_provider());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_submit_url() {
    let mut provider = configured_provider();
    provider
        .expect_submit()
        .withf(|source| *source == SubmitSource::Url("https://cdn.example.com/spot.mp4".into()))
        .times(1)
        .returning(|_| Ok(TaskHandle::new("task-42")));
    let app = TestApp::new(provider);

    let (status, body) = app
        .post_multipart(&[Part::Text("url", "https://cdn.example.com/spot.mp4")])
        .await;
    assert_eq!(status, StatusCode::OK);

    let video_id = VideoId::from(body["videoId"].as_str().unwrap());
    assert!(video_id.as_str().starts_with("vid_"));

    let record = app.store.get(&video_id).await.unwrap();
    assert_eq!(record.status, VideoStatus::Processing);
    assert_eq!(record.progress, 10);
    assert_eq!(record.task_handle.as_str(), "task-42");
}

#[tokio::test]
async fn test_submit_upload_persists_source() {
    let mut provider = configured_provider();
    provider
        .expect_submit()
        .withf(|source| matches!(source, SubmitSource::File { file_name, .. } if file_name == "spot.mov"))
        .times(1)
        .returning(|_| Ok(TaskHandle::new("task-7")));
    let app = TestApp::new(provider);

    let (status, body) = app
        .post_multipart(&[Part::File("spot.mov", b"uploaded bytes")])
        .await;
    assert_eq!(status, StatusCode::OK);

    let video_id = body["videoId"].as_str().unwrap();
    let stored = app.sources_dir().join(format!("{}.mov", video_id));
    assert_eq!(std::fs::read(stored).unwrap(), b"uploaded bytes");
}

#[tokio::test]
async fn test_submit_requires_exactly_one_source() {
    let app = TestApp::new(MockAnalysisProvider::new());

    let (status, body) = app.post_multipart(&[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("must be provided"));

    let (status, _) = app
        .post_multipart(&[
            Part::File("spot.mp4", b"bytes"),
            Part::Text("url", "https://cdn.example.com/spot.mp4"),
        ])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The rejected upload is not left behind
    let leftovers = std::fs::read_dir(app.sources_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_submit_rejects_non_http_url() {
    let app = TestApp::new(MockAnalysisProvider::new());
    let (status, _) = app
        .post_multipart(&[Part::Text("url", "ftp://cdn.example.com/spot.mp4")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_provider_not_configured() {
    let mut provider = MockAnalysisProvider::new();
    provider.expect_is_configured().return_const(false);
    provider.expect_submit().never();
    let app = TestApp::new(provider);

    let (status, body) = app
        .post_multipart(&[Part::File("spot.mp4", b"bytes")])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "provider_not_configured");
    assert_eq!(std::fs::read_dir(app.sources_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_submit_provider_failure() {
    let mut provider = configured_provider();
    provider.expect_submit().returning(|_| {
        Err(ProviderError::RequestFailed {
            status: 400,
            body: "index not found".into(),
        })
    });
    let app = TestApp::new(provider);

    let (status, body) = app
        .post_multipart(&[Part::Text("url", "https://cdn.example.com/spot.mp4")])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("index not found"));
    assert!(app.store.list_ids().await.is_empty());
}

#[tokio::test]
async fn test_status_lifecycle() {
    let mut provider = MockAnalysisProvider::new();
    let mut seq = mockall::Sequence::new();
    provider
        .expect_poll()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(TaskSnapshot {
                status: ProviderTaskStatus::Indexing,
                video_id: None,
                error_message: None,
            })
        });
    provider
        .expect_poll()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(TaskSnapshot {
                status: ProviderTaskStatus::Ready,
                video_id: Some("pv-9".into()),
                error_message: None,
            })
        });
    provider
        .expect_fetch_analysis()
        .times(1)
        .returning(|_| Ok(json!({"transcript": [{"startMs": 0, "endMs": 900, "text": "Hi"}]})));
    let app = TestApp::new(provider);
    let id = app.seed_upload("vid_0000a001", None).await;

    let (status, body) = app.get(&format!("/api/videos/{}/status", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "indexing");
    assert_eq!(body["progress"], 50);
    assert!(body.get("analysis").is_none());

    // Not complete yet
    let (status, _) = app.get(&format!("/api/videos/{}", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get(&format!("/api/videos/{}/status", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert_eq!(body["taskHandle"], "task-seeded");
    assert_eq!(body["analysis"]["transcript"][0]["text"], "Hi");

    // Settled: no further provider calls
    let (_, again) = app.get(&format!("/api/videos/{}/status", id)).await;
    assert_eq!(again["message"], body["message"]);

    let (status, detail) = app.get(&format!("/api/videos/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["videoId"], id.as_str());

    let (status, analysis) = app.get(&format!("/api/videos/{}/analysis", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analysis["transcript"][0]["endMs"], 900);
}

#[tokio::test]
async fn test_status_poll_failure_is_degraded_not_error() {
    let mut provider = MockAnalysisProvider::new();
    provider.expect_poll().returning(|_| {
        Err(ProviderError::RequestFailed {
            status: 503,
            body: "maintenance".into(),
        })
    });
    let app = TestApp::new(provider);
    let id = app.seed_upload("vid_0000a002", None).await;

    let (status, body) = app.get(&format!("/api/videos/{}/status", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["progress"], 10);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Status check failed:"));
}

#[tokio::test]
async fn test_unknown_and_invalid_ids() {
    let app = TestApp::new(MockAnalysisProvider::new());

    let (status, _) = app.get("/api/videos/vid_ffffffff/status").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/videos/vid_ffffffff/analysis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/videos/bad%20id/status").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_renders_full_matrix() {
    let app = TestApp::new(MockAnalysisProvider::new());
    let id = app.seed_upload("vid_0000b001", None).await;

    let (status, body) = app.post_json("/api/edits", edit_body(&id, "none")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let files: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(files.len(), 4);
    assert!(files[0].ends_with("15s_1080x1920.mp4"));
    assert!(files[1].ends_with("15s_1920x1080.mp4"));
    assert!(files[2].ends_with("30s_1080x1920.mp4"));
    assert!(files[3].ends_with("30s_1920x1080.mp4"));
    assert_eq!(body["message"], "Created 4 of 4 video variant(s)");

    let job_id = body["jobId"].as_str().unwrap();
    assert!(body["outputDir"].as_str().unwrap().ends_with(job_id));
}

#[tokio::test]
async fn test_edit_burns_captions_from_cached_analysis() {
    let app = TestApp::new(MockAnalysisProvider::new());
    let analysis = json!({"transcript": [{"startMs": 0, "endMs": 1500, "text": "Buy now"}]});
    let id = app.seed_upload("vid_0000b002", Some(analysis)).await;

    let (status, body) = app.post_json("/api/edits", edit_body(&id, "burned")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let srt = PathBuf::from(body["outputDir"].as_str().unwrap()).join("captions.srt");
    let contents = std::fs::read_to_string(srt).unwrap();
    assert!(contents.contains("00:00:00,000 --> 00:00:01,500"));

    let variant_calls: Vec<_> = app
        .executor
        .calls()
        .into_iter()
        .filter(|c| c.output_file_name().contains("x1"))
        .collect();
    assert_eq!(variant_calls.len(), 4);
    assert!(variant_calls
        .iter()
        .all(|c| c.arg_after("-vf").unwrap_or_default().contains("subtitles=")));
}

#[tokio::test]
async fn test_edit_validation() {
    let app = TestApp::new(MockAnalysisProvider::new());
    let id = app.seed_upload("vid_0000b003", None).await;

    let mut body = edit_body(&id, "none");
    body["selections"] = json!([]);
    let (status, _) = app.post_json("/api/edits", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = edit_body(&id, "none");
    body["selections"] = json!([{"startMs": 5000, "endMs": 5000}]);
    let (status, _) = app.post_json("/api/edits", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_json("/api/edits", edit_body(&id, "karaoke")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/edits", json!({"videoId": id, "selections": "nope"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/edits", edit_body(&VideoId::from("vid_0000dead"), "none"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(app.executor.calls().is_empty());
}

#[tokio::test]
async fn test_edit_missing_source_is_server_error() {
    let app = TestApp::new(MockAnalysisProvider::new());
    let id = app.seed_upload("vid_0000b004", None).await;
    std::fs::remove_file(app.sources_dir().join(format!("{}.mp4", id))).unwrap();

    let (status, body) = app.post_json("/api/edits", edit_body(&id, "none")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "source_unavailable");
    assert!(!app.dir.path().join("jobs").exists());
}

#[tokio::test]
async fn test_edit_with_no_extracted_segments_fails() {
    let executor = RecordingExecutor::new().fail_when_output_contains("part_");
    let app = TestApp::with_executor(MockAnalysisProvider::new(), executor);
    let id = app.seed_upload("vid_0000b005", None).await;

    let (status, body) = app.post_json("/api/edits", edit_body(&id, "none")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "no_segments_extracted");
}

#[tokio::test]
async fn test_edit_partial_variant_failure_still_succeeds() {
    let executor = RecordingExecutor::new().fail_when_output_contains("1920x1080");
    let app = TestApp::with_executor(MockAnalysisProvider::new(), executor);
    let id = app.seed_upload("vid_0000b006", None).await;

    let (status, body) = app.post_json("/api/edits", edit_body(&id, "none")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);
    assert_eq!(body["message"], "Created 2 of 4 video variant(s)");
}
