//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reelcut_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reelcut_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reelcut_http_requests_in_flight";

    // Provider metrics
    pub const VIDEOS_SUBMITTED_TOTAL: &str = "reelcut_videos_submitted_total";
    pub const PROVIDER_POLL_FAILURES_TOTAL: &str = "reelcut_provider_poll_failures_total";
    pub const ANALYSIS_FETCH_FAILURES_TOTAL: &str = "reelcut_analysis_fetch_failures_total";

    // Edit jobs
    pub const EDIT_REQUESTS_TOTAL: &str = "reelcut_edit_requests_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a video submission.
pub fn record_video_submitted(source: &str, outcome: &str) {
    let labels = [
        ("source", source.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::VIDEOS_SUBMITTED_TOTAL, &labels).increment(1);
}

/// Record a failed provider status poll.
pub fn record_provider_poll_failure(network: bool) {
    let kind = if network { "network" } else { "provider" };
    counter!(names::PROVIDER_POLL_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record a failed analysis fetch.
pub fn record_analysis_fetch_failure() {
    counter!(names::ANALYSIS_FETCH_FAILURES_TOTAL).increment(1);
}

/// Record an edit request outcome.
pub fn record_edit_request(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::EDIT_REQUESTS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (replace ids with placeholders).
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        let replaced = if previous == "videos" && !segment.is_empty() {
            ":video_id"
        } else if looks_like_id(segment) {
            ":id"
        } else {
            segment
        };
        out.push(replaced);
        previous = segment;
    }
    out.join("/")
}

fn looks_like_id(segment: &str) -> bool {
    let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
    let is_uuid = segment.len() == 36
        && segment
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-')
        && segment.matches('-').count() == 4;
    is_numeric || is_uuid
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
