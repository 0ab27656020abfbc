use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
    routing::get, Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Build the Router for the internal Prometheus scrape endpoint and install
/// the process-wide recorder. Lives on its own listener so the scrape route
/// never collides with the dashboard's business `/metrics` route.
///
/// Install-once: calling this a second time in one process panics, which is
/// why the api binary owns the call and the test servers never export.
pub fn prometheus_router() -> Router {
    // The interesting split for this service: sub-millisecond in-memory
    // reads, tens of milliseconds for contended updates, seconds only when
    // a webhook endpoint is dragging a delivery out.
    const LATENCY_SECONDS: &[f64] = &[0.001, 0.005, 0.025, 0.1, 0.5, 2.0, 10.0];

    let recorder_handle = PrometheusBuilder::new()
        .set_buckets(LATENCY_SECONDS)
        .expect("bucket list is non-empty")
        .install_recorder()
        .expect("failed to install prometheus recorder");

    Router::new().route(
        "/metrics",
        get(move || std::future::ready(recorder_handle.render())),
    )
}

/// Middleware recording request count and latency per route and status for
/// the ticket API.
pub async fn track_requests(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("inbox_http_requests_total", &labels).increment(1);
    metrics::histogram!("inbox_http_request_duration_seconds", &labels).record(latency);

    response
}
