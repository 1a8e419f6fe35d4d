use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::AppState;

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

const fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400.. => "client_error",
        _ => "success",
    }
}

/// Opens the per-request span (the auth middleware fills in `user_id`),
/// records HTTP metrics and emits one `http_request_finished` event.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = route.as_deref(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // Matched routes keep label cardinality bounded.
        let labels = [
            ("method", method),
            ("path", route.unwrap_or(path)),
            ("status", status.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            status_code = status,
            outcome = outcome(status),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_buckets() {
        assert_eq!(outcome(200), "success");
        assert_eq!(outcome(304), "success");
        assert_eq!(outcome(404), "client_error");
        assert_eq!(outcome(503), "error");
    }
}
