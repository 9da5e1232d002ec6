// tests/admin_http.rs
use axum::body::{self, Body};
use course_review_bot::metrics::Metrics;
use http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt; // for `oneshot`

async fn get_text(m: &Metrics, uri: &str) -> (StatusCode, String) {
    let resp = m
        .router()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let m = Metrics::from_handle(recorder.handle());
    let (status, body) = get_text(&m, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn metrics_exposes_recorded_counters() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let m = Metrics::from_handle(recorder.handle());

    metrics::with_local_recorder(&recorder, || {
        metrics::counter!("bot_requests_total").increment(2);
        metrics::counter!("resolve_outcome_total", "outcome" => "found").increment(1);
    });

    let (status, text) = get_text(&m, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in ["bot_requests_total 2", "resolve_outcome_total{outcome=\"found\"} 1"] {
        assert!(text.contains(needle), "exposition missing '{needle}'\n{text}");
    }
}
