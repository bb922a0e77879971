// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// The router is exercised directly via tower::ServiceExt::oneshot, with an
// in-memory backend standing in for the REST service.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt as _; // for `oneshot`

use story_dashboard::api::{self, AppState};
use story_dashboard::backend::{FetchError, MemoryBackend};
use story_dashboard::config::AppConfig;
use story_dashboard::metrics::Metrics;
use story_dashboard::chart::RawSeriesPayload;
use story_dashboard::indicator::{Indicator, StoryIndicator};
use story_dashboard::simulate::{Fabricator, Period};
use story_dashboard::story::StoryCatalog;

const BODY_LIMIT: usize = 1024 * 1024;

/// Deterministic stand-in so period responses are stable.
struct Constant(f64);
impl Fabricator for Constant {
    fn fabricate(&self, _period: Period, anchor: Option<f64>) -> f64 {
        anchor.unwrap_or(0.0) + self.0
    }
}

fn indicator(id: &str, name: &str, unit: &str) -> Indicator {
    serde_json::from_value(json!({"id": id, "name": name, "unit": unit, "category": "economy"}))
        .expect("indicator fixture")
}

fn backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_indicators(vec![indicator("gdp_growth", "GDP growth", "%")])
        .with_series(
            "gdp_growth",
            RawSeriesPayload::from_value(&json!({
                "line_data": [{"DE": 0.2, "FR": 0.4}, {"DE": 0.5, "FR": 0.1}],
                "bar_data": [
                    {"country": "DE", "data": [{"value": 0.2, "year": 2019}, {"value": 0.5, "year": 2024}]},
                    {"country": "FR", "data": [{"value": 0.4, "year": 2019}, {"value": 0.1, "year": 2024}]}
                ],
                "years": [2019, 2024]
            })),
        )
        .with_story(
            "uk-productivity-puzzle",
            vec![StoryIndicator {
                indicator_id: "gdp_growth".into(),
                name: "GDP growth".into(),
                unit: "%".into(),
            }],
        )
}

fn router_with(backend: MemoryBackend) -> Router {
    let catalog = StoryCatalog::bundled().expect("bundled catalog");
    let state = AppState::new(catalog, Arc::new(backend))
        .with_fabricator(Some(Arc::new(Constant(1.0))));
    api::router(state)
}

fn test_router() -> Router {
    router_with(backend())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post_json(uri: &str, body: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = test_router().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn eligibility_reports_every_kind() {
    let (status, v) = send(
        test_router(),
        post_json("/charts/eligibility", json!({"bar_data": [{"country": "DE", "value": 1.2}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        v,
        json!({"line": false, "area": false, "bar": true, "pie": true, "radial": true})
    );

    let (_, v) = send(test_router(), post_json("/charts/eligibility", Json::Null)).await;
    assert!(v.as_object().unwrap().values().all(|b| b == false));
}

#[tokio::test]
async fn chart_view_falls_back_and_rejects_unknown_kinds() {
    let body = json!({
        "kind": "line",
        "payload": {"bar_data": [{"country": "DE", "value": 1.2}, {"country": "FR", "value": -1}]}
    });
    let (status, v) = send(test_router(), post_json("/charts/view", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["selected_kind"], "line");
    assert_eq!(v["effective_kind"], "bar");
    assert_eq!(v["fallback_applied"], true);
    assert_eq!(v["state"]["status"], "ready");
    assert_eq!(v["records"].as_array().unwrap().len(), 2);

    let (status, v) = send(
        test_router(),
        post_json("/charts/view", json!({"kind": "scatter", "payload": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["status"], "error");

    let (status, v) = send(
        test_router(),
        post_json("/charts/view", json!({"kind": "pie", "payload": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["state"], json!({"status": "empty", "message": "No data available"}));
    assert_eq!(v["records"], json!([]));
}

#[tokio::test]
async fn dashboard_bootstrap_and_failure() {
    let (status, v) = send(test_router(), get("/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "success");
    assert_eq!(v["data"]["indicators"][0]["id"], "gdp_growth");

    let failing = router_with(backend().failing(
        "indicators",
        FetchError::Rejected {
            message: "Database offline".into(),
        },
    ));
    let (status, v) = send(failing, get("/dashboard")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(v, json!({"status": "error", "message": "Database offline"}));
}

#[tokio::test]
async fn indicator_view_applies_kind_range_and_unit() {
    let (status, v) = send(test_router(), get("/indicators/gdp_growth/view?kind=bar&range=1y")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["effective_kind"], "bar");
    let records = v["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["year"] == 2024));
    assert!(v["summary"].as_str().unwrap().contains("GDP growth"));
    assert!(v["insights"].as_array().is_some_and(|i| !i.is_empty()));

    let (status, _) = send(test_router(), get("/indicators/gdp_growth/view?range=forever")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = send(test_router(), get("/indicators/unknown/view")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["message"], "indicator 'unknown' not found");
}

#[tokio::test]
async fn related_visualizations_pass_through() {
    let (status, v) = send(test_router(), get("/indicators/gdp_growth/related")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn story_catalog_routes() {
    let (status, v) = send(test_router(), get("/stories")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v.as_array().unwrap().iter().any(|s| s["id"] == "uk-productivity-puzzle"));

    let (_, v) = send(test_router(), get("/stories?domain=labour")).await;
    assert_eq!(v.as_array().unwrap().len(), 1);
    let (status, _) = send(test_router(), get("/stories?domain=sport")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, v) = send(test_router(), get("/stories/uk-productivity-puzzle")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["sections"].as_array().is_some_and(|s| !s.is_empty()));

    let (status, _) = send(test_router(), get("/stories/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, v) = send(test_router(), get("/domains")).await;
    assert_eq!(v.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn story_charts_only_list_buildable_ids() {
    let (status, v) = send(test_router(), get("/stories/cost-of-living/charts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!(["wage-growth-real"]));

    let (status, v) = send(test_router(), get("/stories/cost-of-living/charts/wage-growth-real")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["type"], "area");
    assert!(v["data"].as_array().is_some_and(|d| !d.is_empty()));

    // Listed by the story but its data has no gdp_growth block.
    let (status, _) = send(
        test_router(),
        get("/stories/cost-of-living/charts/gdp-growth-trajectory"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Builder exists but the story does not list it.
    let (status, _) = send(
        test_router(),
        get("/stories/cost-of-living/charts/sector-composition"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn story_series_fans_out_per_indicator() {
    let (status, v) = send(test_router(), get("/stories/uk-productivity-puzzle/series")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["series"][0]["indicator"]["indicator_id"], "gdp_growth");
    assert!(v["series"][0]["payload"]["line_data"].is_array());

    // Story known locally but the backend has no story-data for it.
    let (status, v) = send(test_router(), get("/stories/cost-of-living/series")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["status"], "error");
}

#[tokio::test]
async fn periods_label_simulated_values() {
    let (status, v) = send(
        test_router(),
        get("/stories/uk-productivity-puzzle/periods/gdp_growth"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let periods = v["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 3);
    for p in periods {
        match p["provenance"].as_str().unwrap() {
            "reported" => assert_eq!(p["label"], "Reported"),
            "simulated" => assert_eq!(p["label"], "Simulated"),
            other => panic!("unexpected provenance {other}"),
        }
    }
    assert_eq!(v["simulated"], true);

    let catalog = StoryCatalog::bundled().unwrap();
    let no_sim = api::router(AppState::new(catalog, Arc::new(backend())).with_fabricator(None));
    let (_, v) = send(no_sim, get("/stories/uk-productivity-puzzle/periods/gdp_growth")).await;
    assert_eq!(v["simulated"], false);
    assert!(v["periods"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["provenance"] != "simulated"));
}

#[tokio::test]
async fn app_mounts_metrics_only_with_a_handle() {
    let cfg = AppConfig::default();
    let recorder = PrometheusBuilder::new().build_recorder();
    let metrics = Metrics::from_handle(recorder.handle());

    let with = story_dashboard::app(&cfg, Some(&metrics)).expect("app with metrics");
    let resp = with.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let without = story_dashboard::app(&cfg, None).expect("app without metrics");
    let resp = without.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
