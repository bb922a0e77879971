// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::backend::{load_dashboard, load_story_series, Backend, FetchError, HttpBackend};
use crate::builders::{BuilderRegistry, ChartConfig};
use crate::chart::eligibility::ChartEligibility;
use crate::chart::kind::ChartKind;
use crate::chart::payload::{RawSeriesPayload, TimeRange};
use crate::chart::selector::ChartView;
use crate::config::AppConfig;
use crate::indicator::{Indicator, VisualEntity};
use crate::insights::{InsightGenerator, StatisticalInsights};
use crate::simulate::{
    period_view, reported_periods, Fabricator, PeriodValue, Provenance, RandomFabricator,
};
use crate::story::{Domain, Story, StoryCatalog, StorySummary};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<StoryCatalog>,
    pub builders: Arc<BuilderRegistry>,
    pub insights: Arc<dyn InsightGenerator>,
    pub backend: Arc<dyn Backend>,
    /// `None` leaves unreported periods as explicit gaps.
    pub fabricator: Option<Arc<dyn Fabricator>>,
}

impl AppState {
    pub fn new(catalog: StoryCatalog, backend: Arc<dyn Backend>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            builders: Arc::new(BuilderRegistry::with_defaults()),
            insights: Arc::new(StatisticalInsights),
            backend,
            fabricator: Some(Arc::new(RandomFabricator::new())),
        }
    }

    pub fn with_fabricator(mut self, fabricator: Option<Arc<dyn Fabricator>>) -> Self {
        self.fabricator = fabricator;
        self
    }

    pub fn with_insights(mut self, insights: Arc<dyn InsightGenerator>) -> Self {
        self.insights = insights;
        self
    }

    /// Catalog, HTTP backend and simulation switch from config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let catalog = StoryCatalog::load(cfg.stories_path.as_deref())?;
        let backend = HttpBackend::new(cfg)?;
        tracing::info!(
            stories = catalog.stories.len(),
            backend = %backend.base_url(),
            simulate = cfg.simulate_missing_periods,
            "app state ready"
        );
        let state = Self::new(catalog, Arc::new(backend));
        Ok(if cfg.simulate_missing_periods {
            state
        } else {
            state.with_fabricator(None)
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/charts/eligibility", post(chart_eligibility))
        .route("/charts/view", post(chart_view))
        .route("/dashboard", get(dashboard))
        .route("/indicators/{id}/view", get(indicator_view))
        .route("/indicators/{id}/related", get(indicator_related))
        .route("/domains", get(domains))
        .route("/stories", get(stories))
        .route("/stories/{id}", get(story_detail))
        .route("/stories/{id}/series", get(story_series))
        .route("/stories/{id}/charts", get(story_charts))
        .route("/stories/{id}/charts/{chart_id}", get(story_chart))
        .route("/stories/{id}/periods/{indicator_id}", get(story_periods))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `{status: "error", message}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn upstream(status: StatusCode, e: &FetchError) -> Self {
        Self::new(status, e.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({"status": "error", "message": self.message}));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn payload_arg(v: &Value) -> Option<RawSeriesPayload> {
    (!v.is_null()).then(|| RawSeriesPayload::from_value(v))
}

fn parse_kind(token: &str) -> Result<ChartKind, ApiError> {
    token
        .parse::<ChartKind>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn chart_eligibility(Json(body): Json<Value>) -> Json<ChartEligibility> {
    Json(ChartEligibility::of(payload_arg(&body).as_ref()))
}

#[derive(Deserialize)]
struct ViewReq {
    kind: String,
    #[serde(default)]
    previous: Option<String>,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    indicator: Option<Indicator>,
}

async fn chart_view(State(state): State<AppState>, Json(req): Json<ViewReq>) -> ApiResult<ChartView> {
    let kind = parse_kind(&req.kind)?;
    let previous = req.previous.as_deref().map(parse_kind).transpose()?;
    let payload = payload_arg(&req.payload);
    Ok(Json(ChartView::derive(
        kind,
        previous,
        payload.as_ref(),
        req.indicator.as_ref(),
        state.insights.as_ref(),
    )))
}

async fn dashboard(State(state): State<AppState>) -> Response {
    match load_dashboard(state.backend.as_ref()).await {
        Ok(boot) => Json(json!({"status": "success", "data": boot})).into_response(),
        Err(e) => ApiError::upstream(StatusCode::SERVICE_UNAVAILABLE, &e).into_response(),
    }
}

#[derive(Deserialize)]
struct IndicatorViewQuery {
    kind: Option<String>,
    range: Option<String>,
}

async fn indicator_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<IndicatorViewQuery>,
) -> ApiResult<ChartView> {
    let kind = match q.kind.as_deref() {
        Some(k) => parse_kind(k)?,
        None => ChartKind::Line,
    };
    let range = match q.range.as_deref() {
        Some(r) => r
            .parse::<TimeRange>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => TimeRange::All,
    };

    let (series, indicators) =
        tokio::join!(state.backend.time_series(&id), state.backend.indicators());
    let payload = series
        .map_err(|e| ApiError::upstream(StatusCode::BAD_GATEWAY, &e))?
        .within(range);
    let indicator = indicators
        .ok()
        .and_then(|list| list.into_iter().find(|i| i.id == id));

    Ok(Json(ChartView::derive(
        kind,
        None,
        Some(&payload),
        indicator.as_ref(),
        state.insights.as_ref(),
    )))
}

async fn indicator_related(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<VisualEntity>> {
    state
        .backend
        .related_visualizations(&id)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream(StatusCode::BAD_GATEWAY, &e))
}

async fn domains(State(state): State<AppState>) -> Json<Vec<Domain>> {
    Json(state.catalog.domains.clone())
}

#[derive(Deserialize)]
struct StoriesQuery {
    domain: Option<String>,
}

async fn stories(
    State(state): State<AppState>,
    Query(q): Query<StoriesQuery>,
) -> ApiResult<Vec<StorySummary>> {
    if let Some(d) = q.domain.as_deref() {
        if state.catalog.domain(d).is_none() {
            return Err(ApiError::not_found(format!("unknown domain '{d}'")));
        }
    }
    Ok(Json(
        state
            .catalog
            .stories_in(q.domain.as_deref())
            .into_iter()
            .map(Story::summary_view)
            .collect(),
    ))
}

fn find_story<'a>(state: &'a AppState, id: &str) -> Result<&'a Story, ApiError> {
    state
        .catalog
        .story(id)
        .ok_or_else(|| ApiError::not_found(format!("unknown story '{id}'")))
}

async fn story_detail(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Story> {
    Ok(Json(find_story(&state, &id)?.clone()))
}

async fn story_series(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Err(e) = find_story(&state, &id) {
        return e.into_response();
    }
    match load_story_series(state.backend.as_ref(), &id).await {
        Ok(series) => Json(series).into_response(),
        Err(e) => ApiError::upstream(StatusCode::BAD_GATEWAY, &e).into_response(),
    }
}

async fn story_charts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<String>> {
    let story = find_story(&state, &id)?;
    Ok(Json(
        story
            .available_charts(&state.builders)
            .into_iter()
            .map(str::to_string)
            .collect(),
    ))
}

async fn story_chart(
    State(state): State<AppState>,
    Path((id, chart_id)): Path<(String, String)>,
) -> ApiResult<ChartConfig> {
    let story = find_story(&state, &id)?;
    if !story.charts.iter().any(|c| *c == chart_id) {
        return Err(ApiError::not_found(format!(
            "story '{id}' has no chart '{chart_id}'"
        )));
    }
    state
        .builders
        .build(&chart_id, &story.data)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("chart '{chart_id}' is unavailable for '{id}'")))
}

#[derive(Serialize)]
struct PeriodsResp {
    story_id: String,
    indicator_id: String,
    simulated: bool,
    periods: Vec<PeriodValue>,
}

async fn story_periods(
    State(state): State<AppState>,
    Path((id, indicator_id)): Path<(String, String)>,
) -> ApiResult<PeriodsResp> {
    find_story(&state, &id)?;
    let payload = state
        .backend
        .time_series(&indicator_id)
        .await
        .map_err(|e| ApiError::upstream(StatusCode::BAD_GATEWAY, &e))?;

    let reported = reported_periods(&payload, Utc::now().year());
    let periods = period_view(&reported, state.fabricator.as_deref());
    Ok(Json(PeriodsResp {
        simulated: periods
            .iter()
            .any(|p| p.provenance == Provenance::Simulated),
        story_id: id,
        indicator_id,
        periods,
    }))
}
