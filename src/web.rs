use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tracing::{debug, info};

use crate::aggregate::{aggregate, Report};
use crate::chart::{self, ChartOptions};
use crate::error::DashboardError;
use crate::notice::Notice;
use crate::store::TableStore;
use crate::timing::{QueryTimer, TimingStats};
use crate::types::{parse_date, QuerySelection};

pub struct AppState {
    store: Arc<TableStore>,
    options: ChartOptions,
    timer: Mutex<QueryTimer>,
}

impl AppState {
    pub fn new(store: Arc<TableStore>, options: ChartOptions) -> Self {
        Self { store, options, timer: Mutex::new(QueryTimer::new()) }
    }
}

#[derive(Serialize)]
struct Meta {
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    asin_count: usize,
    has_orders: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub asin: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub report: Report,
    /// Plotly figures, UK then EU; empty unless the report found data.
    pub charts: Vec<Value>,
    pub timing: TimingStats,
}

pub struct ApiError(DashboardError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "notice": Notice::error(self.0.to_string()),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/meta", get(meta_handler))
        .route("/api/report", get(report_handler))
        .fallback_service(ServeDir::new("static"))
        .with_state(state)
}

pub async fn run(port: u16, store: Arc<TableStore>, options: ChartOptions) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(AppState::new(store, options)));

    let addr = format!("0.0.0.0:{port}");
    info!(%addr, "dashboard at http://localhost:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn meta_handler(State(state): State<Arc<AppState>>) -> Json<Meta> {
    let bounds = state.store.date_bounds();
    Json(Meta {
        min_date: bounds.map(|(lo, _)| lo),
        max_date: bounds.map(|(_, hi)| hi),
        asin_count: state.store.asin_count(),
        has_orders: state.store.has_orders(),
    })
}

pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let selection = selection_for(&state.store, &query).map_err(ApiError)?;

    let mut timer = state.timer.lock().await;
    let report = timer.time(|| aggregate(&state.store, &selection));
    let timing = timer.stats();
    drop(timer);

    let charts = match report.product() {
        Some(p) => [&p.uk, &p.eu]
            .into_iter()
            .map(|panel| chart::render(panel, p.start_date, p.end_date, state.options).to_plotly())
            .collect(),
        None => Vec::new(),
    };
    debug!(asin = %selection.target_asin, us = timing.last_us, "report served");

    Ok(Json(ReportResponse { report, charts, timing }))
}

/// Missing dates fall back to the inventory table's full span.
fn selection_for(store: &TableStore, query: &ReportQuery) -> Result<QuerySelection, DashboardError> {
    let (min, max) = store.default_range();
    let start = match query.start.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s)?,
        None => min,
    };
    let end = match query.end.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s)?,
        None => max,
    };
    if start > end {
        return Err(DashboardError::InvertedRange { start: start.to_string(), end: end.to_string() });
    }
    Ok(QuerySelection::new(query.asin.as_deref().unwrap_or(""), start, end))
}
