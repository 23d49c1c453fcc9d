use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    domain::{parse_date, ReportSummary, StatisticsSummary, SUCCESS_MARKER},
    errors::AppError,
    service::ReportingService,
};

#[derive(Clone)]
pub struct AppState {
    pub service: ReportingService,
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reporting/", get(all_reports))
        .route("/reporting/:id", get(report_by_id))
        .route("/reporting/channel/:channel", get(reports_by_channel))
        .route("/reporting/date", get(reports_by_date))
        .route("/reporting/date-range", get(reports_by_date_range))
        .route("/reporting/errors", get(reports_by_error))
        .route("/reporting/success", get(reports_by_success))
        .route("/reporting/payload", get(reports_by_payload))
        .route("/reporting/lastWeek", get(last_week_statistics))
        .route("/reporting/statistic-range", get(statistics_for_range))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET]);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring CORS origin that is not a valid header value");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRangeQuery {
    date_start: String,
    date_end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorQuery {
    error_message_body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuccessQuery {
    #[serde(default = "default_success_body")]
    success_message_body: String,
}

fn default_success_body() -> String {
    SUCCESS_MARKER.to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadQuery {
    payload_body: String,
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn all_reports(State(state): State<AppState>) -> Result<Json<ReportSummary>, AppError> {
    tracing::info!("listing all reports");
    Ok(Json(state.service.all_reports().await?))
}

async fn report_by_id(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Path(id) = id?;
    tracing::info!(id, "fetching report by id");
    Ok(Json(state.service.report_by_id(id).await?))
}

async fn reports_by_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<ReportSummary>, AppError> {
    tracing::info!(%channel, "fetching reports by channel");
    Ok(Json(state.service.reports_by_channel(&channel).await?))
}

async fn reports_by_date(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!(date = %query.date, "fetching reports by date");
    let day = parse_date("date", &query.date)?;
    Ok(Json(state.service.reports_by_date(day).await?))
}

async fn reports_by_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!(start = %query.date_start, end = %query.date_end, "fetching reports by date range");
    let start = parse_date("dateStart", &query.date_start)?;
    let end = parse_date("dateEnd", &query.date_end)?;
    Ok(Json(state.service.reports_by_date_range(start, end).await?))
}

async fn reports_by_error(
    State(state): State<AppState>,
    query: Result<Query<ErrorQuery>, QueryRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!("fetching reports by error text");
    Ok(Json(
        state.service.reports_by_error(&query.error_message_body).await?,
    ))
}

async fn reports_by_success(
    State(state): State<AppState>,
    query: Result<Query<SuccessQuery>, QueryRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!("fetching successful reports");
    Ok(Json(
        state
            .service
            .reports_by_success(&query.success_message_body)
            .await?,
    ))
}

async fn reports_by_payload(
    State(state): State<AppState>,
    query: Result<Query<PayloadQuery>, QueryRejection>,
) -> Result<Json<ReportSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!("fetching reports by payload text");
    Ok(Json(
        state.service.reports_by_payload(&query.payload_body).await?,
    ))
}

async fn last_week_statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsSummary>, AppError> {
    tracing::info!("computing last week statistics");
    Ok(Json(state.service.last_week_statistics().await?))
}

async fn statistics_for_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<StatisticsSummary>, AppError> {
    let Query(query) = query?;
    tracing::info!(start = %query.date_start, end = %query.date_end, "computing range statistics");
    let start = parse_date("dateStart", &query.date_start)?;
    let end = parse_date("dateEnd", &query.date_end)?;
    Ok(Json(state.service.statistics_for_range(start, end).await?))
}
