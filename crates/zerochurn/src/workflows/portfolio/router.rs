use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::cache::{Clock, SystemClock};
use super::repository::{AccountId, AccountSource, AlertPublisher, RepositoryError, TaskRepository};
use super::service::{evaluate_playbooks, PortfolioService, PortfolioServiceError};
use crate::workflows::pipeline::{Deal, PipelineSummary};
use crate::workflows::scoring::AccountSnapshotInput;

/// Account payload plus an optional evaluation date (defaults to today, UTC).
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(flatten)]
    pub account: AccountSnapshotInput,
    #[serde(default, rename = "asOf")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    pub deals: Vec<Deal>,
}

type SharedService<S, T, A> = Arc<PortfolioService<S, T, A>>;

pub fn portfolio_router<S, T, A>(service: SharedService<S, T, A>) -> Router
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/scores/propensity", post(propensity_handler::<S, T, A>))
        .route("/api/v1/scores/health", post(health_handler::<S, T, A>))
        .route("/api/v1/scores/churn-risk", post(churn_handler::<S, T, A>))
        .route("/api/v1/playbooks/evaluate", post(playbooks_handler::<S, T, A>))
        .route(
            "/api/v1/accounts/:account_id/report",
            get(report_handler::<S, T, A>),
        )
        .route("/api/v1/pipeline/summary", post(pipeline_handler))
        .with_state(service)
}

fn today() -> NaiveDate {
    SystemClock.today()
}

pub(crate) async fn propensity_handler<S, T, A>(
    State(service): State<SharedService<S, T, A>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    let as_of = request.as_of.unwrap_or_else(today);
    let snapshot = request.account.into_snapshot();
    let report = service.engine().score_propensity(&snapshot, as_of);
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn health_handler<S, T, A>(
    State(service): State<SharedService<S, T, A>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    let snapshot = request.account.into_snapshot();
    let result = service.engine().score_health(&snapshot);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn churn_handler<S, T, A>(
    State(service): State<SharedService<S, T, A>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    let snapshot = request.account.into_snapshot();
    let result = service.engine().score_churn_risk(&snapshot);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn playbooks_handler<S, T, A>(
    State(service): State<SharedService<S, T, A>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    let as_of = request.as_of.unwrap_or_else(today);
    let snapshot = request.account.into_snapshot();
    let evaluation = evaluate_playbooks(service.engine(), &snapshot, as_of);
    (StatusCode::OK, Json(evaluation)).into_response()
}

pub(crate) async fn report_handler<S, T, A>(
    State(service): State<SharedService<S, T, A>>,
    Path(account_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    let id = AccountId(account_id);
    let as_of = query.as_of.unwrap_or_else(today);
    match service.account_report(&id, as_of) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(PortfolioServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("account {id} not found"),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn pipeline_handler(Json(request): Json<PipelineRequest>) -> Response {
    let summary = PipelineSummary::from_deals(&request.deals);
    (StatusCode::OK, Json(summary)).into_response()
}
