use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::alerts::dispatcher::{self, AlertTestResult, DispatchSettings};
use crate::alerts::repository;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::listings::repository as listings;
use crate::matching::criteria::CriteriaPatch;
use crate::models::alert::JobAlert;
use crate::models::user::Role;
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const ALERTS_PER_PAGE: u32 = 20;

#[derive(Serialize)]
pub struct AlertResponse {
    pub message: &'static str,
    pub alert: JobAlert,
}

/// Loads an alert the candidate owns: 404 when unknown, 403 when it belongs
/// to someone else.
async fn owned_alert(state: &AppState, user: &CurrentUser, id: i64) -> Result<JobAlert, AppError> {
    user.require(Role::Candidate)?;
    let alert = repository::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job alert {id} not found")))?;
    if alert.user_id != user.id() {
        return Err(AppError::forbidden());
    }
    Ok(alert)
}

/// GET /api/candidate/job-alerts
pub async fn handle_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<JobAlert>>, AppError> {
    user.require(Role::Candidate)?;
    let page = PageRequest::fixed(query.page, ALERTS_PER_PAGE);
    Ok(Json(repository::list_for_user(&state.db, user.id(), page).await?))
}

/// POST /api/candidate/job-alerts
pub async fn handle_store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<AlertResponse>), AppError> {
    user.require(Role::Candidate)?;
    let patch = CriteriaPatch::from_json(&body)?;
    let alert = repository::create(&state.db, user.id(), &patch).await?;
    tracing::info!(alert_id = alert.id, user_id = user.id(), "job alert created");
    Ok((
        StatusCode::CREATED,
        Json(AlertResponse {
            message: "Alert created",
            alert,
        }),
    ))
}

/// GET /api/candidate/job-alerts/:id
pub async fn handle_show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<JobAlert>, AppError> {
    Ok(Json(owned_alert(&state, &user, id).await?))
}

/// PUT /api/candidate/job-alerts/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<AlertResponse>, AppError> {
    let mut alert = owned_alert(&state, &user, id).await?;
    alert.apply(CriteriaPatch::from_json(&body)?);
    let alert = repository::save(&state.db, &alert).await?;
    Ok(Json(AlertResponse {
        message: "Alert updated",
        alert,
    }))
}

/// DELETE /api/candidate/job-alerts/:id
pub async fn handle_destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let alert = owned_alert(&state, &user, id).await?;
    repository::delete(&state.db, alert.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/candidate/job-alerts/:id/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<AlertResponse>, AppError> {
    let mut alert = owned_alert(&state, &user, id).await?;
    alert.is_active = !alert.is_active;
    let alert = repository::save(&state.db, &alert).await?;
    let message = if alert.is_active {
        "Alert activated"
    } else {
        "Alert deactivated"
    };
    Ok(Json(AlertResponse { message, alert }))
}

/// POST /api/candidate/job-alerts/:id/test
pub async fn handle_test(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<AlertTestResult>, AppError> {
    let alert = owned_alert(&state, &user, id).await?;
    let now = Utc::now();
    let criteria = alert.criteria().normalized();
    let open = listings::open_listings_matching(&state.db, now, (&criteria).into()).await?;
    let sample_size = DispatchSettings::default().sample_size;
    Ok(Json(dispatcher::test_alert(&alert, &open, now, sample_size)))
}
