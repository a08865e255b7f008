use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::models::notification::NotificationRow;
use crate::notifications::store;
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const NOTIFICATIONS_PER_PAGE: u32 = 20;

/// GET /api/candidate/notifications
pub async fn handle_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<NotificationRow>>, AppError> {
    let page = PageRequest::fixed(query.page, NOTIFICATIONS_PER_PAGE);
    Ok(Json(store::list_for_user(&state.db, user.id(), page).await?))
}

/// GET /api/candidate/notifications/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let count = store::unread_count(&state.db, user.id()).await?;
    Ok(Json(json!({ "unread_count": count })))
}

/// POST /api/candidate/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if store::mark_read(&state.db, user.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Notification {id} not found")))
    }
}

/// POST /api/candidate/notifications/mark-all-read
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let updated = store::mark_all_read(&state.db, user.id()).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// DELETE /api/candidate/notifications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if store::delete(&state.db, user.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Notification {id} not found")))
    }
}
