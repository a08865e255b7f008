use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::applications::repository as applications;
use crate::auth::{find_user, CurrentUser};
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::listings::repository as listings;
use crate::models::application::ApplicationOverview;
use crate::models::listing::{JobListing, ListingStatus};
use crate::models::user::Role;
use crate::notifications::{notify_quietly, NotificationPayload};
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const PENDING_PER_PAGE: u32 = 20;
const RECENT_LIMIT: i64 = 10;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_companies: i64,
    pub total_jobs: i64,
    pub pending_jobs: i64,
    pub total_applications: i64,
}

#[derive(Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_jobs: Vec<JobListing>,
    pub recent_applications: Vec<ApplicationOverview>,
}

/// GET /api/admin/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Dashboard>, AppError> {
    user.require(Role::Admin)?;

    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM companies) AS total_companies,
            (SELECT COUNT(*) FROM job_listings) AS total_jobs,
            (SELECT COUNT(*) FROM job_listings WHERE status = 'pending') AS pending_jobs,
            (SELECT COUNT(*) FROM applications) AS total_applications
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(Dashboard {
        stats,
        recent_jobs: listings::recent(&state.db, RECENT_LIMIT).await?,
        recent_applications: applications::recent(&state.db, RECENT_LIMIT).await?,
    }))
}

/// GET /api/admin/jobs/pending
pub async fn handle_pending(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<JobListing>>, AppError> {
    user.require(Role::Admin)?;
    let page = PageRequest::fixed(query.page, PENDING_PER_PAGE);
    Ok(Json(
        listings::with_status(&state.db, ListingStatus::Pending, page).await?,
    ))
}

/// GET /api/admin/jobs/:id/review
pub async fn handle_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<JobListing>, AppError> {
    user.require(Role::Admin)?;
    let listing = listings::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))?;
    Ok(Json(listing))
}

/// Applies a moderation decision and returns the refreshed listing.
async fn moderate(
    state: &AppState,
    id: i64,
    status: ListingStatus,
    reason: Option<&str>,
) -> Result<JobListing, AppError> {
    if listings::find(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job listing {id} not found")));
    }
    if !listings::moderate(&state.db, id, status, reason).await? {
        return Err(AppError::UnprocessableEntity(
            "Only pending listings can be moderated".to_string(),
        ));
    }
    let listing = listings::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))?;
    tracing::info!(listing_id = id, status = ?status, "listing moderated");
    Ok(listing)
}

async fn notify_recruiter(
    state: &AppState,
    listing: &JobListing,
    payload: NotificationPayload,
) -> Result<(), AppError> {
    if let Some(recruiter) = find_user(&state.db, listing.user_id).await? {
        notify_quietly(state.notifier.as_ref(), &recruiter.recipient(), payload).await;
    }
    Ok(())
}

/// POST /api/admin/jobs/:id/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<JobListing>, AppError> {
    user.require(Role::Admin)?;
    let listing = moderate(&state, id, ListingStatus::Approved, None).await?;
    notify_recruiter(
        &state,
        &listing,
        NotificationPayload::JobApproved {
            job_listing_id: listing.id,
            job_title: listing.title.clone(),
        },
    )
    .await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectPayload {
    #[validate(length(min = 1, max = 1000, message = "The rejection reason field is required."))]
    pub rejection_reason: String,
}

/// POST /api/admin/jobs/:id/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RejectPayload>,
) -> Result<Json<JobListing>, AppError> {
    user.require(Role::Admin)?;
    let reason = payload.rejection_reason.trim();
    RejectPayload {
        rejection_reason: reason.to_string(),
    }
    .validate()?;

    let listing = moderate(&state, id, ListingStatus::Rejected, Some(reason)).await?;
    notify_recruiter(
        &state,
        &listing,
        NotificationPayload::JobRejected {
            job_listing_id: listing.id,
            job_title: listing.title.clone(),
            rejection_reason: reason.to_string(),
        },
    )
    .await?;
    Ok(Json(listing))
}
