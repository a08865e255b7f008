use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::favorites::repository;
use crate::listings::repository as listings;
use crate::models::favorite::FavoriteEntry;
use crate::models::listing::JobListing;
use crate::models::user::Role;
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const FAVORITES_PER_PAGE: u32 = 20;

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub message: &'static str,
    pub is_favorited: bool,
}

/// Only listings visible to the public can be favorited; anything else is
/// reported as missing.
fn favoritable(
    listing: Option<JobListing>,
    job_id: i64,
    now: DateTime<Utc>,
) -> Result<JobListing, AppError> {
    listing
        .filter(|l| l.is_open(now))
        .ok_or_else(|| AppError::NotFound(format!("Job listing {job_id} not found")))
}

async fn ensure_listing_open(state: &AppState, job_id: i64) -> Result<(), AppError> {
    let listing = listings::find(&state.db, job_id).await?;
    favoritable(listing, job_id, Utc::now()).map(|_| ())
}

/// GET /api/candidate/favorites
pub async fn handle_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<FavoriteEntry>>, AppError> {
    user.require(Role::Candidate)?;
    let page = PageRequest::fixed(query.page, FAVORITES_PER_PAGE);
    Ok(Json(repository::list_for_user(&state.db, user.id(), page).await?))
}

/// POST /api/candidate/favorites/:job
pub async fn handle_store(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(job_id): Path<i64>,
) -> Result<Json<FavoriteResponse>, AppError> {
    user.require(Role::Candidate)?;
    ensure_listing_open(&state, job_id).await?;
    if !repository::add(&state.db, user.id(), job_id).await? {
        return Err(AppError::UnprocessableEntity(
            "Listing is already in favorites".to_string(),
        ));
    }
    Ok(Json(FavoriteResponse {
        message: "Listing added to favorites",
        is_favorited: true,
    }))
}

/// DELETE /api/candidate/favorites/:job
pub async fn handle_destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(job_id): Path<i64>,
) -> Result<Json<FavoriteResponse>, AppError> {
    user.require(Role::Candidate)?;
    if !repository::remove(&state.db, user.id(), job_id).await? {
        return Err(AppError::NotFound("Listing not found in favorites".to_string()));
    }
    Ok(Json(FavoriteResponse {
        message: "Listing removed from favorites",
        is_favorited: false,
    }))
}

/// POST /api/candidate/favorites/:job/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(job_id): Path<i64>,
) -> Result<Json<FavoriteResponse>, AppError> {
    user.require(Role::Candidate)?;

    // Removing stays possible after a listing closes; adding needs it open.
    let response = if repository::remove(&state.db, user.id(), job_id).await? {
        FavoriteResponse {
            message: "Listing removed from favorites",
            is_favorited: false,
        }
    } else {
        ensure_listing_open(&state, job_id).await?;
        repository::add(&state.db, user.id(), job_id).await?;
        FavoriteResponse {
            message: "Listing added to favorites",
            is_favorited: true,
        }
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::fixtures::listing;
    use crate::models::listing::ListingStatus;
    use chrono::TimeZone;

    #[test]
    fn test_only_open_listings_can_be_favorited() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let open = listing(1, "Backend Engineer", "APIs");
        assert_eq!(favoritable(Some(open.clone()), 1, now).unwrap().id, 1);

        for status in [ListingStatus::Draft, ListingStatus::Pending, ListingStatus::Rejected] {
            let mut hidden = open.clone();
            hidden.status = status;
            assert!(matches!(
                favoritable(Some(hidden), 1, now),
                Err(AppError::NotFound(_))
            ));
        }

        let mut expired = open;
        expired.deadline = now.date_naive() - chrono::Duration::days(1);
        assert!(matches!(favoritable(Some(expired), 1, now), Err(AppError::NotFound(_))));
        assert!(matches!(favoritable(None, 9, now), Err(AppError::NotFound(_))));
    }
}
