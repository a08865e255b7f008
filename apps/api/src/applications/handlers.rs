use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::applications::repository;
use crate::auth::{find_user, CurrentUser};
use crate::errors::{is_unique_violation, AppError};
use crate::extract::{ApiJson, ApiQuery};
use crate::listings::repository as listings;
use crate::models::application::{Application, ApplicationOverview, ApplicationStatus};
use crate::models::profile::CandidateProfile;
use crate::models::user::Role;
use crate::notifications::{notify_quietly, NotificationPayload};
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::profiles::repository as profiles;
use crate::state::AppState;

const APPLICATIONS_PER_PAGE: u32 = 20;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplyPayload {
    #[validate(length(max = 5000, message = "The cover letter may not be greater than 5000 characters."))]
    pub cover_letter: Option<String>,
}

/// POST /api/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(job_id): Path<i64>,
    ApiJson(payload): ApiJson<ApplyPayload>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let candidate = user.require(Role::Candidate)?;
    payload.validate()?;

    let complete = profiles::find_row(&state.db, candidate.id)
        .await?
        .is_some_and(|p| p.is_complete);
    if !complete {
        return Err(AppError::Forbidden(
            "Please complete your profile before applying".to_string(),
        ));
    }

    let listing = listings::find(&state.db, job_id)
        .await?
        .filter(|l| l.is_open(Utc::now()))
        .ok_or_else(|| AppError::NotFound(format!("Job listing {job_id} not found")))?;

    let cover_letter = payload.cover_letter.as_deref().filter(|c| !c.trim().is_empty());
    let application = match repository::create(&state.db, listing.id, candidate.id, cover_letter).await {
        Ok(application) => application,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::UnprocessableEntity(
                "You have already applied to this listing".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(application_id = application.id, job_id, candidate_id = candidate.id, "application submitted");

    if let Some(recruiter) = find_user(&state.db, listing.user_id).await? {
        notify_quietly(
            state.notifier.as_ref(),
            &recruiter.recipient(),
            NotificationPayload::NewApplication {
                application_id: application.id,
                job_listing_id: listing.id,
                job_title: listing.title.clone(),
                candidate_name: candidate.name.clone(),
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/candidate/applications
pub async fn handle_candidate_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<ApplicationOverview>>, AppError> {
    let candidate = user.require(Role::Candidate)?;
    let page = PageRequest::fixed(query.page, APPLICATIONS_PER_PAGE);
    Ok(Json(repository::for_candidate(&state.db, candidate.id, page).await?))
}

/// GET /api/recruiter/applications
pub async fn handle_recruiter_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<ApplicationOverview>>, AppError> {
    let recruiter = user.require(Role::Recruiter)?;
    let page = PageRequest::fixed(query.page, APPLICATIONS_PER_PAGE);
    Ok(Json(repository::for_recruiter(&state.db, recruiter.id, page).await?))
}

/// Loads an application to one of the recruiter's own listings.
async fn owned_application(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
) -> Result<ApplicationOverview, AppError> {
    let recruiter = user.require(Role::Recruiter)?;
    let overview = repository::find_overview(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    if overview.recruiter_id != recruiter.id {
        return Err(AppError::forbidden());
    }
    Ok(overview)
}

#[derive(Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationOverview,
    pub candidate_profile: Option<CandidateProfile>,
}

/// GET /api/recruiter/applications/:id
pub async fn handle_recruiter_show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = owned_application(&state, &user, id).await?;
    let candidate_profile = profiles::find_for_user(&state.db, application.application.candidate_id).await?;
    Ok(Json(ApplicationDetail {
        application,
        candidate_profile,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

/// Recruiters may only move an application to a decision status.
pub fn parse_decision(raw: &str) -> Result<ApplicationStatus, AppError> {
    match raw {
        "shortlisted" => Ok(ApplicationStatus::Shortlisted),
        "rejected" => Ok(ApplicationStatus::Rejected),
        "hired" => Ok(ApplicationStatus::Hired),
        _ => Err(AppError::field(
            "status",
            "The selected status is invalid. Allowed: shortlisted, rejected, hired.",
        )),
    }
}

/// POST /api/recruiter/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<StatusPayload>,
) -> Result<Json<ApplicationOverview>, AppError> {
    let next = parse_decision(&payload.status)?;
    let mut overview = owned_application(&state, &user, id).await?;
    let current = overview.application.status;

    if !current.can_transition_to(next) {
        return Err(AppError::UnprocessableEntity(format!(
            "An application cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    if !repository::update_status(&state.db, id, current, next).await? {
        return Err(AppError::UnprocessableEntity(
            "The application was updated concurrently, reload and retry".to_string(),
        ));
    }
    overview.application.status = next;
    overview.application.updated_at = Utc::now();

    if let Some(candidate) = find_user(&state.db, overview.application.candidate_id).await? {
        notify_quietly(
            state.notifier.as_ref(),
            &candidate.recipient(),
            NotificationPayload::ApplicationStatusUpdated {
                application_id: id,
                job_title: overview.job_title.clone(),
                status: next,
            },
        )
        .await;
    }

    Ok(Json(overview))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decision_statuses_are_accepted() {
        assert_eq!(parse_decision("hired").unwrap(), ApplicationStatus::Hired);
        assert_eq!(parse_decision("shortlisted").unwrap(), ApplicationStatus::Shortlisted);
        assert!(matches!(
            parse_decision("submitted"),
            Err(AppError::InvalidFields(f)) if f.contains_key("status")
        ));
        assert!(parse_decision("promoted").is_err());
    }

    #[test]
    fn test_cover_letter_length() {
        let payload = ApplyPayload {
            cover_letter: Some("x".repeat(5001)),
        };
        assert!(payload.validate().is_err());
        assert!(ApplyPayload::default().validate().is_ok());
    }
}
