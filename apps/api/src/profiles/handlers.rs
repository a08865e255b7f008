use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::errors::{AppError, FieldErrors};
use crate::extract::ApiJson;
use crate::models::profile::CandidateProfile;
use crate::models::user::Role;
use crate::profiles::payload::ProfilePayload;
use crate::profiles::repository;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub profile: CandidateProfile,
}

async fn validate(state: &AppState, payload: &ProfilePayload) -> Result<(), AppError> {
    payload.check(Utc::now().date_naive())?;

    let unknown = repository::unknown_skill_ids(&state.db, &payload.skill_ids()).await?;
    if unknown.is_empty() {
        return Ok(());
    }
    let mut fields = FieldErrors::new();
    for (i, skill) in payload.skills.as_deref().unwrap_or_default().iter().enumerate() {
        if unknown.contains(&skill.id) {
            fields
                .entry(format!("skills.{i}.id"))
                .or_default()
                .push("The selected skill is invalid.".to_string());
        }
    }
    Err(AppError::InvalidFields(fields))
}

async fn load(state: &AppState, user_id: i64) -> Result<CandidateProfile, AppError> {
    repository::find_for_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// GET /api/candidate/profile
pub async fn handle_show(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<CandidateProfile>, AppError> {
    user.require(Role::Candidate)?;
    Ok(Json(load(&state, user.id()).await?))
}

/// GET /api/candidate/profile/create
pub async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    user.require(Role::Candidate)?;
    let skills = repository::skills(&state.db, None, None, None).await?;
    Ok(Json(json!({ "skills": skills })))
}

/// POST /api/candidate/profile
pub async fn handle_store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    user.require(Role::Candidate)?;
    validate(&state, &payload).await?;

    repository::save(&state.db, user.id(), &payload, true).await?;
    tracing::info!(user_id = user.id(), "candidate profile saved");

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            message: "Profile saved",
            profile: load(&state, user.id()).await?,
        }),
    ))
}

/// PUT /api/candidate/profile
pub async fn handle_update(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Result<Json<ProfileResponse>, AppError> {
    user.require(Role::Candidate)?;
    if repository::find_row(&state.db, user.id()).await?.is_none() {
        return Err(AppError::NotFound("Profile not found".to_string()));
    }
    validate(&state, &payload).await?;

    repository::save(&state.db, user.id(), &payload, false).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated",
        profile: load(&state, user.id()).await?,
    }))
}
