use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{users_with_role, CurrentUser};
use crate::errors::{check_fields, AppError, FieldErrors};
use crate::extract::{ApiJson, ApiQuery};
use crate::listings::repository::{self, NewListing};
use crate::matching::criteria::Criteria;
use crate::matching::filter::{self, Sort};
use crate::models::listing::{JobListing, JobType};
use crate::models::user::Role;
use crate::notifications::{notify_quietly, NotificationPayload};
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const PUBLIC_PER_PAGE: u32 = 15;

#[derive(Debug, Default, Deserialize)]
pub struct JobIndexQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub page: Option<u32>,
}

/// GET /api/jobs
pub async fn handle_index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JobIndexQuery>,
) -> Result<Json<Page<JobListing>>, AppError> {
    let page = PageRequest::fixed(query.page, PUBLIC_PER_PAGE);

    let job_type = match query.job_type.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<JobType>() {
            Ok(job_type) => Some(job_type),
            Err(_) => return Ok(Json(Page::new(Vec::new(), page, 0))),
        },
    };
    let criteria = Criteria {
        title: query.title,
        location: query.location,
        job_type,
        ..Criteria::default()
    }
    .normalized();

    let now = Utc::now();
    let listings = repository::open_listings_matching(&state.db, now, (&criteria).into()).await?;
    let matched = filter::search(&listings, &criteria, Sort::newest_first(), now);
    let page = Page::from_vec(matched, page).map(|l| l.clone());
    Ok(Json(page))
}

/// GET /api/jobs/:id
pub async fn handle_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobListing>, AppError> {
    let mut listing = repository::find(&state.db, id)
        .await?
        .filter(|l| l.is_open(Utc::now()))
        .ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))?;

    repository::increment_views(&state.db, id).await?;
    listing.views_count += 1;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListingPayload {
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: String,
    #[validate(length(min = 1, message = "The description field is required."))]
    pub description: String,
    pub requirements: Option<String>,
    pub job_type: JobType,
    #[validate(length(min = 1, max = 255, message = "The location must be between 1 and 255 characters."))]
    pub location: String,
    #[validate(range(min = 0, message = "The salary min must be at least 0."))]
    pub salary_min: Option<i32>,
    #[validate(range(min = 0, message = "The salary max must be at least 0."))]
    pub salary_max: Option<i32>,
    pub deadline: NaiveDate,
}

impl ListingPayload {
    pub fn check(&self, today: NaiveDate) -> Result<(), AppError> {
        let mut extra = FieldErrors::new();
        if self.deadline <= today {
            extra
                .entry("deadline".to_string())
                .or_default()
                .push("The deadline must be a date after today.".to_string());
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if max < min {
                extra
                    .entry("salary_max".to_string())
                    .or_default()
                    .push("The salary max must be greater than or equal to salary min.".to_string());
            }
        }
        check_fields(self.validate(), extra)
    }
}

/// POST /api/recruiter/jobs
pub async fn handle_create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ListingPayload>,
) -> Result<(StatusCode, Json<JobListing>), AppError> {
    let recruiter = user.require(Role::Recruiter)?;
    let company_id = recruiter
        .company_id
        .ok_or_else(|| AppError::Forbidden("You must belong to a company to post listings".to_string()))?;
    payload.check(Utc::now().date_naive())?;

    let listing = repository::create_pending(
        &state.db,
        NewListing {
            company_id,
            user_id: recruiter.id,
            title: payload.title.trim(),
            description: &payload.description,
            requirements: payload.requirements.as_deref().filter(|r| !r.trim().is_empty()),
            job_type: payload.job_type,
            location: payload.location.trim(),
            salary_min: payload.salary_min,
            salary_max: payload.salary_max,
            deadline: payload.deadline,
        },
    )
    .await?;
    tracing::info!(listing_id = listing.id, recruiter_id = recruiter.id, "listing submitted for review");

    for admin in users_with_role(&state.db, Role::Admin).await? {
        notify_quietly(
            state.notifier.as_ref(),
            &admin.recipient(),
            NotificationPayload::NewJobListing {
                job_listing_id: listing.id,
                job_title: listing.title.clone(),
                company_name: listing.company_name.clone(),
            },
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/recruiter/jobs
pub async fn handle_recruiter_index(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<JobListing>>, AppError> {
    let recruiter = user.require(Role::Recruiter)?;
    let page = PageRequest::fixed(query.page, PUBLIC_PER_PAGE);
    Ok(Json(repository::for_recruiter(&state.db, recruiter.id, page).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> ListingPayload {
        serde_json::from_value(json!({
            "title": "Backend Engineer",
            "description": "APIs",
            "job_type": "full_time",
            "location": "Douala",
            "salary_min": 300000,
            "salary_max": 500000,
            "deadline": "2030-01-01"
        }))
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(payload().check(today()).is_ok());
    }

    #[test]
    fn test_past_deadline_and_inverted_salary_are_reported_together() {
        let mut p = payload();
        p.deadline = today();
        p.salary_max = Some(1);
        p.title = String::new();

        let Err(AppError::InvalidFields(fields)) = p.check(today()) else {
            panic!("expected InvalidFields");
        };
        assert!(fields.contains_key("deadline"));
        assert!(fields.contains_key("salary_max"));
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn test_unknown_job_type_does_not_deserialize() {
        let result = serde_json::from_value::<ListingPayload>(json!({
            "title": "x", "description": "y", "job_type": "freelance",
            "location": "z", "deadline": "2030-01-01"
        }));
        assert!(result.is_err());
    }
}
