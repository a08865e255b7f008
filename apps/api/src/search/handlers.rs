use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::listings::repository as listings;
use crate::matching::criteria::Criteria;
use crate::matching::filter::{self, Sort, SortKey, SortOrder};
use crate::models::listing::{JobListing, JobType};
use crate::models::profile::Skill;
use crate::models::user::{Company, Role};
use crate::pagination::{Page, PageQuery};
use crate::profiles::repository as profiles;
use crate::state::AppState;

const SUGGESTION_LIMIT: i64 = 5;

/// Query string of `GET /api/search/jobs`. Keyword lists are comma separated;
/// a zero salary bound or company id means "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct JobSearchQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub keywords: Option<String>,
    pub excluded_keywords: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub company_id: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

impl JobSearchQuery {
    /// `Ok(None)` when the job type names no known type: nothing can match.
    fn criteria(&self) -> Result<Option<Criteria>, AppError> {
        let job_type = match self.job_type.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<JobType>() {
                Ok(job_type) => Some(job_type),
                Err(_) => return Ok(None),
            },
        };
        Ok(Some(
            Criteria {
                title: self.title.clone(),
                location: self.location.clone(),
                job_type,
                keywords: split_list(self.keywords.clone()),
                excluded_keywords: split_list(self.excluded_keywords.clone()),
                salary_min: self.salary_min.filter(|&v| v != 0),
                salary_max: self.salary_max.filter(|&v| v != 0),
                company_id: self.company_id.filter(|&v| v != 0),
                since: None,
            }
            .normalized(),
        ))
    }

    fn sort(&self) -> Result<Sort, AppError> {
        let order = match self.sort_order.as_deref() {
            None | Some("") => SortOrder::default(),
            Some(raw) => raw.parse().map_err(AppError::Validation)?,
        };
        Ok(Sort {
            key: self.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            order,
        })
    }
}

/// A listing as returned by search, scored for the calling candidate when possible.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub listing: JobListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_score: Option<u8>,
}

/// GET /api/search/jobs
pub async fn handle_jobs(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    ApiQuery(query): ApiQuery<JobSearchQuery>,
) -> Result<Json<Page<SearchHit>>, AppError> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(state.config.search_default_per_page, state.config.search_max_per_page);
    let sort = query.sort()?;

    let Some(criteria) = query.criteria()? else {
        return Ok(Json(Page::new(Vec::new(), page, 0)));
    };

    let profile = match user.as_ref().filter(|u| u.0.role == Role::Candidate) {
        Some(candidate) => profiles::find_for_user(&state.db, candidate.id()).await?,
        None => None,
    };

    let now = Utc::now();
    let open = listings::open_listings_matching(&state.db, now, (&criteria).into()).await?;
    let matched = filter::search(&open, &criteria, sort, now);

    let hits = Page::from_vec(matched, page).map(|listing| SearchHit {
        matching_score: profile
            .as_ref()
            .map(|p| state.scorer.score(listing, p).total),
        listing: listing.clone(),
    });
    Ok(Json(hits))
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// GET /api/search/skills
pub async fn handle_skills(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SkillSearchQuery>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let skills = profiles::skills(
        &state.db,
        non_empty(&query.search),
        non_empty(&query.category),
        None,
    )
    .await?;
    Ok(Json(skills))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanySearchQuery {
    pub search: Option<String>,
}

/// GET /api/search/companies
pub async fn handle_companies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CompanySearchQuery>,
) -> Result<Json<Vec<Company>>, AppError> {
    let companies = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, name, description, website, address, created_at
        FROM companies
        WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
        ORDER BY name
        "#,
    )
    .bind(non_empty(&query.search))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(companies))
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    pub query: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub id: i64,
}

impl From<Skill> for Suggestion {
    fn from(skill: Skill) -> Self {
        Suggestion {
            kind: "skill",
            value: skill.name,
            id: skill.id,
        }
    }
}

/// GET /api/search/suggestions
pub async fn handle_suggestions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SuggestionQuery>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let Some(needle) = non_empty(&query.query) else {
        return Ok(Json(Vec::new()));
    };
    let skills = profiles::skills(&state.db, Some(needle), None, Some(SUGGESTION_LIMIT)).await?;
    Ok(Json(skills.into_iter().map(Suggestion::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lists_are_comma_separated() {
        let query = JobSearchQuery {
            keywords: Some("rust, go,,rust".to_string()),
            excluded_keywords: Some("senior".to_string()),
            ..JobSearchQuery::default()
        };
        let criteria = query.criteria().unwrap().unwrap();
        assert_eq!(criteria.keywords, vec!["rust", "go"]);
        assert_eq!(criteria.excluded_keywords, vec!["senior"]);
    }

    #[test]
    fn test_zero_bounds_do_not_filter() {
        let query = JobSearchQuery {
            salary_min: Some(0),
            salary_max: Some(0),
            company_id: Some(0),
            ..JobSearchQuery::default()
        };
        let criteria = query.criteria().unwrap().unwrap();
        assert_eq!(criteria.salary_min, None);
        assert_eq!(criteria.salary_max, None);
        assert_eq!(criteria.company_id, None);

        let query = JobSearchQuery {
            salary_min: Some(150_000),
            ..JobSearchQuery::default()
        };
        assert_eq!(query.criteria().unwrap().unwrap().salary_min, Some(150_000));
    }

    #[test]
    fn test_unknown_job_type_matches_nothing() {
        let query = JobSearchQuery {
            job_type: Some("freelance".to_string()),
            ..JobSearchQuery::default()
        };
        assert!(query.criteria().unwrap().is_none());

        let query = JobSearchQuery {
            job_type: Some("part_time".to_string()),
            ..JobSearchQuery::default()
        };
        assert_eq!(query.criteria().unwrap().unwrap().job_type, Some(JobType::PartTime));
    }

    #[test]
    fn test_sort_parsing() {
        let query = JobSearchQuery {
            sort_by: Some("salary".to_string()),
            sort_order: Some("ASC".to_string()),
            ..JobSearchQuery::default()
        };
        assert_eq!(
            query.sort().unwrap(),
            Sort {
                key: SortKey::Salary,
                order: SortOrder::Asc
            }
        );

        let query = JobSearchQuery {
            sort_order: Some("sideways".to_string()),
            ..JobSearchQuery::default()
        };
        assert!(matches!(query.sort(), Err(AppError::Validation(_))));
        assert_eq!(JobSearchQuery::default().sort().unwrap(), Sort::newest_first());
    }

    #[test]
    fn test_suggestion_shape() {
        let suggestion = Suggestion::from(Skill {
            id: 4,
            name: "Rust".to_string(),
            category: None,
        });
        assert_eq!(
            serde_json::to_value(&suggestion).unwrap(),
            serde_json::json!({"type": "skill", "value": "Rust", "id": 4})
        );
    }
}
