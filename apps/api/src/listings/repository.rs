use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::matching::criteria::Criteria;
use crate::models::listing::{JobListing, JobType, ListingStatus};
use crate::pagination::{Page, PageRequest};

/// Listing columns joined with the company name, as `JobListing` expects them.
pub const LISTING_SELECT: &str = r#"
    SELECT jl.id, jl.company_id, c.name AS company_name, jl.user_id, jl.title,
           jl.description, jl.requirements, jl.job_type, jl.location,
           jl.salary_min, jl.salary_max, jl.deadline, jl.status,
           jl.rejection_reason, jl.views_count, jl.created_at, jl.updated_at
    FROM job_listings jl
    JOIN companies c ON c.id = jl.company_id
"#;

pub struct NewListing<'a> {
    pub company_id: i64,
    pub user_id: i64,
    pub title: &'a str,
    pub description: &'a str,
    pub requirements: Option<&'a str>,
    pub job_type: JobType,
    pub location: &'a str,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub deadline: NaiveDate,
}

/// The structured part of a [`Criteria`]. It is evaluated in SQL so only
/// plausible rows leave the database; text predicates still run in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingNarrowing {
    pub job_type: Option<JobType>,
    pub company_id: Option<i64>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub since: Option<DateTime<Utc>>,
}

impl From<&Criteria> for ListingNarrowing {
    fn from(criteria: &Criteria) -> Self {
        Self {
            job_type: criteria.job_type,
            company_id: criteria.company_id,
            salary_min: criteria.salary_min,
            salary_max: criteria.salary_max,
            since: criteria.since,
        }
    }
}

/// Approved listings whose deadline has not passed, in id order.
pub async fn open_listings(db: &PgPool, now: DateTime<Utc>) -> Result<Vec<JobListing>, sqlx::Error> {
    open_listings_matching(db, now, ListingNarrowing::default()).await
}

/// Open listings that also pass the structured criteria, in id order.
pub async fn open_listings_matching(
    db: &PgPool,
    now: DateTime<Utc>,
    narrowing: ListingNarrowing,
) -> Result<Vec<JobListing>, sqlx::Error> {
    sqlx::query_as::<_, JobListing>(&format!(
        r#"{LISTING_SELECT}
        WHERE jl.status = 'approved'
          AND jl.deadline >= $1
          AND ($2::job_type IS NULL OR jl.job_type = $2)
          AND ($3::BIGINT IS NULL OR jl.company_id = $3)
          AND ($4::INTEGER IS NULL OR jl.salary_max >= $4)
          AND ($5::INTEGER IS NULL OR jl.salary_min <= $5)
          AND ($6::TIMESTAMPTZ IS NULL OR jl.created_at > $6)
        ORDER BY jl.id"#
    ))
    .bind(now.date_naive())
    .bind(narrowing.job_type)
    .bind(narrowing.company_id)
    .bind(narrowing.salary_min)
    .bind(narrowing.salary_max)
    .bind(narrowing.since)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> Result<Option<JobListing>, sqlx::Error> {
    sqlx::query_as::<_, JobListing>(&format!("{LISTING_SELECT} WHERE jl.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn increment_views(db: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE job_listings SET views_count = views_count + 1 WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Inserts a listing awaiting moderation.
pub async fn create_pending(db: &PgPool, listing: NewListing<'_>) -> Result<JobListing, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO job_listings
            (company_id, user_id, title, description, requirements, job_type,
             location, salary_min, salary_max, deadline, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
        RETURNING id
        "#,
    )
    .bind(listing.company_id)
    .bind(listing.user_id)
    .bind(listing.title)
    .bind(listing.description)
    .bind(listing.requirements)
    .bind(listing.job_type)
    .bind(listing.location)
    .bind(listing.salary_min)
    .bind(listing.salary_max)
    .bind(listing.deadline)
    .fetch_one(db)
    .await?;

    find(db, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn for_recruiter(
    db: &PgPool,
    user_id: i64,
    page: PageRequest,
) -> Result<Page<JobListing>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_listings WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, JobListing>(&format!(
        "{LISTING_SELECT} WHERE jl.user_id = $1 ORDER BY jl.created_at DESC, jl.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

pub async fn with_status(
    db: &PgPool,
    status: ListingStatus,
    page: PageRequest,
) -> Result<Page<JobListing>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_listings WHERE status = $1")
        .bind(status)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, JobListing>(&format!(
        "{LISTING_SELECT} WHERE jl.status = $1 ORDER BY jl.created_at DESC, jl.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

pub async fn recent(db: &PgPool, limit: i64) -> Result<Vec<JobListing>, sqlx::Error> {
    sqlx::query_as::<_, JobListing>(&format!(
        "{LISTING_SELECT} ORDER BY jl.created_at DESC, jl.id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Moves a pending listing to `status`. Returns false when the listing is
/// no longer pending.
pub async fn moderate(
    db: &PgPool,
    id: i64,
    status: ListingStatus,
    rejection_reason: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE job_listings
        SET status = $2, rejection_reason = $3, updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(rejection_reason)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
