use sqlx::PgPool;

use crate::models::application::{Application, ApplicationOverview, ApplicationStatus};
use crate::pagination::{Page, PageRequest};

const OVERVIEW_SELECT: &str = r#"
    SELECT a.id, a.job_listing_id, a.candidate_id, a.cover_letter, a.status,
           a.created_at, a.updated_at,
           jl.title AS job_title, c.name AS company_name, jl.user_id AS recruiter_id,
           u.name AS candidate_name, u.email AS candidate_email
    FROM applications a
    JOIN job_listings jl ON jl.id = a.job_listing_id
    JOIN companies c ON c.id = jl.company_id
    JOIN users u ON u.id = a.candidate_id
"#;

const APPLICATION_COLUMNS: &str =
    "id, job_listing_id, candidate_id, cover_letter, status, created_at, updated_at";

/// Fails with a unique violation when the candidate already applied.
pub async fn create(
    db: &PgPool,
    job_listing_id: i64,
    candidate_id: i64,
    cover_letter: Option<&str>,
) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>(&format!(
        "INSERT INTO applications (job_listing_id, candidate_id, cover_letter) \
         VALUES ($1, $2, $3) RETURNING {APPLICATION_COLUMNS}"
    ))
    .bind(job_listing_id)
    .bind(candidate_id)
    .bind(cover_letter)
    .fetch_one(db)
    .await
}

pub async fn find_overview(db: &PgPool, id: i64) -> Result<Option<ApplicationOverview>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationOverview>(&format!("{OVERVIEW_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn page_where(
    db: &PgPool,
    column: &str,
    value: i64,
    page: PageRequest,
) -> Result<Page<ApplicationOverview>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM applications a JOIN job_listings jl ON jl.id = a.job_listing_id \
         WHERE {column} = $1"
    ))
    .bind(value)
    .fetch_one(db)
    .await?;

    let rows = sqlx::query_as::<_, ApplicationOverview>(&format!(
        "{OVERVIEW_SELECT} WHERE {column} = $1 ORDER BY a.created_at DESC, a.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(value)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

pub async fn for_candidate(
    db: &PgPool,
    candidate_id: i64,
    page: PageRequest,
) -> Result<Page<ApplicationOverview>, sqlx::Error> {
    page_where(db, "a.candidate_id", candidate_id, page).await
}

/// Applications to listings posted by `recruiter_id`.
pub async fn for_recruiter(
    db: &PgPool,
    recruiter_id: i64,
    page: PageRequest,
) -> Result<Page<ApplicationOverview>, sqlx::Error> {
    page_where(db, "jl.user_id", recruiter_id, page).await
}

pub async fn recent(db: &PgPool, limit: i64) -> Result<Vec<ApplicationOverview>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationOverview>(&format!(
        "{OVERVIEW_SELECT} ORDER BY a.created_at DESC, a.id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Compare-and-set on the status so concurrent decisions cannot both win.
pub async fn update_status(
    db: &PgPool,
    id: i64,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE applications SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
