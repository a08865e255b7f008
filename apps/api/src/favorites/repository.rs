use sqlx::PgPool;

use crate::listings::repository::LISTING_SELECT;
use crate::models::favorite::FavoriteEntry;
use crate::pagination::{Page, PageRequest};

pub async fn list_for_user(
    db: &PgPool,
    user_id: i64,
    page: PageRequest,
) -> Result<Page<FavoriteEntry>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;

    // Reuse the listing projection, prefixed with the favorite's own columns.
    let listing_select = LISTING_SELECT.replacen(
        "SELECT ",
        "SELECT f.id AS favorite_id, f.created_at AS favorited_at, ",
        1,
    );
    let rows = sqlx::query_as::<_, FavoriteEntry>(&format!(
        "{listing_select} JOIN favorites f ON f.job_listing_id = jl.id \
         WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

/// Returns false when the listing was already a favorite.
pub async fn add(db: &PgPool, user_id: i64, job_listing_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, job_listing_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, job_listing_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(job_listing_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when there was nothing to remove.
pub async fn remove(db: &PgPool, user_id: i64, job_listing_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND job_listing_id = $2")
        .bind(user_id)
        .bind(job_listing_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
