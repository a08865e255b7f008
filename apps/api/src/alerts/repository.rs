use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::alerts::dispatcher::AlertStore;
use crate::listings::repository as listings;
use crate::matching::criteria::CriteriaPatch;
use crate::models::alert::{AlertWithOwner, JobAlert};
use crate::models::listing::JobListing;
use crate::pagination::{Page, PageRequest};

const ALERT_COLUMNS: &str = "id, user_id, title, location, job_type, keywords, excluded_keywords, \
                             is_active, last_sent_at, created_at, updated_at";

pub struct PgAlertStore {
    db: PgPool,
}

impl PgAlertStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn active_alerts(&self) -> Result<Vec<AlertWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, AlertWithOwner>(
            r#"
            SELECT a.id, a.user_id, a.title, a.location, a.job_type, a.keywords,
                   a.excluded_keywords, a.is_active, a.last_sent_at, a.created_at,
                   a.updated_at, u.name AS owner_name, u.email AS owner_email
            FROM job_alerts a
            JOIN users u ON u.id = a.user_id
            WHERE a.is_active
            ORDER BY a.id
            "#,
        )
        .fetch_all(&self.db)
        .await
    }

    async fn open_listings(&self, now: DateTime<Utc>) -> Result<Vec<JobListing>, sqlx::Error> {
        listings::open_listings(&self.db, now).await
    }

    async fn mark_sent(&self, alert_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE job_alerts SET last_sent_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(alert_id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

pub async fn list_for_user(
    db: &PgPool,
    user_id: i64,
    page: PageRequest,
) -> Result<Page<JobAlert>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_alerts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, JobAlert>(&format!(
        "SELECT {ALERT_COLUMNS} FROM job_alerts WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

pub async fn find(db: &PgPool, id: i64) -> Result<Option<JobAlert>, sqlx::Error> {
    sqlx::query_as::<_, JobAlert>(&format!("SELECT {ALERT_COLUMNS} FROM job_alerts WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn create(db: &PgPool, user_id: i64, patch: &CriteriaPatch) -> Result<JobAlert, sqlx::Error> {
    sqlx::query_as::<_, JobAlert>(&format!(
        r#"
        INSERT INTO job_alerts (user_id, title, location, job_type, keywords, excluded_keywords, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ALERT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(patch.title.clone().flatten())
    .bind(patch.location.clone().flatten())
    .bind(patch.job_type.flatten())
    .bind(patch.keywords.clone().unwrap_or_default())
    .bind(patch.excluded_keywords.clone().unwrap_or_default())
    .bind(patch.is_active.unwrap_or(true))
    .fetch_one(db)
    .await
}

/// Writes back an alert after a patch has been applied in memory.
pub async fn save(db: &PgPool, alert: &JobAlert) -> Result<JobAlert, sqlx::Error> {
    sqlx::query_as::<_, JobAlert>(&format!(
        r#"
        UPDATE job_alerts
        SET title = $2, location = $3, job_type = $4, keywords = $5,
            excluded_keywords = $6, is_active = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {ALERT_COLUMNS}
        "#
    ))
    .bind(alert.id)
    .bind(&alert.title)
    .bind(&alert.location)
    .bind(alert.job_type)
    .bind(&alert.keywords)
    .bind(&alert.excluded_keywords)
    .bind(alert.is_active)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM job_alerts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
