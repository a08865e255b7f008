//! In-app notification store backed by the `notifications` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::NotificationRow;
use crate::notifications::{NotificationPayload, Notifier, NotifyError, Recipient};
use crate::pagination::{Page, PageRequest};

pub struct DatabaseNotifier {
    db: PgPool,
}

impl DatabaseNotifier {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for DatabaseNotifier {
    async fn send(&self, to: &Recipient, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let data = serde_json::to_value(payload)?;
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, data) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(to.user_id)
        .bind(payload.kind())
        .bind(data)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

pub async fn list_for_user(
    db: &PgPool,
    user_id: i64,
    page: PageRequest,
) -> Result<Page<NotificationRow>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT id, user_id, kind, data, read_at, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    Ok(Page::new(rows, page, total.max(0) as u64))
}

pub async fn unread_count(db: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Returns false when the notification does not exist or belongs to someone else.
pub async fn mark_read(db: &PgPool, user_id: i64, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = COALESCE(read_at, NOW()) WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(db: &PgPool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(db: &PgPool, user_id: i64, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
