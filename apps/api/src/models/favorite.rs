use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::listing::JobListing;

/// A favorited listing; favorite columns are aliased so they don't collide
/// with the flattened listing columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FavoriteEntry {
    pub favorite_id: i64,
    pub favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub job_listing: JobListing,
}
