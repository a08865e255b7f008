//! Acting-user resolution. Authentication happens upstream; this service
//! trusts the `X-User-Id` header it forwards.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user making the request. Extracting it fails with 401 when the
/// header is missing, malformed or names an unknown user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// 403 unless the user has `role`.
    pub fn require(&self, role: Role) -> Result<&User, AppError> {
        if self.0.role == role {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                role_name(role)
            )))
        }
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Candidate => "candidate",
        Role::Recruiter => "recruiter",
        Role::Admin => "admin",
    }
}

/// Parses the header value; `None` for anything that is not a positive id.
pub fn parse_user_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

pub async fn find_user(db: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, company_id, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn users_with_role(db: &PgPool, role: Role) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, company_id, created_at FROM users WHERE role = $1 ORDER BY id",
    )
    .bind(role)
    .fetch_all(db)
    .await
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_user_id)
            .ok_or(AppError::Unauthorized)?;

        let user = find_user(&state.db, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}
