use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    /// Statuses only move forward: submitted → shortlisted → hired, and
    /// rejected/hired are terminal.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Submitted, Shortlisted) | (Submitted, Rejected) | (Submitted, Hired)
                | (Shortlisted, Rejected) | (Shortlisted, Hired)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub job_listing_id: i64,
    pub candidate_id: i64,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An application joined with the listing title, company and candidate name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub company_name: String,
    pub recruiter_id: i64,
    pub candidate_name: String,
    pub candidate_email: String,
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::*;

    #[test]
    fn test_status_only_moves_forward() {
        assert!(Submitted.can_transition_to(Shortlisted));
        assert!(Submitted.can_transition_to(Hired));
        assert!(Shortlisted.can_transition_to(Hired));
        assert!(!Shortlisted.can_transition_to(Submitted));
        assert!(!Rejected.can_transition_to(Shortlisted));
        assert!(!Hired.can_transition_to(Rejected));
        assert!(!Submitted.can_transition_to(Submitted));
    }
}
