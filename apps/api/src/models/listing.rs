use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown job type '{s}'"))
    }
}

/// Moderation lifecycle: draft → pending → approved | rejected → closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Closed,
}

/// A job listing joined with its company name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListing {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub job_type: JobType,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub deadline: NaiveDate,
    pub status: ListingStatus,
    pub rejection_reason: Option<String>,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobListing {
    /// Only approved listings whose deadline has not passed are visible to
    /// search, alerts and applications. The deadline day itself still counts.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == ListingStatus::Approved && self.deadline >= now.date_naive()
    }

    pub fn requirements_text(&self) -> &str {
        self.requirements.as_deref().unwrap_or_default()
    }

    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            id: self.id,
            title: self.title.clone(),
            company: self.company_name.clone(),
            location: self.location.clone(),
        }
    }
}

/// Compact listing shape carried inside notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// An approved listing created at `2025-09-01 + id hours`, open until 2030.
    pub fn listing(id: i64, title: &str, description: &str) -> JobListing {
        let created_at = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
            + chrono::Duration::hours(id);
        JobListing {
            id,
            company_id: 1,
            company_name: "Acme".to_string(),
            user_id: 1,
            title: title.to_string(),
            description: description.to_string(),
            requirements: None,
            job_type: JobType::FullTime,
            location: "Douala".to_string(),
            salary_min: None,
            salary_max: None,
            deadline: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status: ListingStatus::Approved,
            rejection_reason: None,
            views_count: 0,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::listing;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_job_type_round_trips_through_str() {
        for job_type in JobType::ALL {
            assert_eq!(job_type.as_str().parse::<JobType>().unwrap(), job_type);
        }
        assert!("freelance".parse::<JobType>().is_err());
    }

    #[test]
    fn test_open_requires_approval_and_future_deadline() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let mut job = listing(1, "Dev", "");
        assert!(job.is_open(now));

        job.deadline = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert!(job.is_open(now), "deadline day is inclusive");

        job.deadline = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert!(!job.is_open(now));

        let mut pending = listing(2, "Dev", "");
        pending.status = ListingStatus::Pending;
        assert!(!pending.is_open(now));
    }
}
