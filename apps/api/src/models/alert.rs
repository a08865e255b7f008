use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::matching::criteria::{Criteria, CriteriaPatch};
use crate::models::listing::JobType;
use crate::notifications::Recipient;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobAlert {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub is_active: bool,
    /// Watermark: listings created at or before this instant were already sent.
    pub last_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobAlert {
    pub fn criteria(&self) -> Criteria {
        Criteria {
            title: self.title.clone(),
            location: self.location.clone(),
            job_type: self.job_type,
            keywords: self.keywords.clone(),
            excluded_keywords: self.excluded_keywords.clone(),
            ..Criteria::default()
        }
    }

    /// Overwrites the fields present in `patch`.
    pub fn apply(&mut self, patch: CriteriaPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(job_type) = patch.job_type {
            self.job_type = job_type;
        }
        if let Some(keywords) = patch.keywords {
            self.keywords = keywords;
        }
        if let Some(excluded) = patch.excluded_keywords {
            self.excluded_keywords = excluded;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

/// An active alert together with the user it notifies.
#[derive(Debug, Clone, FromRow)]
pub struct AlertWithOwner {
    #[sqlx(flatten)]
    pub alert: JobAlert,
    pub owner_name: String,
    pub owner_email: String,
}

impl AlertWithOwner {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            user_id: self.alert.user_id,
            name: self.owner_name.clone(),
            email: self.owner_email.clone(),
        }
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn alert(id: i64, keywords: &[&str]) -> JobAlert {
        let now = Utc::now();
        JobAlert {
            id,
            user_id: 100 + id,
            title: None,
            location: None,
            job_type: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            excluded_keywords: vec![],
            is_active: true,
            last_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::alert;
    use super::*;

    #[test]
    fn test_apply_only_touches_sent_fields() {
        let mut a = alert(1, &["php"]);
        a.title = Some("Backend".to_string());
        a.apply(CriteriaPatch {
            location: Some(Some("Douala".to_string())),
            title: Some(None),
            is_active: Some(false),
            ..CriteriaPatch::default()
        });

        assert_eq!(a.title, None);
        assert_eq!(a.location.as_deref(), Some("Douala"));
        assert_eq!(a.keywords, vec!["php"]);
        assert!(!a.is_active);
    }
}
