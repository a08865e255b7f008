use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfileRow {
    pub id: i64,
    pub user_id: i64,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSkill {
    pub skill_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: i64,
    pub company_name: String,
    pub position: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: i64,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<f64>,
    pub description: Option<String>,
}

/// A candidate profile with its skills, experiences and educations loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(flatten)]
    pub profile: CandidateProfileRow,
    pub skills: Vec<CandidateSkill>,
    pub experiences: Vec<Experience>,
    pub educations: Vec<Education>,
}

impl CandidateProfile {
    pub fn address(&self) -> Option<&str> {
        self.profile.address.as_deref()
    }

    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn profile(skills: &[&str], experiences: usize, address: Option<&str>) -> CandidateProfile {
        let now = Utc::now();
        CandidateProfile {
            profile: CandidateProfileRow {
                id: 1,
                user_id: 1,
                phone_number: None,
                address: address.map(str::to_string),
                date_of_birth: None,
                gender: None,
                bio: None,
                linkedin_url: None,
                github_url: None,
                portfolio_url: None,
                is_complete: true,
                created_at: now,
                updated_at: now,
            },
            skills: skills
                .iter()
                .enumerate()
                .map(|(i, name)| CandidateSkill {
                    skill_id: i as i64 + 1,
                    name: name.to_string(),
                    category: Some("technical".to_string()),
                    level: SkillLevel::Intermediate,
                })
                .collect(),
            experiences: (0..experiences)
                .map(|i| Experience {
                    id: i as i64 + 1,
                    company_name: format!("Company {i}"),
                    position: "Developer".to_string(),
                    description: None,
                    start_date: NaiveDate::from_ymd_opt(2015 + i as i32, 1, 1).unwrap(),
                    end_date: None,
                    is_current: false,
                })
                .collect(),
            educations: vec![],
        }
    }
}
