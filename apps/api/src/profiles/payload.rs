use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::errors::{check_fields, AppError, FieldErrors};
use crate::models::profile::{Gender, SkillLevel};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SkillInput {
    pub id: i64,
    #[serde(default)]
    pub level: Option<SkillLevel>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExperienceInput {
    #[validate(length(min = 1, max = 255, message = "The company name field is required (max 255 characters)."))]
    pub company_name: String,
    #[validate(length(min = 1, max = 255, message = "The position field is required (max 255 characters)."))]
    pub position: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EducationInput {
    #[validate(length(min = 1, max = 255, message = "The institution field is required (max 255 characters)."))]
    pub institution: String,
    #[validate(length(min = 1, max = 255, message = "The degree field is required (max 255 characters)."))]
    pub degree: String,
    #[validate(length(max = 255))]
    pub field_of_study: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 4.0, message = "The gpa must be between 0 and 4."))]
    pub gpa: Option<f64>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Body of `POST`/`PUT /api/candidate/profile`. Absent lists are left
/// untouched; a present list replaces the stored one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfilePayload {
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[validate(url, length(max = 255))]
    pub linkedin_url: Option<String>,
    #[validate(url, length(max = 255))]
    pub github_url: Option<String>,
    #[validate(url, length(max = 255))]
    pub portfolio_url: Option<String>,
    #[validate(nested)]
    pub skills: Option<Vec<SkillInput>>,
    #[validate(nested)]
    pub experiences: Option<Vec<ExperienceInput>>,
    #[validate(nested)]
    pub educations: Option<Vec<EducationInput>>,
}

fn push(fields: &mut FieldErrors, field: String, message: &str) {
    fields.entry(field).or_default().push(message.to_string());
}

impl ProfilePayload {
    /// Field rules plus the checks that span several fields.
    pub fn check(&self, today: NaiveDate) -> Result<(), AppError> {
        let mut extra = FieldErrors::new();

        if self.date_of_birth.is_some_and(|dob| dob >= today) {
            push(&mut extra, "date_of_birth".to_string(), "The date of birth must be a date before today.");
        }

        let experiences = self.experiences.as_deref().unwrap_or_default();
        for (i, exp) in experiences.iter().enumerate() {
            if exp.end_date.is_some_and(|end| end <= exp.start_date) {
                push(&mut extra, format!("experiences.{i}.end_date"), "The end date must be after the start date.");
            }
        }
        if experiences.iter().filter(|e| e.is_current).count() > 1 {
            push(&mut extra, "experiences".to_string(), "Only one experience can be marked as current.");
        }

        for (i, edu) in self.educations.as_deref().unwrap_or_default().iter().enumerate() {
            if edu.end_date.is_some_and(|end| end <= edu.start_date) {
                push(&mut extra, format!("educations.{i}.end_date"), "The end date must be after the start date.");
            }
        }

        check_fields(self.validate(), extra)
    }

    /// Distinct skill ids in first-seen order.
    pub fn skill_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for skill in self.skills.as_deref().unwrap_or_default() {
            if !ids.contains(&skill.id) {
                ids.push(skill.id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn parse(value: serde_json::Value) -> ProfilePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_complete_profile_passes() {
        let payload = parse(json!({
            "address": "Douala, Littoral",
            "linkedin_url": "https://linkedin.com/in/alice",
            "skills": [{"id": 1, "level": "advanced"}, {"id": 2}],
            "experiences": [{
                "company_name": "Acme", "position": "Developer",
                "start_date": "2020-01-01", "end_date": "2022-01-01"
            }],
            "educations": [{
                "institution": "Université de Douala", "degree": "Licence",
                "start_date": "2015-09-01", "gpa": 3.4
            }]
        }));
        assert!(payload.check(today()).is_ok());
        assert_eq!(payload.skill_ids(), vec![1, 2]);
    }

    #[test]
    fn test_nested_and_cross_field_errors_use_dotted_paths() {
        let payload = parse(json!({
            "linkedin_url": "not a url",
            "experiences": [
                {"company_name": "", "position": "Dev", "start_date": "2020-01-01", "is_current": true},
                {"company_name": "B", "position": "Dev", "start_date": "2021-01-01",
                 "end_date": "2020-01-01", "is_current": true}
            ],
            "educations": [{"institution": "U", "degree": "BSc", "start_date": "2015-01-01", "gpa": 4.5}]
        }));

        let Err(AppError::InvalidFields(fields)) = payload.check(today()) else {
            panic!("expected InvalidFields");
        };
        assert!(fields.contains_key("linkedin_url"));
        assert!(fields.contains_key("experiences.0.company_name"));
        assert!(fields.contains_key("experiences.1.end_date"));
        assert!(fields.contains_key("experiences"));
        assert!(fields.contains_key("educations.0.gpa"));
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let payload = parse(json!({ "date_of_birth": "2030-01-01" }));
        assert!(matches!(
            payload.check(today()),
            Err(AppError::InvalidFields(f)) if f.contains_key("date_of_birth")
        ));
    }

    #[test]
    fn test_duplicate_skill_ids_collapse() {
        let payload = parse(json!({ "skills": [{"id": 3}, {"id": 3}, {"id": 1}] }));
        assert_eq!(payload.skill_ids(), vec![3, 1]);
    }
}
