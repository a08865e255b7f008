//! Criteria model shared by ad hoc search and stored job alerts, plus the
//! boundary validation that turns an untyped JSON body into typed criteria.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, FieldErrors};
use crate::models::listing::JobType;

const MAX_TEXT_LEN: usize = 255;

/// What a listing has to look like to match. Every field is optional; an
/// absent field does not narrow the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Criteria {
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    /// Keep a listing if ANY keyword occurs in its title, description or requirements.
    pub keywords: Vec<String>,
    /// Keep a listing only while every excluded keyword is absent from all three fields.
    pub excluded_keywords: Vec<String>,
    /// Listing `salary_max` must be at least this much.
    pub salary_min: Option<i32>,
    /// Listing `salary_min` must be at most this much.
    pub salary_max: Option<i32>,
    pub company_id: Option<i64>,
    /// Exclusive lower bound on listing creation time.
    pub since: Option<DateTime<Utc>>,
}

impl Criteria {
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Drops empty strings and blank keywords so they never act as filters.
    pub fn normalized(mut self) -> Self {
        self.title = non_blank(self.title);
        self.location = non_blank(self.location);
        self.keywords = normalize_keywords(self.keywords);
        self.excluded_keywords = normalize_keywords(self.excluded_keywords);
        self
    }
}

/// A validated partial update of an alert's criteria.
///
/// Outer `None` means "field not sent"; `Some(None)` means "clear it".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaPatch {
    pub title: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub job_type: Option<Option<JobType>>,
    pub keywords: Option<Vec<String>>,
    pub excluded_keywords: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl CriteriaPatch {
    /// Validates a raw JSON body, reporting every malformed field at once.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let Some(obj) = body.as_object() else {
            return Err(AppError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let mut errors = FieldErrors::new();
        let patch = CriteriaPatch {
            title: optional_text(obj, "title", &mut errors),
            location: optional_text(obj, "location", &mut errors),
            job_type: optional_job_type(obj, &mut errors),
            keywords: keyword_list(obj, "keywords", &mut errors),
            excluded_keywords: keyword_list(obj, "excluded_keywords", &mut errors),
            is_active: optional_bool(obj, "is_active", &mut errors),
        };

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn optional_text(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match obj.get(field)? {
        Value::Null => Some(None),
        Value::String(s) if s.chars().count() > MAX_TEXT_LEN => {
            push(
                errors,
                field,
                format!("The {field} may not be greater than {MAX_TEXT_LEN} characters."),
            );
            None
        }
        Value::String(s) => Some(non_blank(Some(s.clone()))),
        _ => {
            push(errors, field, format!("The {field} must be a string."));
            None
        }
    }
}

fn optional_job_type(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<Option<JobType>> {
    match obj.get("job_type")? {
        Value::Null => Some(None),
        Value::String(s) if s.is_empty() => Some(None),
        Value::String(s) => match s.parse::<JobType>() {
            Ok(job_type) => Some(Some(job_type)),
            Err(_) => {
                push(
                    errors,
                    "job_type",
                    format!(
                        "The selected job type is invalid. Allowed: {}.",
                        JobType::ALL.map(|t| t.as_str()).join(", ")
                    ),
                );
                None
            }
        },
        _ => {
            push(errors, "job_type", "The job type must be a string.".to_string());
            None
        }
    }
}

fn keyword_list(obj: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<Vec<String>> {
    match obj.get(field)? {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => {
            let mut keywords = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) if s.chars().count() <= MAX_TEXT_LEN => keywords.push(s.clone()),
                    Value::String(_) => push(
                        errors,
                        &format!("{field}.{index}"),
                        format!("Keywords may not be greater than {MAX_TEXT_LEN} characters."),
                    ),
                    _ => push(
                        errors,
                        &format!("{field}.{index}"),
                        "Each keyword must be a string.".to_string(),
                    ),
                }
            }
            Some(normalize_keywords(keywords))
        }
        _ => {
            push(errors, field, format!("The {field} must be an array."));
            None
        }
    }
}

fn optional_bool(obj: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<bool> {
    match obj.get(field)? {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        _ => {
            push(errors, field, format!("The {field} field must be true or false."));
            None
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Trims keywords, drops blanks and repeated entries, keeps first-seen order.
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim();
        if !keyword.is_empty() && !out.iter().any(|k| k == keyword) {
            out.push(keyword.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload_parses() {
        let patch = CriteriaPatch::from_json(&json!({
            "title": "Développeur Laravel",
            "location": "Yaoundé",
            "job_type": "full_time",
            "keywords": ["PHP", "Laravel", "MySQL"],
            "excluded_keywords": ["WordPress"]
        }))
        .unwrap();

        assert_eq!(patch.title, Some(Some("Développeur Laravel".to_string())));
        assert_eq!(patch.job_type, Some(Some(JobType::FullTime)));
        assert_eq!(patch.keywords.unwrap(), vec!["PHP", "Laravel", "MySQL"]);
        assert_eq!(patch.excluded_keywords.unwrap(), vec!["WordPress"]);
        assert_eq!(patch.is_active, None);
    }

    #[test]
    fn test_invalid_job_type_and_non_list_keywords_are_both_reported() {
        let err = CriteriaPatch::from_json(&json!({
            "job_type": "invalid_type",
            "keywords": "not_an_array"
        }))
        .unwrap_err();

        let AppError::InvalidFields(fields) = err else {
            panic!("expected InvalidFields, got {err:?}");
        };
        assert!(fields.contains_key("job_type"));
        assert!(fields.contains_key("keywords"));
    }

    #[test]
    fn test_non_string_keyword_reports_its_index() {
        let err = CriteriaPatch::from_json(&json!({ "excluded_keywords": ["ok", 3] })).unwrap_err();
        let AppError::InvalidFields(fields) = err else {
            panic!("expected InvalidFields");
        };
        assert!(fields.contains_key("excluded_keywords.1"));
    }

    #[test]
    fn test_absent_null_and_empty_are_distinct() {
        let patch = CriteriaPatch::from_json(&json!({ "title": null, "location": "", "keywords": null }))
            .unwrap();
        assert_eq!(patch.title, Some(None));
        assert_eq!(patch.location, Some(None));
        assert_eq!(patch.keywords, Some(vec![]));
        assert_eq!(patch.job_type, None);
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        assert!(matches!(
            CriteriaPatch::from_json(&json!(["title"])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_is_active_must_be_boolean() {
        let err = CriteriaPatch::from_json(&json!({ "is_active": "yes" })).unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(f) if f.contains_key("is_active")));
    }

    #[test]
    fn test_overlong_title_rejected() {
        let err = CriteriaPatch::from_json(&json!({ "title": "x".repeat(256) })).unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(f) if f.contains_key("title")));
    }

    #[test]
    fn test_keywords_are_trimmed_and_deduplicated() {
        let keywords = normalize_keywords(vec![
            " PHP ".to_string(),
            "".to_string(),
            "PHP".to_string(),
            "Laravel".to_string(),
        ]);
        assert_eq!(keywords, vec!["PHP", "Laravel"]);
    }

    #[test]
    fn test_normalized_drops_blank_filters() {
        let criteria = Criteria {
            title: Some("  ".to_string()),
            keywords: vec!["".to_string()],
            ..Criteria::default()
        }
        .normalized();
        assert_eq!(criteria, Criteria::default());
    }
}
