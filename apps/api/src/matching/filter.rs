//! Candidate filter: narrows the open listings down to those matching a
//! [`Criteria`], then orders them.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::matching::criteria::Criteria;
use crate::models::listing::JobListing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Salary,
    Deadline,
    Views,
}

impl SortKey {
    /// Unrecognised keys fall back to creation time.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "salary" | "salary_max" => SortKey::Salary,
            "deadline" => SortKey::Deadline,
            "views" | "views_count" => SortKey::Views,
            _ => SortKey::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Sort {
    pub fn newest_first() -> Self {
        Sort::default()
    }
}

/// Criteria with every needle lowercased once, applied per listing.
struct Predicate<'c> {
    criteria: &'c Criteria,
    title: Option<String>,
    location: Option<String>,
    keywords: Vec<String>,
    excluded_keywords: Vec<String>,
}

impl<'c> Predicate<'c> {
    fn new(criteria: &'c Criteria) -> Self {
        let lower = |s: &String| s.to_lowercase();
        Self {
            criteria,
            title: criteria.title.as_ref().map(lower),
            location: criteria.location.as_ref().map(lower),
            keywords: criteria.keywords.iter().map(lower).collect(),
            excluded_keywords: criteria.excluded_keywords.iter().map(lower).collect(),
        }
    }

    fn test(&self, listing: &JobListing) -> bool {
        let c = self.criteria;

        if let Some(since) = c.since {
            if listing.created_at <= since {
                return false;
            }
        }
        if let Some(job_type) = c.job_type {
            if listing.job_type != job_type {
                return false;
            }
        }
        if let Some(company_id) = c.company_id {
            if listing.company_id != company_id {
                return false;
            }
        }
        if let Some(floor) = c.salary_min {
            if !listing.salary_max.is_some_and(|max| max >= floor) {
                return false;
            }
        }
        if let Some(ceiling) = c.salary_max {
            if !listing.salary_min.is_some_and(|min| min <= ceiling) {
                return false;
            }
        }

        let title = listing.title.to_lowercase();
        if let Some(needle) = &self.title {
            if !title.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.location {
            if !listing.location.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if self.keywords.is_empty() && self.excluded_keywords.is_empty() {
            return true;
        }

        let fields = [
            title,
            listing.description.to_lowercase(),
            listing.requirements_text().to_lowercase(),
        ];
        let in_any_field = |keyword: &String| fields.iter().any(|f| f.contains(keyword.as_str()));

        if !self.keywords.is_empty() && !self.keywords.iter().any(in_any_field) {
            return false;
        }
        // A listing survives an excluded keyword only if the keyword is absent
        // from title AND description AND requirements.
        !self.excluded_keywords.iter().any(in_any_field)
    }
}

/// Returns the open listings matching `criteria`, in the input order.
pub fn filter_listings<'a>(
    listings: &'a [JobListing],
    criteria: &Criteria,
    now: DateTime<Utc>,
) -> Vec<&'a JobListing> {
    let predicate = Predicate::new(criteria);
    listings
        .iter()
        .filter(|listing| listing.is_open(now) && predicate.test(listing))
        .collect()
}

/// Stable sort: listings with equal keys keep their relative input order.
/// Missing salaries sort first ascending and last descending.
pub fn sort_listings(listings: &mut [&JobListing], sort: Sort) {
    let compare = |a: &&JobListing, b: &&JobListing| -> Ordering {
        match sort.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Salary => a.salary_max.cmp(&b.salary_max),
            SortKey::Deadline => a.deadline.cmp(&b.deadline),
            SortKey::Views => a.views_count.cmp(&b.views_count),
        }
    };
    match sort.order {
        SortOrder::Asc => listings.sort_by(compare),
        SortOrder::Desc => listings.sort_by(|a, b| compare(b, a)),
    }
}

/// Filter then sort. `listings` is expected in id order so ties stay stable.
pub fn search<'a>(
    listings: &'a [JobListing],
    criteria: &Criteria,
    sort: Sort,
    now: DateTime<Utc>,
) -> Vec<&'a JobListing> {
    let mut matched = filter_listings(listings, criteria, now);
    sort_listings(&mut matched, sort);
    matched
}
