//! Relevance score of a listing for a candidate, 0 to 100.

use serde::Serialize;

use crate::models::listing::JobListing;
use crate::models::profile::CandidateProfile;

const SKILL_WEIGHT: f64 = 40.0;
const EXPERIENCE_POINTS_PER_ENTRY: u32 = 5;
const EXPERIENCE_CAP: u32 = 30;
const LOCATION_WEIGHT: f64 = 20.0;
const FLAT_BONUS: f64 = 10.0;
const MAX_SCORE: f64 = 100.0;

/// Technical skill tokens looked up in listing text by substring.
pub const SKILL_VOCABULARY: [&str; 34] = [
    "php", "laravel", "javascript", "react", "vue", "angular", "node.js",
    "python", "django", "flask", "java", "spring", "c#", ".net",
    "mysql", "postgresql", "mongodb", "redis", "docker", "kubernetes",
    "aws", "azure", "git", "linux", "html", "css", "bootstrap",
    "tailwind", "sass", "less", "webpack", "vite", "npm", "yarn",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Centre,
    Littoral,
    Ouest,
    Nord,
    Sud,
}

/// First region listing a city wins, so kribi resolves to Littoral.
const REGIONS: [(Region, &[&str]); 5] = [
    (Region::Centre, &["yaoundé", "yaounde", "mbalmayo", "monatélé"]),
    (Region::Littoral, &["douala", "limbe", "kribi", "edéa"]),
    (Region::Ouest, &["bafoussam", "bamenda", "dschang", "foumban"]),
    (Region::Nord, &["garoua", "maroua", "ngaoundéré", "bertoua"]),
    (Region::Sud, &["eyomojock", "kribi", "sangmélima"]),
];

pub fn region_of(city: &str) -> Option<Region> {
    REGIONS
        .iter()
        .find(|(_, cities)| cities.contains(&city))
        .map(|(region, _)| *region)
}

/// Vocabulary tokens occurring in the listing's title, description or requirements.
pub fn implied_skills(listing: &JobListing) -> Vec<&'static str> {
    let text = format!(
        "{} {} {}",
        listing.title,
        listing.description,
        listing.requirements_text()
    )
    .to_lowercase();
    SKILL_VOCABULARY
        .into_iter()
        .filter(|token| text.contains(token))
        .collect()
}

fn first_segment(place: &str) -> String {
    place.split(',').next().unwrap_or_default().trim().to_lowercase()
}

/// 1.0 for the same city, 0.7 for the same region, 0.3 otherwise.
/// Two cities missing from the table share the "unknown" region.
pub fn location_factor(candidate_address: &str, job_location: &str) -> f64 {
    let candidate_city = first_segment(candidate_address);
    let job_city = first_segment(job_location);
    if candidate_city == job_city {
        return 1.0;
    }
    if region_of(&candidate_city) == region_of(&job_city) {
        0.7
    } else {
        0.3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
    pub bonus: f64,
    pub total: u8,
}

pub trait MatchScorer: Send + Sync {
    fn score(&self, listing: &JobListing, profile: &CandidateProfile) -> ScoreBreakdown;
}

/// Skill overlap, experience count, location proximity and a flat bonus.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    fn skill_points(listing: &JobListing, profile: &CandidateProfile) -> f64 {
        if profile.skills.is_empty() {
            return 0.0;
        }
        let implied = implied_skills(listing);
        if implied.is_empty() {
            return 0.0;
        }
        let candidate: Vec<String> = profile.skill_names().map(str::to_lowercase).collect();
        let overlap = implied
            .iter()
            .filter(|token| candidate.iter().any(|name| name == *token))
            .count();
        SKILL_WEIGHT * overlap as f64 / implied.len() as f64
    }

    fn experience_points(profile: &CandidateProfile) -> f64 {
        let entries = u32::try_from(profile.experiences.len()).unwrap_or(u32::MAX);
        entries
            .saturating_mul(EXPERIENCE_POINTS_PER_ENTRY)
            .min(EXPERIENCE_CAP) as f64
    }

    fn location_points(listing: &JobListing, profile: &CandidateProfile) -> f64 {
        match profile.address() {
            Some(address) if !address.trim().is_empty() && !listing.location.trim().is_empty() => {
                LOCATION_WEIGHT * location_factor(address, &listing.location)
            }
            _ => 0.0,
        }
    }
}

impl MatchScorer for HeuristicScorer {
    fn score(&self, listing: &JobListing, profile: &CandidateProfile) -> ScoreBreakdown {
        let skills = Self::skill_points(listing, profile);
        let experience = Self::experience_points(profile);
        let location = Self::location_points(listing, profile);
        let bonus = FLAT_BONUS;

        let sum = skills + experience + location + bonus;
        let total = sum.round().clamp(0.0, MAX_SCORE) as u8;

        ScoreBreakdown {
            skills,
            experience,
            location,
            bonus,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::fixtures::listing;
    use crate::models::profile::fixtures::profile;

    fn php_listing() -> JobListing {
        listing(1, "Backend Engineer", "We build APIs with PHP, Laravel and MySQL.")
    }

    #[test]
    fn test_implied_skills_are_case_insensitive_substrings() {
        assert_eq!(implied_skills(&php_listing()), vec!["php", "laravel", "mysql"]);

        let mut job = listing(2, "Frontend", "React + TypeScript");
        job.requirements = Some("Docker".to_string());
        assert_eq!(implied_skills(&job), vec!["react", "docker"]);
    }

    #[test]
    fn test_full_scenario_scores_72() {
        let candidate = profile(&["PHP", "Laravel"], 3, Some("Douala, Littoral"));
        let breakdown = HeuristicScorer::new().score(&php_listing(), &candidate);

        assert!((breakdown.skills - 80.0 / 3.0).abs() < 1e-9);
        assert_eq!(breakdown.experience, 15.0);
        assert_eq!(breakdown.location, 20.0);
        assert_eq!(breakdown.bonus, 10.0);
        assert_eq!(breakdown.total, 72);
    }

    #[test]
    fn test_listing_without_implied_skills_gives_no_skill_points() {
        let job = listing(1, "Accountant", "Ledgers and payroll");
        let candidate = profile(&["PHP"], 0, None);
        let breakdown = HeuristicScorer::new().score(&job, &candidate);
        assert_eq!(breakdown.skills, 0.0);
        assert_eq!(breakdown.total, 10);
    }

    #[test]
    fn test_candidate_without_skills_gives_no_skill_points() {
        let breakdown = HeuristicScorer::new().score(&php_listing(), &profile(&[], 0, None));
        assert_eq!(breakdown.skills, 0.0);
    }

    #[test]
    fn test_experience_is_capped() {
        let breakdown = HeuristicScorer::new().score(&php_listing(), &profile(&[], 12, None));
        assert_eq!(breakdown.experience, 30.0);
    }

    #[test]
    fn test_location_factor_tiers() {
        assert_eq!(location_factor("Douala, Littoral", "douala"), 1.0);
        assert_eq!(location_factor("Limbe", "Douala, Bonanjo"), 0.7);
        assert_eq!(location_factor("Yaoundé", "Douala"), 0.3);
        assert_eq!(location_factor("Yaoundé", "Paris"), 0.3);
    }

    #[test]
    fn test_unlisted_cities_share_a_region() {
        assert_eq!(location_factor("Paris", "Lyon"), 0.7);
        assert_eq!(location_factor("Paris, France", "Lyon, France"), 0.7);
        assert_eq!(region_of("kribi"), Some(Region::Littoral));
        assert_eq!(region_of("paris"), None);
    }

    #[test]
    fn test_missing_address_gives_no_location_points() {
        let breakdown = HeuristicScorer::new().score(&php_listing(), &profile(&["PHP"], 1, None));
        assert_eq!(breakdown.location, 0.0);
    }

    #[test]
    fn test_score_is_bounded_and_deterministic() {
        let scorer = HeuristicScorer::new();
        let mut job = php_listing();
        job.requirements = Some("Docker, Redis".to_string());
        let candidate = profile(&["php", "laravel", "mysql", "docker", "redis"], 20, Some("Douala"));

        let first = scorer.score(&job, &candidate);
        assert_eq!(first.total, 100);
        for _ in 0..5 {
            assert_eq!(scorer.score(&job, &candidate), first);
        }
    }
}
