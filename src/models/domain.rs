use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Candidate profile snapshot used for matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(rename = "experienceYears", default)]
    pub experience_years: u32,
}

impl Profile {
    /// Skills followed by keywords, duplicates (case-insensitive) removed
    pub fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::with_capacity(self.skills.len() + self.keywords.len());
        for term in self.skills.iter().chain(self.keywords.iter()) {
            if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                terms.push(term.clone());
            }
        }
        terms
    }
}

/// Job listing as stored in the listing collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(alias = "$id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "experienceRequired", default)]
    pub experience_required: u32,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String { "active".to_string() }

/// A listing paired with its fallback relevance score
#[derive(Debug, Clone, Copy)]
pub struct ScoredListing<'a> {
    pub listing: &'a Listing,
    pub score: f64,
}

/// Seniority bucket extracted from a search phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

impl JobLevel {
    /// Lenient parse of the level label returned by the text service
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "mid" => Some(Self::Mid),
            "senior" => Some(Self::Senior),
            "executive" => Some(Self::Executive),
            _ => None,
        }
    }

    /// Inclusive bounds on required years of experience.
    ///
    /// `mid` and `senior` intentionally share their boundary values with the
    /// neighbouring buckets.
    pub fn experience_range(self) -> (u32, Option<u32>) {
        match self {
            Self::Entry => (0, Some(2)),
            Self::Mid => (2, Some(5)),
            Self::Senior => (5, Some(10)),
            Self::Executive => (10, None),
        }
    }
}

/// Normalized representation of a free-text search phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIntent {
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    #[serde(rename = "jobTitle")]
    pub job_title: Option<String>,
    #[serde(rename = "jobLevel")]
    pub job_level: Option<JobLevel>,
    pub intent: String,
    #[serde(rename = "improvedQuery")]
    pub improved_query: String,
    #[serde(rename = "searchTerms")]
    pub search_terms: Vec<String>,
    #[serde(rename = "usedExternalService")]
    pub used_external_service: bool,
    #[serde(rename = "fallbackReason", default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

pub const GENERAL_INTENT: &str = "general";

impl StructuredIntent {
    /// Intent for blank input: nothing extracted, query kept verbatim
    pub fn neutral(search_text: &str) -> Self {
        Self {
            keywords: vec![],
            skills: vec![],
            job_title: None,
            job_level: None,
            intent: GENERAL_INTENT.to_string(),
            improved_query: search_text.to_string(),
            search_terms: vec![],
            used_external_service: false,
            fallback_reason: None,
        }
    }
}

/// Fields of a listing that predicates can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingField {
    Title,
    Description,
    Company,
    Skills,
    ExperienceRequired,
}

impl ListingField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Company => "company",
            Self::Skills => "skills",
            Self::ExperienceRequired => "experienceRequired",
        }
    }
}

/// A single case-insensitive text condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextPredicate {
    /// The field contains the pattern
    Contains { field: ListingField, pattern: String },
    /// At least one entry of the listing's skill set contains the pattern
    HasSkill { pattern: String },
}

/// Inclusive scalar range over a numeric listing field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub field: ListingField,
    pub min: u32,
    pub max: Option<u32>,
}

/// Caller-supplied equality filters, e.g. `{"status": "active"}`
pub type Filters = Map<String, Value>;

/// Composed match conditions handed to the listing store.
///
/// `base AND (any_of[0] OR any_of[1] ...) AND ranges[0] AND ranges[1] ...`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    pub base: Filters,
    pub any_of: Vec<TextPredicate>,
    pub ranges: Vec<RangeFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_terms_dedup() {
        let profile = Profile {
            user_id: "u1".to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            keywords: vec!["rust".to_string(), "backend".to_string()],
            experience_years: 3,
        };

        assert_eq!(profile.terms(), vec!["Rust", "SQL", "backend"]);
    }

    #[test]
    fn test_profile_ignores_document_id() {
        let profile: Profile = serde_json::from_str(
            r#"{"$id":"doc1","userId":"u1","skills":["Rust"],"keywords":[],"experienceYears":3}"#,
        )
        .unwrap();

        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.experience_years, 3);
    }

    #[test]
    fn test_listing_defaults() {
        let listing: Listing = serde_json::from_str(r#"{"$id": "job-1", "title": "Engineer"}"#).unwrap();

        assert_eq!(listing.id, "job-1");
        assert_eq!(listing.status, "active");
        assert!(listing.skills.is_empty());
    }

    #[test]
    fn test_job_level_parse() {
        assert_eq!(JobLevel::parse("Senior"), Some(JobLevel::Senior));
        assert_eq!(JobLevel::parse(" entry "), Some(JobLevel::Entry));
        assert_eq!(JobLevel::parse("principal"), None);
    }

    #[test]
    fn test_job_level_ranges() {
        assert_eq!(JobLevel::Senior.experience_range(), (5, Some(10)));
        assert_eq!(JobLevel::Executive.experience_range(), (10, None));
    }

    #[test]
    fn test_intent_serializes_camel_case() {
        let intent = StructuredIntent::neutral("");
        let json = serde_json::to_value(&intent).unwrap();

        assert_eq!(json["usedExternalService"], false);
        assert_eq!(json["intent"], "general");
        assert!(json.get("fallbackReason").is_none());
    }
}
