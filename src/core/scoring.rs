use std::collections::{HashMap, HashSet};

use crate::core::tokenizer::tokenize_words;
use crate::models::{Listing, Profile, ScoredListing};

/// Term-frequency / inverse-document-frequency weights over a small corpus
struct TermWeights {
    documents: Vec<HashMap<String, usize>>,
}

impl TermWeights {
    fn new(documents: &[Vec<String>]) -> Self {
        let documents = documents
            .iter()
            .map(|tokens| {
                let mut counts = HashMap::new();
                for token in tokens {
                    *counts.entry(token.clone()).or_insert(0) += 1;
                }
                counts
            })
            .collect();
        Self { documents }
    }

    /// `tf(term, doc) * (1 + ln(N / (1 + df(term))))`
    fn weight(&self, term: &str, doc: usize) -> f64 {
        let tf = self.documents[doc].get(term).copied().unwrap_or(0) as f64;
        if tf == 0.0 {
            return 0.0;
        }

        let n = self.documents.len() as f64;
        let df = self.documents.iter().filter(|d| d.contains_key(term)).count() as f64;
        let idf = 1.0 + (n / (1.0 + df)).ln();

        tf * idf
    }
}

/// Relevance of one listing's text to a set of profile terms (>= 0).
///
/// The listing is scored as a corpus of exactly one document, so the IDF factor
/// is the same constant for every term present and the result is effectively a
/// term-frequency weighting. Listings are scored independently against the same
/// profile: the scores order listings but are not calibrated to any scale.
pub fn score(
    profile_terms: &[String],
    listing_text: &str,
    listing_skills: &[String],
    listing_requirements: &[String],
) -> f64 {
    let combined = format!(
        "{} {} {}",
        listing_text,
        listing_skills.join(" "),
        listing_requirements.join(" ")
    )
    .to_lowercase();

    let profile_tokens = tokenize_words(&profile_terms.join(" "));
    let listing_tokens = tokenize_words(&combined);

    if profile_tokens.is_empty() || listing_tokens.is_empty() {
        return 0.0;
    }

    let corpus = TermWeights::new(&[listing_tokens]);

    let mut seen = HashSet::new();
    profile_tokens
        .iter()
        .filter(|term| seen.insert(term.as_str()))
        .map(|term| corpus.weight(term, 0))
        .filter(|weight| *weight > 0.0)
        .sum()
}

/// Score every listing against the profile and sort best first.
///
/// Equal scores keep their input order.
pub fn rank_by_terms<'a>(profile: &Profile, listings: &'a [Listing]) -> Vec<ScoredListing<'a>> {
    let terms = profile.terms();

    let mut scored: Vec<ScoredListing<'a>> = listings
        .iter()
        .map(|listing| ScoredListing {
            listing,
            score: score(&terms, &listing.description, &listing.skills, &listing.requirements),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn create_listing(id: &str, description: &str, skills: &[&str]) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Job {}", id),
            company: "Acme".to_string(),
            description: description.to_string(),
            skills: strings(skills),
            requirements: vec![],
            experience_required: 2,
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_score_empty_profile_is_zero() {
        let s = score(&[], "Python backend role", &strings(&["Python"]), &[]);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_score_empty_listing_is_zero() {
        let s = score(&strings(&["python"]), "", &[], &[]);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_score_no_overlap_is_zero() {
        let s = score(&strings(&["haskell"]), "Java enterprise role", &strings(&["Java"]), &[]);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_score_counts_term_frequency() {
        let once = score(&strings(&["python"]), "python", &[], &[]);
        let twice = score(&strings(&["python"]), "python python", &[], &[]);

        assert!(once > 0.0);
        assert!((twice - 2.0 * once).abs() < 1e-9);
    }

    #[test]
    fn test_score_distinct_profile_terms_only() {
        let single = score(&strings(&["rust"]), "rust services", &[], &[]);
        let repeated = score(&strings(&["rust", "Rust", "RUST"]), "rust services", &[], &[]);

        assert_eq!(single, repeated);
    }

    #[test]
    fn test_score_uses_skills_and_requirements() {
        let s = score(
            &strings(&["kubernetes"]),
            "Platform engineer",
            &strings(&["Go"]),
            &strings(&["Kubernetes in production"]),
        );
        assert!(s > 0.0);
    }

    #[test]
    fn test_rank_by_terms_orders_by_score() {
        let profile = Profile {
            user_id: "u1".to_string(),
            skills: strings(&["Python", "Django"]),
            keywords: vec![],
            experience_years: 4,
        };
        let listings = vec![
            create_listing("B", "Java enterprise role", &["Java"]),
            create_listing("A", "Python backend role", &["Python", "AWS"]),
        ];

        let ranked = rank_by_terms(&profile, &listings);

        assert_eq!(ranked[0].listing.id, "A");
        assert_eq!(ranked[1].listing.id, "B");
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_rank_by_terms_ties_keep_input_order() {
        let profile = Profile {
            user_id: "u1".to_string(),
            skills: strings(&["Elixir"]),
            keywords: vec![],
            experience_years: 0,
        };
        let listings = vec![
            create_listing("1", "Java", &[]),
            create_listing("2", "Go", &[]),
            create_listing("3", "Ruby", &[]),
        ];

        let ids: Vec<&str> = rank_by_terms(&profile, &listings)
            .iter()
            .map(|s| s.listing.id.as_str())
            .collect();

        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
