use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::scoring::rank_by_terms;
use crate::models::{Listing, Profile};
use crate::services::llm::{recover_array, LlmClient, UpstreamError};
use crate::services::store::{JobStore, StoreError};

const RANKING_SYSTEM: &str = "You are a job matching assistant. \
Reply with a JSON array of job ids only, most relevant first.";

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Errors that reach callers of the ranking entry point
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of ranking one user's listings
#[derive(Debug)]
pub struct RankResult {
    pub listings: Vec<Listing>,
    pub total_candidates: usize,
    pub used_external_service: bool,
}

/// Ranking orchestrator
///
/// # Pipeline
/// 1. Ask the external ranking service for an ordered list of listing ids
/// 2. On any failure, score listings locally by term weight
/// 3. Map the winning order back onto the supplied listings and truncate
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    client: Option<Arc<LlmClient>>,
    timeout: Option<Duration>,
}

impl Ranker {
    pub fn new(client: Option<Arc<LlmClient>>) -> Self {
        Self { client, timeout: None }
    }

    /// Ranker that never calls out and always uses term weighting
    pub fn fallback_only() -> Self {
        Self::default()
    }

    /// Bound the external ranking call. Unbounded by default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Look up the user and rank the store's active listings for them.
    ///
    /// A missing user is an error; upstream ranking failures are not.
    pub async fn rank_for_user(
        &self,
        store: &dyn JobStore,
        user_id: &str,
        limit: usize,
    ) -> Result<RankResult, EngineError> {
        let profile = store
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))?;

        let listings = store.find_active_listings().await?;

        tracing::debug!("Ranking {} listings for user {}", listings.len(), user_id);

        Ok(self.rank(&profile, &listings, limit).await)
    }

    /// Order `listings` by relevance to `profile`.
    ///
    /// The output is a subsequence of `listings` (by id, no repeats) of at most
    /// `limit` entries.
    pub async fn rank(&self, profile: &Profile, listings: &[Listing], limit: usize) -> RankResult {
        let total_candidates = listings.len();

        if listings.is_empty() || limit == 0 {
            return RankResult {
                listings: vec![],
                total_candidates,
                used_external_service: false,
            };
        }

        if let Some(client) = self.client.as_deref() {
            match self.semantic_order(client, profile, listings).await {
                Ok(ids) => {
                    let ranked = merge_order(ids.iter().map(String::as_str), listings, limit);
                    if !ranked.is_empty() {
                        return RankResult {
                            listings: ranked,
                            total_candidates,
                            used_external_service: true,
                        };
                    }
                    tracing::warn!("Ranking service returned no known listing ids, using term weighting");
                }
                Err(e) => {
                    tracing::warn!("Ranking service failed for user {}, using term weighting: {}", profile.user_id, e);
                }
            }
        }

        let scored = rank_by_terms(profile, listings);
        let ranked = merge_order(scored.iter().map(|s| s.listing.id.as_str()), listings, limit);

        RankResult {
            listings: ranked,
            total_candidates,
            used_external_service: false,
        }
    }

    async fn semantic_order(
        &self,
        client: &LlmClient,
        profile: &Profile,
        listings: &[Listing],
    ) -> Result<Vec<String>, UpstreamError> {
        let prompt = ranking_prompt(profile, listings);
        let request = client.complete(RANKING_SYSTEM, &prompt);

        let content = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| UpstreamError::Timeout(timeout))??,
            None => request.await?,
        };

        let items = recover_array(&content)
            .ok_or_else(|| UpstreamError::InvalidResponse("expected a JSON array of listing ids".into()))?;

        items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok(id),
                other => Err(UpstreamError::InvalidResponse(format!("non-string listing id: {}", other))),
            })
            .collect()
    }
}

fn ranking_prompt(profile: &Profile, listings: &[Listing]) -> String {
    let jobs: Vec<Value> = listings.iter().map(listing_summary).collect();
    let payload = json!({
        "profile": {
            "skills": profile.skills,
            "keywords": profile.keywords,
            "experienceYears": profile.experience_years,
        },
        "jobs": jobs,
    });

    format!(
        "Rank these jobs for the candidate, most relevant first. \
Return only a JSON array of the job ids.\n{}",
        payload
    )
}

fn listing_summary(listing: &Listing) -> Value {
    json!({
        "id": listing.id,
        "title": listing.title,
        "description": truncate_chars(&listing.description, DESCRIPTION_PREVIEW_CHARS),
        "skills": listing.skills,
        "requirements": listing.requirements,
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Map an ordered id sequence onto the authoritative listings.
///
/// Unknown and repeated ids are dropped; order is preserved; at most `limit`.
fn merge_order<'a>(ids: impl Iterator<Item = &'a str>, listings: &[Listing], limit: usize) -> Vec<Listing> {
    let by_id: HashMap<&str, &Listing> = listings.iter().map(|l| (l.id.as_str(), l)).collect();
    let mut emitted = HashSet::new();

    ids.filter_map(|id| by_id.get(id).copied())
        .filter(|listing| emitted.insert(listing.id.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_listing(id: &str, description: &str, skills: &[&str]) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Job {}", id),
            company: "Acme".to_string(),
            description: description.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            requirements: vec![],
            experience_required: 3,
            status: "active".to_string(),
        }
    }

    fn create_profile(skills: &[&str]) -> Profile {
        Profile {
            user_id: "current_user".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            keywords: vec![],
            experience_years: 4,
        }
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fallback_ranking_basic() {
        let ranker = Ranker::fallback_only();
        let profile = create_profile(&["Python", "Django"]);
        let listings = vec![
            create_listing("B", "Java enterprise role", &["Java"]),
            create_listing("A", "Python backend role", &["Python", "AWS"]),
        ];

        let result = ranker.rank(&profile, &listings, 10).await;

        assert_eq!(ids(&result.listings), vec!["A", "B"]);
        assert!(!result.used_external_service);
        assert_eq!(result.total_candidates, 2);
    }

    #[tokio::test]
    async fn test_respects_limit() {
        let ranker = Ranker::fallback_only();
        let profile = create_profile(&["rust"]);
        let listings: Vec<Listing> = (0..20)
            .map(|i| create_listing(&i.to_string(), "rust service", &[]))
            .collect();

        let result = ranker.rank(&profile, &listings, 5).await;

        assert_eq!(result.listings.len(), 5);
        assert_eq!(ids(&result.listings), vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let ranker = Ranker::fallback_only();
        let profile = create_profile(&["rust"]);

        assert!(ranker.rank(&profile, &[], 10).await.listings.is_empty());
        assert!(ranker
            .rank(&profile, &[create_listing("1", "rust", &[])], 0)
            .await
            .listings
            .is_empty());
    }

    #[test]
    fn test_merge_order_drops_unknown_and_repeats() {
        let listings = vec![
            create_listing("a", "", &[]),
            create_listing("b", "", &[]),
            create_listing("c", "", &[]),
        ];

        let merged = merge_order(["c", "ghost", "a", "c", "b"].into_iter(), &listings, 10);
        assert_eq!(ids(&merged), vec!["c", "a", "b"]);

        let truncated = merge_order(["b", "a", "c"].into_iter(), &listings, 2);
        assert_eq!(ids(&truncated), vec!["b", "a"]);
    }

    #[test]
    fn test_merge_order_omitted_ids_dropped() {
        let listings = vec![create_listing("a", "", &[]), create_listing("b", "", &[])];

        let merged = merge_order(["b"].into_iter(), &listings, 10);
        assert_eq!(ids(&merged), vec!["b"]);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn test_summary_truncates_description() {
        let long = "x".repeat(500);
        let summary = listing_summary(&create_listing("a", &long, &["Go"]));

        assert_eq!(summary["description"].as_str().unwrap().len(), DESCRIPTION_PREVIEW_CHARS);
        assert_eq!(summary["id"], "a");
        assert_eq!(summary["skills"][0], "Go");
    }
}
