use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Listing, PredicateSet, Profile};

/// Errors raised by a listing/profile store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Persistence collaborator for users and job listings.
///
/// A missing user is `Ok(None)`; `Err` is reserved for the store itself failing.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Look up the profile snapshot for a user
    async fn find_user(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// All listings currently open to candidates
    async fn find_active_listings(&self) -> Result<Vec<Listing>, StoreError>;

    /// Active listings satisfying the predicate set.
    ///
    /// Default implementation filters [`JobStore::find_active_listings`] in memory.
    async fn search_listings(&self, predicates: &PredicateSet) -> Result<Vec<Listing>, StoreError> {
        Ok(self
            .find_active_listings()
            .await?
            .into_iter()
            .filter(|listing| predicates.matches(listing))
            .collect())
    }
}
