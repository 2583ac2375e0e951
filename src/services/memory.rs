use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::{Listing, Profile};
use crate::services::store::{JobStore, StoreError};

/// In-memory store for tests and local runs
#[derive(Clone, Default)]
pub struct InMemoryStore {
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
    listings: Arc<RwLock<Vec<Listing>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(self, profiles: Vec<Profile>) -> Self {
        {
            let mut stored = self.profiles.write().unwrap_or_else(|e| e.into_inner());
            for profile in profiles {
                stored.insert(profile.user_id.clone(), profile);
            }
        }
        self
    }

    /// Listings keep their insertion order
    pub fn with_listings(self, listings: Vec<Listing>) -> Self {
        self.listings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .extend(listings);
        self
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().unwrap_or_else(|e| e.into_inner());
        Ok(profiles.get(user_id).cloned())
    }

    async fn find_active_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let listings = self.listings.read().unwrap_or_else(|e| e.into_inner());
        Ok(listings.iter().filter(|l| l.status == "active").cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_listing(id: &str, status: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            skills: vec![],
            requirements: vec![],
            experience_required: 0,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_in_memory_store_filters_inactive() {
        let store = InMemoryStore::new().with_listings(vec![
            create_listing("1", "active"),
            create_listing("2", "closed"),
            create_listing("3", "active"),
        ]);

        let listings = tokio_test::block_on(store.find_active_listings()).unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();

        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_in_memory_store_missing_user() {
        let store = InMemoryStore::new();

        assert!(tokio_test::block_on(store.find_user("nobody")).unwrap().is_none());
    }
}
