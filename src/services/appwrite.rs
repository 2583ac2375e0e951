use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::StoreSettings;
use crate::models::{Listing, Profile};
use crate::services::store::{JobStore, StoreError};

/// Documents requested per list call; Appwrite's own default is 25
const PAGE_SIZE: usize = 100;

/// Appwrite-backed document store for profiles and listings
pub struct AppwriteStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub profiles: String,
    pub listings: String,
}

impl AppwriteStore {
    /// Create a new Appwrite store client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        Self::new(
            settings.endpoint.clone(),
            settings.api_key.clone(),
            settings.project_id.clone(),
            settings.database_id.clone(),
            AppwriteCollections {
                profiles: settings.profiles_collection.clone(),
                listings: settings.listings_collection.clone(),
            },
        )
    }

    fn documents_url(&self, collection: &str, queries: &[String]) -> Result<String, StoreError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to encode queries: {}", e)))?;

        Ok(format!(
            "{}/databases/{}/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection,
            urlencoding::encode(&queries_json)
        ))
    }

    /// Fetch one page of raw documents for the queries
    async fn fetch_documents(&self, collection: &str, queries: &[String]) -> Result<Vec<Value>, StoreError> {
        let url = self.documents_url(collection, queries)?;

        tracing::debug!("Querying documents from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Query on {} failed: {} - {}", collection, status, body);
            return Err(StoreError::ApiError(format!("Failed to query {}: {}", collection, status)));
        }

        let mut json: Value = response.json().await?;

        match json.get_mut("documents").map(Value::take) {
            Some(Value::Array(documents)) => Ok(documents),
            _ => Err(StoreError::InvalidResponse("Missing documents array".into())),
        }
    }

    /// Fetch every matching document, following `cursorAfter` until a short page
    async fn query_all_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<T>, StoreError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut page_queries = queries.to_vec();
            page_queries.push(format!("limit({})", PAGE_SIZE));
            if let Some(last_id) = &cursor {
                page_queries.push(format!("cursorAfter({})", quoted(last_id)));
            }

            let documents = self.fetch_documents(collection, &page_queries).await?;
            let page_len = documents.len();
            cursor = documents
                .last()
                .and_then(|doc| doc.get("$id"))
                .and_then(Value::as_str)
                .map(str::to_string);

            items.extend(decode_documents(collection, documents));

            if page_len < PAGE_SIZE {
                break;
            }
            if cursor.is_none() {
                tracing::warn!("Full page from {} without a document id, stopping pagination", collection);
                break;
            }
        }

        Ok(items)
    }
}

/// Query string literal with quotes and backslashes escaped
fn quoted(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn decode_documents<T: DeserializeOwned>(collection: &str, documents: Vec<Value>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|doc| {
            let data = match doc {
                Value::Object(mut fields) => fields.remove("data").unwrap_or(Value::Object(fields)),
                other => other,
            };
            match serde_json::from_value(data) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping malformed document in {}: {}", collection, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl JobStore for AppwriteStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let queries = vec![format!("equal(\"userId\", {})", quoted(user_id))];

        tracing::debug!("Fetching profile for user: {}", user_id);

        let documents = self.fetch_documents(&self.collections.profiles, &queries).await?;
        let profiles: Vec<Profile> = decode_documents(&self.collections.profiles, documents);

        Ok(profiles.into_iter().find(|p| p.user_id == user_id))
    }

    async fn find_active_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let queries = vec!["equal(\"status\", \"active\")".to_string()];

        let listings: Vec<Listing> = self.query_all_documents(&self.collections.listings, &queries).await?;

        tracing::debug!("Queried {} active listings", listings.len());

        Ok(listings.into_iter().filter(|l| l.status == "active").collect())
    }
}
