use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Filters;

/// Request for a user's recommended listings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendedJobsRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to interpret a search phrase without running it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterpretRequest {
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub query: String,
}

/// Request to search active listings with a free-text phrase
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchJobsRequest {
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: Filters,
}
