use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::domain::{Listing, StructuredIntent};

/// Response for the recommended jobs endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedJobsResponse {
    pub jobs: Vec<Listing>,
    pub total_results: usize,
}

/// Response for the job search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobsResponse {
    pub intent: StructuredIntent,
    pub query: Value,
    pub jobs: Vec<Listing>,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub llm_configured: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
