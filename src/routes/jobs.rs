use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::{RankingSettings, SearchSettings};
use crate::core::{build_predicates, EngineError, InterpretOptions, QueryInterpreter, Ranker};
use crate::models::{
    ErrorResponse, HealthResponse, InterpretRequest, RecommendedJobsRequest, RecommendedJobsResponse,
    SearchJobsRequest, SearchJobsResponse,
};
use crate::services::JobStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub ranker: Ranker,
    pub interpreter: QueryInterpreter,
    pub ranking: RankingSettings,
    pub search: SearchSettings,
}

/// Configure all job-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/jobs/recommended", web::post().to(recommended_jobs))
        .route("/jobs/search", web::post().to(search_jobs))
        .route("/search/interpret", web::post().to(interpret_query));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_configured: state.interpreter.is_configured(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommended jobs endpoint
///
/// POST /api/v1/jobs/recommended
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 10
/// }
/// ```
async fn recommended_jobs(
    state: web::Data<AppState>,
    req: web::Json<RecommendedJobsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommended_jobs request: {}", errors);
        return validation_error(errors);
    }

    let limit = req
        .limit
        .map(usize::from)
        .unwrap_or(state.ranking.default_limit)
        .min(state.ranking.max_limit);

    tracing::info!("Ranking jobs for user: {}, limit: {}", req.user_id, limit);

    match state.ranker.rank_for_user(state.store.as_ref(), &req.user_id, limit).await {
        Ok(result) => {
            tracing::info!(
                "Returning {} jobs for user {} (from {} candidates, external: {})",
                result.listings.len(),
                req.user_id,
                result.total_candidates,
                result.used_external_service
            );
            HttpResponse::Ok().json(RecommendedJobsResponse {
                total_results: result.total_candidates,
                jobs: result.listings,
            })
        }
        Err(EngineError::UserNotFound(user_id)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "User not found".to_string(),
            message: format!("No profile for user {}", user_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to rank jobs for {}: {}", req.user_id, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Failed to load jobs".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}

/// Interpret a search phrase without running it
///
/// POST /api/v1/search/interpret
async fn interpret_query(
    state: web::Data<AppState>,
    req: web::Json<InterpretRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let intent = state
        .interpreter
        .interpret(&req.query, InterpretOptions::unbounded())
        .await;

    HttpResponse::Ok().json(intent)
}

/// Search active jobs with a free-text phrase
///
/// POST /api/v1/jobs/search
///
/// Request body:
/// ```json
/// {
///   "query": "senior rust engineer",
///   "filters": { "status": "active" }
/// }
/// ```
async fn search_jobs(
    state: web::Data<AppState>,
    req: web::Json<SearchJobsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let intent = state
        .interpreter
        .interpret(&req.query, InterpretOptions::with_deadline(state.search.deadline()))
        .await;

    let predicates = build_predicates(&intent, &req.filters);

    match state.store.search_listings(&predicates).await {
        Ok(jobs) => {
            tracing::info!(
                "Search {:?} matched {} jobs (external: {})",
                req.query,
                jobs.len(),
                intent.used_external_service
            );
            HttpResponse::Ok().json(SearchJobsResponse {
                query: predicates.to_document(),
                total_results: jobs.len(),
                jobs,
                intent,
            })
        }
        Err(e) => {
            tracing::error!("Failed to search jobs: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Failed to search jobs".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}
