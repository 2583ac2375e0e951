//! Jobrank - ranking and query-interpretation engine for job listings
//!
//! Orders a candidate's visible listings by relevance and turns free-text
//! search phrases into structured store queries. Both paths try an external
//! language model first and fall back to deterministic term weighting and
//! keyword extraction.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{build_predicates, extract_keywords, score, EngineError, InterpretOptions, QueryInterpreter, RankResult, Ranker};
pub use crate::models::{Filters, JobLevel, Listing, PredicateSet, Profile, StructuredIntent};
pub use crate::services::{InMemoryStore, JobStore, LlmClient, UpstreamError};
