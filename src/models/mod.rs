// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Filters, JobLevel, Listing, ListingField, PredicateSet, Profile, RangeFilter, ScoredListing,
    StructuredIntent, TextPredicate, GENERAL_INTENT,
};
pub use requests::{InterpretRequest, RecommendedJobsRequest, SearchJobsRequest};
pub use responses::{ErrorResponse, HealthResponse, RecommendedJobsResponse, SearchJobsResponse};
