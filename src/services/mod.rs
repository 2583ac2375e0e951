// Service exports
pub mod appwrite;
pub mod llm;
pub mod memory;
pub mod store;

pub use appwrite::{AppwriteCollections, AppwriteStore};
pub use llm::{LlmClient, UpstreamError};
pub use memory::InMemoryStore;
pub use store::{JobStore, StoreError};
