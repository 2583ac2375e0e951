// Core algorithm exports
pub mod interpreter;
pub mod predicates;
pub mod ranker;
pub mod scoring;
pub mod tokenizer;

pub use interpreter::{fallback_intent, InterpretOptions, QueryInterpreter};
pub use predicates::build as build_predicates;
pub use ranker::{EngineError, RankResult, Ranker};
pub use scoring::{rank_by_terms, score};
pub use tokenizer::{extract_keywords, tokenize_words};
