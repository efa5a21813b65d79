pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use error::EngineError;
pub use services::{
    CandidateRecommendationEngine, JobRecommendationEngine, SearchRanker, SimilarityEngine,
};
