use serde::Deserialize;
use std::env;

/// Every tunable constant of the engine in one place. The values encode the
/// production ranking behavior exactly; change them only deliberately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub similarity: SimilarityConfig,
    pub content: ContentScoringConfig,
    pub collaborative: CollaborativeConfig,
    pub popularity: PopularityConfig,
    pub job_fusion: JobFusionConfig,
    pub candidate_scoring: CandidateScoringConfig,
    pub candidate_fusion: CandidateFusionConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityConfig {
    pub skill_weight: f64,
    pub applied_attribute_weight: f64,
    pub min_similarity: f64,
    pub max_similar_candidates: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.7,
            applied_attribute_weight: 0.3,
            min_similarity: 0.1,
            max_similar_candidates: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentScoringConfig {
    pub skill_weight: f64,
    pub experience_weight: f64,
    pub location_weight: f64,
    pub salary_weight: f64,
    pub freshness_weight: f64,
    /// Salary sub-score when the expectation clears the minimum but exceeds
    /// the posted maximum.
    pub salary_above_range_score: f64,
    /// Freshness decays linearly from 1 at age 0 to 0 at this age.
    pub freshness_horizon_days: i64,
    /// Postings scoring at or below this are dropped.
    pub min_score: f64,
}

impl Default for ContentScoringConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.40,
            experience_weight: 0.20,
            location_weight: 0.15,
            salary_weight: 0.15,
            freshness_weight: 0.10,
            salary_above_range_score: 0.67,
            freshness_horizon_days: 30,
            min_score: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollaborativeConfig {
    pub application_weight: f64,
    pub view_weight: f64,
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            application_weight: 0.7,
            view_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopularityConfig {
    /// Only postings created within this window are considered trending.
    pub window_days: i64,
    /// Applications count this many times a view in the engagement signal.
    pub application_multiplier: i64,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            application_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFusionConfig {
    pub content_weight: f64,
    pub collaborative_weight: f64,
    pub popularity_weight: f64,
    /// Reasons kept per merged entry.
    pub max_reasons: usize,
}

impl Default for JobFusionConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.5,
            collaborative_weight: 0.3,
            popularity_weight: 0.2,
            max_reasons: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateScoringConfig {
    /// Skill-matched candidates below this overlap ratio are excluded.
    pub min_skill_score: f64,
    pub experience_exact: f64,
    pub experience_adjacent: f64,
    pub experience_two_apart: f64,
    pub experience_fallback: f64,
    pub location_remote_score: f64,
    pub location_match_score: f64,
}

impl Default for CandidateScoringConfig {
    fn default() -> Self {
        Self {
            min_skill_score: 0.2,
            experience_exact: 0.9,
            experience_adjacent: 0.6,
            experience_two_apart: 0.3,
            experience_fallback: 0.1,
            location_remote_score: 0.8,
            location_match_score: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateFusionConfig {
    pub skill_weight: f64,
    pub experience_weight: f64,
    pub location_weight: f64,
    pub max_reasons: usize,
}

impl Default for CandidateFusionConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.5,
            experience_weight: 0.3,
            location_weight: 0.2,
            max_reasons: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Field weights for relevance scoring. Title matches outrank
    /// description and skill matches.
    pub title_weight: f64,
    pub company_weight: f64,
    pub skill_weight: f64,
    pub description_weight: f64,
    /// Candidate-side field weights.
    pub name_weight: f64,
    pub position_weight: f64,
    /// Freshness tier boundaries: tier 3 within `fresh_days`, tier 2 within
    /// `recent_days`, tier 1 otherwise.
    pub fresh_days: i64,
    pub recent_days: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            title_weight: 3.0,
            company_weight: 1.5,
            skill_weight: 1.0,
            description_weight: 1.0,
            name_weight: 3.0,
            position_weight: 2.0,
            fresh_days: 7,
            recent_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub recommendation_ttl_secs: u64,
    pub search_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recommendation_ttl_secs: 3600,
            search_ttl_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Default ranking constants, with the operational knobs overridable
    /// from the environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = EngineConfig::default();

        config.cache.recommendation_ttl_secs = env::var("RECOMMENDATION_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .expect("RECOMMENDATION_CACHE_TTL_SECS must be a valid u64");
        config.cache.search_ttl_secs = env::var("SEARCH_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .expect("SEARCH_CACHE_TTL_SECS must be a valid u64");
        config.similarity.max_similar_candidates = env::var("MAX_SIMILAR_CANDIDATES")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .expect("MAX_SIMILAR_CANDIDATES must be a valid usize");
        config.popularity.window_days = env::var("TRENDING_WINDOW_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .expect("TRENDING_WINDOW_DAYS must be a valid i64");

        config
    }
}
