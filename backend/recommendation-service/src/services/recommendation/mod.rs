//! Personalized job recommendations.
//!
//! Three independent feeder strategies (content-based, collaborative,
//! popularity) each produce a scored, per-source job list; the merger fuses
//! them into one ranked, deduplicated result with source attribution. A
//! feeder failure degrades that source to empty rather than failing the call.

mod collaborative;
mod content_based;
mod merger;
mod popularity;

pub use collaborative::CollaborativeStrategy;
pub use content_based::ContentBasedStrategy;
pub use merger::merge_job_recommendations;
pub use popularity::PopularityStrategy;

use crate::analytics::{AnalyticsKind, AnalyticsRecorder};
use crate::cache::{cache_key, CacheFacade};
use crate::config::{EngineConfig, JobFusionConfig};
use crate::error::{EngineError, Result};
use crate::models::{CandidateProfile, JobRecommendation, JobRecommendationSource, UserRole};
use crate::repository::SignalRepository;
use crate::services::similarity::SimilarityEngine;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const CACHE_NAMESPACE: &str = "reco:jobs";

/// One feeder's opinion of a posting for a given candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredJob {
    pub job_id: Uuid,
    pub score: f64,
    pub reason: String,
}

#[async_trait]
pub trait JobRecommendationStrategy: Send + Sync {
    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        skills: &[String],
        limit: usize,
    ) -> anyhow::Result<Vec<ScoredJob>>;

    fn source(&self) -> JobRecommendationSource;
}

pub struct JobRecommendationEngine {
    repo: Arc<dyn SignalRepository>,
    cache: Arc<dyn CacheFacade>,
    analytics: Arc<dyn AnalyticsRecorder>,
    strategies: Vec<Box<dyn JobRecommendationStrategy>>,
    fusion: JobFusionConfig,
    cache_ttl: Duration,
}

impl JobRecommendationEngine {
    pub fn new(
        repo: Arc<dyn SignalRepository>,
        cache: Arc<dyn CacheFacade>,
        analytics: Arc<dyn AnalyticsRecorder>,
        config: &EngineConfig,
    ) -> Self {
        let similarity = SimilarityEngine::new(repo.clone(), config.similarity.clone());
        let strategies: Vec<Box<dyn JobRecommendationStrategy>> = vec![
            Box::new(ContentBasedStrategy::new(
                repo.clone(),
                config.content.clone(),
            )),
            Box::new(CollaborativeStrategy::new(
                repo.clone(),
                similarity,
                config.collaborative.clone(),
                config.similarity.max_similar_candidates,
            )),
            Box::new(PopularityStrategy::new(
                repo.clone(),
                config.popularity.clone(),
            )),
        ];

        Self {
            repo,
            cache,
            analytics,
            strategies,
            fusion: config.job_fusion.clone(),
            cache_ttl: Duration::from_secs(config.cache.recommendation_ttl_secs),
        }
    }

    /// Ranked job recommendations for one candidate.
    ///
    /// Denies non-job-seeker subjects; every other failure degrades to an
    /// empty (or partial) list.
    pub async fn recommend_jobs(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<JobRecommendation>> {
        match self.repo.user_role(candidate_id).await {
            Ok(Some(UserRole::JobSeeker)) => {}
            Ok(Some(role)) => {
                return Err(EngineError::AccessDenied(format!(
                    "job recommendations require a job seeker account, not {}",
                    role.as_str()
                )));
            }
            Ok(None) => {
                warn!(%candidate_id, "unknown user requested job recommendations");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to resolve user role");
                return Ok(Vec::new());
            }
        }

        let key = cache_key(CACHE_NAMESPACE, candidate_id, &format!("limit={limit}"));
        if let Some(cached) = self.cached(&key).await {
            debug!(%candidate_id, "job recommendations served from cache");
            return Ok(cached);
        }

        let candidate = match self.repo.candidate(candidate_id).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                warn!(%candidate_id, "candidate profile not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to read candidate profile");
                return Ok(Vec::new());
            }
        };
        let skills = match self.repo.candidate_skills(candidate_id).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to read candidate skills");
                Vec::new()
            }
        };

        let mut per_source: Vec<(JobRecommendationSource, Vec<ScoredJob>)> = Vec::new();
        for strategy in &self.strategies {
            match strategy.recommend(&candidate, &skills, limit).await {
                Ok(entries) => per_source.push((strategy.source(), entries)),
                Err(e) => {
                    warn!(
                        source = strategy.source().as_str(),
                        error = %e,
                        "job recommendation strategy failed"
                    );
                }
            }
        }

        let merged = merge_job_recommendations(&per_source, &self.fusion, limit);

        info!(
            %candidate_id,
            sources = per_source.len(),
            results = merged.len(),
            "job recommendations computed"
        );

        self.store(&key, &merged).await;
        if let Err(e) = self
            .analytics
            .record(
                Some(candidate_id),
                AnalyticsKind::JobRecommendations,
                "",
                "",
                merged.len(),
            )
            .await
        {
            warn!(error = %e, "failed to record job recommendation analytics");
        }

        Ok(merged)
    }

    /// Drop every cached recommendation for the candidate, e.g. after a
    /// profile or application change.
    pub async fn invalidate_for_candidate(&self, candidate_id: Uuid) -> u64 {
        match self
            .cache
            .delete_pattern(&format!("{CACHE_NAMESPACE}:{candidate_id}:"))
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to invalidate recommendation cache");
                0
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<JobRecommendation>> {
        match self.cache.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(error = %e, "corrupt cached recommendations, recomputing");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "recommendation cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, entries: &[JobRecommendation]) {
        match serde_json::to_string(entries) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(key, &payload, self.cache_ttl).await {
                    warn!(error = %e, "recommendation cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize recommendations for cache"),
        }
    }
}
