//! Candidate recommendations for a recruiter viewing one posting.
//!
//! Mirror image of the job-side pipeline: three feeders (skill, experience,
//! location fit) fused with fixed weights into one deduplicated ranking.

mod experience_matched;
mod location_matched;
mod skill_matched;

pub use experience_matched::ExperienceMatchedStrategy;
pub use location_matched::LocationMatchedStrategy;
pub use skill_matched::SkillMatchedStrategy;

use crate::analytics::{AnalyticsKind, AnalyticsRecorder};
use crate::cache::{cache_key, CacheFacade};
use crate::config::{CandidateFusionConfig, EngineConfig};
use crate::error::Result;
use crate::models::{
    CandidateRecommendation, CandidateRecommendationSource, JobPosting, RecommendationType,
};
use crate::repository::SignalRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const CACHE_NAMESPACE: &str = "reco:candidates";

/// One feeder's opinion of a candidate for a given posting.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate_id: Uuid,
    pub score: f64,
    pub reason: String,
}

#[async_trait]
pub trait CandidateRecommendationStrategy: Send + Sync {
    async fn recommend(&self, job: &JobPosting, limit: usize) -> anyhow::Result<Vec<ScoredCandidate>>;

    fn source(&self) -> CandidateRecommendationSource;
}

pub struct CandidateRecommendationEngine {
    repo: Arc<dyn SignalRepository>,
    cache: Arc<dyn CacheFacade>,
    analytics: Arc<dyn AnalyticsRecorder>,
    strategies: Vec<Box<dyn CandidateRecommendationStrategy>>,
    fusion: CandidateFusionConfig,
    cache_ttl: Duration,
}

impl CandidateRecommendationEngine {
    pub fn new(
        repo: Arc<dyn SignalRepository>,
        cache: Arc<dyn CacheFacade>,
        analytics: Arc<dyn AnalyticsRecorder>,
        config: &EngineConfig,
    ) -> Self {
        let strategies: Vec<Box<dyn CandidateRecommendationStrategy>> = vec![
            Box::new(SkillMatchedStrategy::new(
                repo.clone(),
                config.candidate_scoring.clone(),
            )),
            Box::new(ExperienceMatchedStrategy::new(
                repo.clone(),
                config.candidate_scoring.clone(),
            )),
            Box::new(LocationMatchedStrategy::new(
                repo.clone(),
                config.candidate_scoring.clone(),
            )),
        ];

        Self {
            repo,
            cache,
            analytics,
            strategies,
            fusion: config.candidate_fusion.clone(),
            cache_ttl: Duration::from_secs(config.cache.recommendation_ttl_secs),
        }
    }

    /// Ranked candidate recommendations for one posting.
    pub async fn recommend_candidates(
        &self,
        job_id: Uuid,
        limit: usize,
    ) -> Result<Vec<CandidateRecommendation>> {
        let key = cache_key(CACHE_NAMESPACE, job_id, &format!("limit={limit}"));
        if let Some(cached) = self.cached(&key).await {
            debug!(%job_id, "candidate recommendations served from cache");
            return Ok(cached);
        }

        let job = match self.repo.job(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(%job_id, "posting not found for candidate recommendations");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, %job_id, "failed to read posting");
                return Ok(Vec::new());
            }
        };

        let mut per_source: Vec<(CandidateRecommendationSource, Vec<ScoredCandidate>)> =
            Vec::new();
        for strategy in &self.strategies {
            match strategy.recommend(&job, limit).await {
                Ok(entries) => per_source.push((strategy.source(), entries)),
                Err(e) => {
                    warn!(
                        source = strategy.source().as_str(),
                        error = %e,
                        "candidate recommendation strategy failed"
                    );
                }
            }
        }

        let merged = merge_candidate_recommendations(&per_source, &self.fusion, limit);

        info!(
            %job_id,
            sources = per_source.len(),
            results = merged.len(),
            "candidate recommendations computed"
        );

        self.store(&key, &merged).await;
        if let Err(e) = self
            .analytics
            .record(
                Some(job_id),
                AnalyticsKind::CandidateRecommendations,
                "",
                "",
                merged.len(),
            )
            .await
        {
            warn!(error = %e, "failed to record candidate recommendation analytics");
        }

        Ok(merged)
    }

    /// Drop every cached recommendation for the posting.
    pub async fn invalidate_for_job(&self, job_id: Uuid) -> u64 {
        match self
            .cache
            .delete_pattern(&format!("{CACHE_NAMESPACE}:{job_id}:"))
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, %job_id, "failed to invalidate recommendation cache");
                0
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<CandidateRecommendation>> {
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

    async fn store(&self, key: &str, entries: &[CandidateRecommendation]) {
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

/// Same fusion policy as the job side: fixed weights, absent sources
/// contribute 0, no renormalization, first-seen grouping order.
pub fn merge_candidate_recommendations(
    per_source: &[(CandidateRecommendationSource, Vec<ScoredCandidate>)],
    config: &CandidateFusionConfig,
    limit: usize,
) -> Vec<CandidateRecommendation> {
    struct Fused {
        score: f64,
        sources: Vec<CandidateRecommendationSource>,
        reasons: Vec<String>,
    }

    let mut order: Vec<Uuid> = Vec::new();
    let mut fused: HashMap<Uuid, Fused> = HashMap::new();

    for (source, entries) in per_source {
        let weight = match source {
            CandidateRecommendationSource::Skill => config.skill_weight,
            CandidateRecommendationSource::Experience => config.experience_weight,
            CandidateRecommendationSource::Location => config.location_weight,
        };

        for entry in entries {
            let slot = fused.entry(entry.candidate_id).or_insert_with(|| {
                order.push(entry.candidate_id);
                Fused {
                    score: 0.0,
                    sources: Vec::new(),
                    reasons: Vec::new(),
                }
            });
            slot.score += weight * entry.score;
            if !slot.sources.contains(source) {
                slot.sources.push(*source);
            }
            if slot.reasons.len() < config.max_reasons && !slot.reasons.contains(&entry.reason) {
                slot.reasons.push(entry.reason.clone());
            }
        }
    }

    let mut merged: Vec<CandidateRecommendation> = order
        .into_iter()
        .filter_map(|candidate_id| {
            fused.remove(&candidate_id).map(|entry| CandidateRecommendation {
                candidate_id,
                score: entry.score,
                recommendation_type: classify(&entry.sources),
                sources: entry.sources,
                reasons: entry.reasons,
            })
        })
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(limit);
    merged
}

fn classify(sources: &[CandidateRecommendationSource]) -> RecommendationType {
    if sources.contains(&CandidateRecommendationSource::Skill) {
        RecommendationType::SkillMatch
    } else if sources.contains(&CandidateRecommendationSource::Experience) {
        RecommendationType::ExperienceMatch
    } else if sources.contains(&CandidateRecommendationSource::Location) {
        RecommendationType::LocationMatch
    } else {
        RecommendationType::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NoopAnalytics;
    use crate::cache::MemoryCache;
    use crate::models::{CandidateProfile, ExperienceTier, UserRole};
    use crate::repository::InMemorySignalRepository;
    use chrono::Utc;
    use std::collections::HashSet;

    fn seeker(name: &str, tier: Option<ExperienceTier>, location: Option<&str>) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            position: None,
            location: location.map(str::to_string),
            experience_tier: tier,
            expected_salary: None,
            applied_jobs: HashSet::new(),
            viewed_jobs: HashSet::new(),
        }
    }

    fn posting(required: &[&str], tier: Option<ExperienceTier>, remote: bool) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            requirements: String::new(),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            location: Some("Berlin".to_string()),
            remote_allowed: remote,
            job_type: None,
            experience_tier: tier,
            salary_min: None,
            salary_max: None,
            created_at: Utc::now(),
            is_active: true,
            view_count: 0,
            application_count: 0,
        }
    }

    #[tokio::test]
    async fn fuses_three_feeders_for_a_posting() {
        let repo = Arc::new(InMemorySignalRepository::new());

        let job = posting(&["Rust", "Postgres"], Some(ExperienceTier::Senior), true);
        let job_id = job.id;
        repo.add_job(job);

        let strong = seeker("Strong", Some(ExperienceTier::Senior), Some("Berlin"));
        let strong_id = strong.id;
        repo.add_candidate(
            strong,
            vec!["Rust".to_string(), "Postgres".to_string()],
            UserRole::JobSeeker,
        );

        let weak = seeker("Weak", Some(ExperienceTier::Entry), None);
        let weak_id = weak.id;
        repo.add_candidate(weak, vec![], UserRole::JobSeeker);

        let engine = CandidateRecommendationEngine::new(
            repo,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopAnalytics),
            &EngineConfig::default(),
        );
        let merged = engine.recommend_candidates(job_id, 10).await.unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].candidate_id, strong_id);
        // 0.5·1.0 + 0.3·0.9 + 0.2·0.8 = 0.93
        assert!((merged[0].score - 0.93).abs() < 1e-9);
        assert_eq!(merged[0].recommendation_type, RecommendationType::SkillMatch);
        assert_eq!(merged[0].sources.len(), 3);

        // Experience fallback 0.3·0.1 + remote 0.2·0.8 = 0.19, no skill source.
        assert_eq!(merged[1].candidate_id, weak_id);
        assert!((merged[1].score - 0.19).abs() < 1e-9);
        assert_eq!(
            merged[1].recommendation_type,
            RecommendationType::ExperienceMatch
        );

        assert!(merged[0].score >= merged[1].score);
    }

    #[tokio::test]
    async fn applied_candidates_never_surface() {
        let repo = Arc::new(InMemorySignalRepository::new());

        let job = posting(&["Rust"], None, true);
        let job_id = job.id;

        let mut applied = seeker("Applied", None, None);
        applied.applied_jobs.insert(job_id);
        repo.add_candidate(applied, vec!["Rust".to_string()], UserRole::JobSeeker);
        repo.add_job(job);

        let engine = CandidateRecommendationEngine::new(
            repo,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopAnalytics),
            &EngineConfig::default(),
        );
        assert!(engine.recommend_candidates(job_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_posting_degrades_to_empty() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let engine = CandidateRecommendationEngine::new(
            repo,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopAnalytics),
            &EngineConfig::default(),
        );
        assert!(engine
            .recommend_candidates(Uuid::new_v4(), 10)
            .await
            .unwrap()
            .is_empty());
    }
}
