use super::{JobRecommendationStrategy, ScoredJob};
use crate::config::CollaborativeConfig;
use crate::models::{CandidateProfile, InteractionKind, JobRecommendationSource};
use crate::repository::SignalRepository;
use crate::services::similarity::SimilarityEngine;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const SIMILAR_PROFILE_REASON: &str =
    "Candidates with a similar profile applied to or viewed this job";

/// Collaborative filtering over explicit interactions.
///
/// Jobs that candidates similar to the target applied to (weight 0.7) or
/// viewed (weight 0.3) are aggregated per job and normalized by the largest
/// aggregate observed.
pub struct CollaborativeStrategy {
    repo: Arc<dyn SignalRepository>,
    similarity: SimilarityEngine,
    config: CollaborativeConfig,
    max_similar: usize,
}

impl CollaborativeStrategy {
    pub fn new(
        repo: Arc<dyn SignalRepository>,
        similarity: SimilarityEngine,
        config: CollaborativeConfig,
        max_similar: usize,
    ) -> Self {
        Self {
            repo,
            similarity,
            config,
            max_similar,
        }
    }
}

#[async_trait]
impl JobRecommendationStrategy for CollaborativeStrategy {
    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredJob>> {
        let similar = self
            .similarity
            .similar_candidates(candidate, skills, self.max_similar)
            .await?;

        if similar.is_empty() {
            debug!(candidate = %candidate.id, "no similar candidates, collaborative recall empty");
            return Ok(Vec::new());
        }

        let similar_ids: Vec<Uuid> = similar.iter().map(|s| s.candidate_id).collect();
        let applications = self
            .repo
            .interaction_counts(&similar_ids, InteractionKind::Applied)
            .await?;
        let views = self
            .repo
            .interaction_counts(&similar_ids, InteractionKind::Viewed)
            .await?;

        let mut aggregate: HashMap<Uuid, f64> = HashMap::new();
        for (job_id, count) in &applications {
            *aggregate.entry(*job_id).or_default() +=
                self.config.application_weight * *count as f64;
        }
        for (job_id, count) in &views {
            *aggregate.entry(*job_id).or_default() += self.config.view_weight * *count as f64;
        }

        aggregate.retain(|job_id, _| !candidate.applied_jobs.contains(job_id));
        if aggregate.is_empty() {
            return Ok(Vec::new());
        }

        // Drop inactive postings; iterate the batched fetch so the output
        // order is storage order, keeping the sort stable.
        let job_ids: Vec<Uuid> = aggregate.keys().copied().collect();
        let jobs = self.repo.jobs_by_ids(&job_ids).await?;
        let active: HashSet<Uuid> = jobs.iter().filter(|j| j.is_active).map(|j| j.id).collect();
        aggregate.retain(|job_id, _| active.contains(job_id));

        let max = aggregate.values().fold(0.0_f64, |acc, v| acc.max(*v));
        if max <= 0.0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredJob> = jobs
            .iter()
            .filter(|job| job.is_active)
            .filter_map(|job| {
                aggregate.get(&job.id).map(|raw| ScoredJob {
                    job_id: job.id,
                    score: raw / max,
                    reason: SIMILAR_PROFILE_REASON.to_string(),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    fn source(&self) -> JobRecommendationSource {
        JobRecommendationSource::Collaborative
    }
}
