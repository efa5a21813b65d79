use super::{JobRecommendationStrategy, ScoredJob};
use crate::config::PopularityConfig;
use crate::models::{CandidateProfile, JobRecommendationSource};
use crate::repository::{JobFilter, SignalRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Trending postings: created inside the recency window, ranked by raw
/// engagement (views plus weighted applications), normalized by the maximum
/// engagement in the set.
pub struct PopularityStrategy {
    repo: Arc<dyn SignalRepository>,
    config: PopularityConfig,
}

impl PopularityStrategy {
    pub fn new(repo: Arc<dyn SignalRepository>, config: PopularityConfig) -> Self {
        Self { repo, config }
    }
}

#[async_trait]
impl JobRecommendationStrategy for PopularityStrategy {
    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        _skills: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredJob>> {
        let filter = JobFilter {
            active_only: true,
            exclude_applied_by: Some(candidate.id),
            max_age_days: Some(self.config.window_days),
            ..Default::default()
        };
        let jobs = self.repo.find_jobs(&filter).await?;

        let max = jobs
            .iter()
            .map(|job| job.engagement(self.config.application_multiplier))
            .max()
            .unwrap_or(0);
        if max <= 0 {
            debug!(candidate = %candidate.id, "no recent engagement, popularity recall empty");
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredJob> = jobs
            .iter()
            .map(|job| {
                let engagement = job.engagement(self.config.application_multiplier);
                ScoredJob {
                    job_id: job.id,
                    score: engagement as f64 / max as f64,
                    reason: format!("Trending posting with {engagement} recent interactions"),
                }
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
        JobRecommendationSource::Popularity
    }
}
