use super::{CandidateRecommendationStrategy, ScoredCandidate};
use crate::config::CandidateScoringConfig;
use crate::models::{CandidateProfile, CandidateRecommendationSource, JobPosting};
use crate::repository::{CandidateFilter, SignalRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Candidates scored by distance between their tier and the posting's on the
/// seniority ladder: exact, adjacent, two apart, or anything else. Missing
/// tier information on either side lands in the fallback bucket.
pub struct ExperienceMatchedStrategy {
    repo: Arc<dyn SignalRepository>,
    config: CandidateScoringConfig,
}

impl ExperienceMatchedStrategy {
    pub fn new(repo: Arc<dyn SignalRepository>, config: CandidateScoringConfig) -> Self {
        Self { repo, config }
    }

    fn score(&self, candidate: &CandidateProfile, job: &JobPosting) -> (f64, String) {
        match (candidate.experience_tier, job.experience_tier) {
            (Some(have), Some(want)) => match have.distance(want) {
                0 => (
                    self.config.experience_exact,
                    format!("Experience level matches the role exactly ({})", want.as_str()),
                ),
                1 => (
                    self.config.experience_adjacent,
                    "Experience level is one step from the role".to_string(),
                ),
                2 => (
                    self.config.experience_two_apart,
                    "Experience level is two steps from the role".to_string(),
                ),
                _ => (
                    self.config.experience_fallback,
                    "Experience level differs from the role".to_string(),
                ),
            },
            _ => (
                self.config.experience_fallback,
                "Experience level unknown".to_string(),
            ),
        }
    }
}

#[async_trait]
impl CandidateRecommendationStrategy for ExperienceMatchedStrategy {
    async fn recommend(&self, job: &JobPosting, limit: usize) -> Result<Vec<ScoredCandidate>> {
        let filter = CandidateFilter {
            exclude_applied_to: Some(job.id),
            ..Default::default()
        };
        let candidates = self.repo.find_candidates(&filter).await?;

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|candidate| {
                let (score, reason) = self.score(candidate, job);
                ScoredCandidate {
                    candidate_id: candidate.id,
                    score,
                    reason,
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

    fn source(&self) -> CandidateRecommendationSource {
        CandidateRecommendationSource::Experience
    }
}
