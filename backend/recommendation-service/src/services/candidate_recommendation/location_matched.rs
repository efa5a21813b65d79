use super::{CandidateRecommendationStrategy, ScoredCandidate};
use crate::config::CandidateScoringConfig;
use crate::models::{CandidateRecommendationSource, JobPosting};
use crate::repository::{CandidateFilter, SignalRepository};
use crate::utils::contains_ci;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Location fit. Remote postings accept everyone at the higher score;
/// otherwise co-located candidates score lower and everyone else is skipped.
pub struct LocationMatchedStrategy {
    repo: Arc<dyn SignalRepository>,
    config: CandidateScoringConfig,
}

impl LocationMatchedStrategy {
    pub fn new(repo: Arc<dyn SignalRepository>, config: CandidateScoringConfig) -> Self {
        Self { repo, config }
    }
}

#[async_trait]
impl CandidateRecommendationStrategy for LocationMatchedStrategy {
    async fn recommend(&self, job: &JobPosting, limit: usize) -> Result<Vec<ScoredCandidate>> {
        let filter = CandidateFilter {
            exclude_applied_to: Some(job.id),
            ..Default::default()
        };
        let candidates = self.repo.find_candidates(&filter).await?;

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .filter_map(|candidate| {
                if job.remote_allowed {
                    return Some(ScoredCandidate {
                        candidate_id: candidate.id,
                        score: self.config.location_remote_score,
                        reason: "Available for remote work".to_string(),
                    });
                }
                let colocated = match (candidate.location.as_deref(), job.location.as_deref()) {
                    (Some(have), Some(want)) => contains_ci(want, have),
                    _ => false,
                };
                colocated.then(|| ScoredCandidate {
                    candidate_id: candidate.id,
                    score: self.config.location_match_score,
                    reason: format!(
                        "Based in {}",
                        candidate.location.as_deref().unwrap_or_default()
                    ),
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

    fn source(&self) -> CandidateRecommendationSource {
        CandidateRecommendationSource::Location
    }
}
