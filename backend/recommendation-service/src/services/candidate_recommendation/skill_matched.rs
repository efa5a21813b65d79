use super::{CandidateRecommendationStrategy, ScoredCandidate};
use crate::config::CandidateScoringConfig;
use crate::models::{CandidateRecommendationSource, JobPosting};
use crate::repository::{CandidateFilter, SignalRepository};
use crate::utils::normalize;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Candidates ranked by how much of the posting's required skill list they
/// cover. Overlap below the configured floor is excluded.
pub struct SkillMatchedStrategy {
    repo: Arc<dyn SignalRepository>,
    config: CandidateScoringConfig,
}

impl SkillMatchedStrategy {
    pub fn new(repo: Arc<dyn SignalRepository>, config: CandidateScoringConfig) -> Self {
        Self { repo, config }
    }
}

#[async_trait]
impl CandidateRecommendationStrategy for SkillMatchedStrategy {
    async fn recommend(&self, job: &JobPosting, limit: usize) -> Result<Vec<ScoredCandidate>> {
        if job.required_skills.is_empty() {
            return Ok(Vec::new());
        }

        let filter = CandidateFilter {
            exclude_applied_to: Some(job.id),
            ..Default::default()
        };
        let candidates = self.repo.find_candidates(&filter).await?;
        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let skills_by_candidate = self.repo.skills_for_candidates(&ids).await?;

        let mut scored: Vec<ScoredCandidate> = Vec::new();
        for candidate in &candidates {
            let skill_set: HashSet<String> = skills_by_candidate
                .get(&candidate.id)
                .map(|skills| skills.iter().map(|s| normalize(s)).collect())
                .unwrap_or_default();

            let matched: Vec<String> = job
                .required_skills
                .iter()
                .filter(|s| skill_set.contains(&normalize(s)))
                .cloned()
                .collect();
            let score = matched.len() as f64 / job.required_skills.len() as f64;

            if score >= self.config.min_skill_score {
                scored.push(ScoredCandidate {
                    candidate_id: candidate.id,
                    score,
                    reason: format!(
                        "Covers {}/{} required skills: {}",
                        matched.len(),
                        job.required_skills.len(),
                        matched.join(", ")
                    ),
                });
            }
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    fn source(&self) -> CandidateRecommendationSource {
        CandidateRecommendationSource::Skill
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateProfile, ExperienceTier, UserRole};
    use crate::repository::InMemorySignalRepository;
    use chrono::Utc;

    fn seeker(name: &str) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            position: None,
            location: None,
            experience_tier: Some(ExperienceTier::Mid),
            expected_salary: None,
            applied_jobs: HashSet::new(),
            viewed_jobs: HashSet::new(),
        }
    }

    fn posting(required: &[&str]) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            requirements: String::new(),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            location: None,
            remote_allowed: true,
            job_type: None,
            experience_tier: None,
            salary_min: None,
            salary_max: None,
            created_at: Utc::now(),
            is_active: true,
            view_count: 0,
            application_count: 0,
        }
    }

    #[tokio::test]
    async fn ranks_by_overlap_and_excludes_below_floor() {
        let repo = Arc::new(InMemorySignalRepository::new());

        let full = seeker("Full");
        let full_id = full.id;
        repo.add_candidate(
            full,
            vec!["Rust".to_string(), "Postgres".to_string(), "Kafka".to_string()],
            UserRole::JobSeeker,
        );

        let partial = seeker("Partial");
        let partial_id = partial.id;
        repo.add_candidate(partial, vec!["Rust".to_string()], UserRole::JobSeeker);

        let none = seeker("None");
        repo.add_candidate(none, vec!["Cobol".to_string()], UserRole::JobSeeker);

        let strategy =
            SkillMatchedStrategy::new(repo, CandidateScoringConfig::default());
        let job = posting(&["Rust", "Postgres", "Kafka"]);
        let scored = strategy.recommend(&job, 10).await.unwrap();

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].candidate_id, full_id);
        assert!((scored[0].score - 1.0).abs() < 1e-9);
        assert_eq!(scored[1].candidate_id, partial_id);
        assert!((scored[1].score - 1.0 / 3.0).abs() < 1e-9);
        assert!(scored[0].reason.contains("3/3"));
    }

    #[tokio::test]
    async fn skips_candidates_who_already_applied() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let job = posting(&["Rust"]);

        let mut applied = seeker("Applied");
        applied.applied_jobs.insert(job.id);
        repo.add_candidate(applied, vec!["Rust".to_string()], UserRole::JobSeeker);

        let strategy =
            SkillMatchedStrategy::new(repo, CandidateScoringConfig::default());
        assert!(strategy.recommend(&job, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_required_skills_yields_nothing() {
        let repo = Arc::new(InMemorySignalRepository::new());
        repo.add_candidate(seeker("Anyone"), vec!["Rust".to_string()], UserRole::JobSeeker);

        let strategy =
            SkillMatchedStrategy::new(repo, CandidateScoringConfig::default());
        assert!(strategy.recommend(&posting(&[]), 10).await.unwrap().is_empty());
    }
}
