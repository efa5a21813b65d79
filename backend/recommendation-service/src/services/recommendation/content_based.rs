use super::{JobRecommendationStrategy, ScoredJob};
use crate::config::ContentScoringConfig;
use crate::models::{CandidateProfile, JobPosting, JobRecommendationSource};
use crate::repository::{JobFilter, SignalRepository};
use crate::utils::{contains_ci, normalize};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Content-based scoring of a candidate against a posting.
///
/// Weighted sub-scores: skill overlap, experience-tier match, location or
/// remote fit, salary fit, and posting freshness. Postings are pre-filtered
/// by the repository (active, not applied, tier equal when the candidate has
/// one, location match or remote).
pub struct ContentBasedStrategy {
    repo: Arc<dyn SignalRepository>,
    config: ContentScoringConfig,
}

impl ContentBasedStrategy {
    pub fn new(repo: Arc<dyn SignalRepository>, config: ContentScoringConfig) -> Self {
        Self { repo, config }
    }

    /// Score in [0,1] plus the required skills the candidate covers.
    fn score_job(
        &self,
        candidate: &CandidateProfile,
        candidate_skills: &HashSet<String>,
        job: &JobPosting,
        now: DateTime<Utc>,
    ) -> (f64, Vec<String>) {
        let matched: Vec<String> = job
            .required_skills
            .iter()
            .filter(|s| candidate_skills.contains(&normalize(s)))
            .cloned()
            .collect();
        let skill_score = if job.required_skills.is_empty() {
            0.0
        } else {
            matched.len() as f64 / job.required_skills.len() as f64
        };

        let experience_score = match (candidate.experience_tier, job.experience_tier) {
            (Some(have), Some(want)) if have == want => 1.0,
            _ => 0.0,
        };

        let location_score = if job.remote_allowed || location_fits(candidate, job) {
            1.0
        } else {
            0.0
        };

        let salary_score = salary_fit(
            candidate.expected_salary,
            job.salary_min,
            job.salary_max,
            self.config.salary_above_range_score,
        );

        let freshness = freshness_score(job.created_at, now, self.config.freshness_horizon_days);

        let score = self.config.skill_weight * skill_score
            + self.config.experience_weight * experience_score
            + self.config.location_weight * location_score
            + self.config.salary_weight * salary_score
            + self.config.freshness_weight * freshness;

        (score.clamp(0.0, 1.0), matched)
    }
}

#[async_trait]
impl JobRecommendationStrategy for ContentBasedStrategy {
    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredJob>> {
        let filter = JobFilter {
            active_only: true,
            exclude_applied_by: Some(candidate.id),
            experience_tier: candidate.experience_tier,
            location: candidate.location.clone(),
            include_remote: true,
            ..Default::default()
        };
        let jobs = self.repo.find_jobs(&filter).await?;

        let now = Utc::now();
        let candidate_skills: HashSet<String> = skills.iter().map(|s| normalize(s)).collect();

        let mut scored: Vec<ScoredJob> = jobs
            .iter()
            .filter_map(|job| {
                let (score, matched) = self.score_job(candidate, &candidate_skills, job, now);
                (score > self.config.min_score).then(|| ScoredJob {
                    job_id: job.id,
                    score,
                    reason: build_reason(job, &matched),
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
        JobRecommendationSource::Content
    }
}

fn location_fits(candidate: &CandidateProfile, job: &JobPosting) -> bool {
    match (candidate.location.as_deref(), job.location.as_deref()) {
        (Some(have), Some(want)) => contains_ci(want, have),
        _ => false,
    }
}

/// 1.0 inside the posted range, a reduced score when the expectation clears
/// the minimum but exceeds the maximum, 0 otherwise or without salary data.
fn salary_fit(
    expected: Option<i64>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    above_range_score: f64,
) -> f64 {
    match (expected, salary_min, salary_max) {
        (Some(expected), Some(min), Some(max)) => {
            if expected >= min && expected <= max {
                1.0
            } else if expected >= min {
                above_range_score
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Linear decay from 1 at age zero to 0 at the horizon.
fn freshness_score(created_at: DateTime<Utc>, now: DateTime<Utc>, horizon_days: i64) -> f64 {
    let age_days = (now - created_at).num_seconds() as f64 / 86_400.0;
    (1.0 - age_days / horizon_days as f64).clamp(0.0, 1.0)
}

fn build_reason(job: &JobPosting, matched: &[String]) -> String {
    let mut reason = if matched.is_empty() {
        "Related to your profile.".to_string()
    } else {
        format!("Matches your skills: {}.", matched.join(", "))
    };
    if job.remote_allowed {
        reason.push_str(" Remote friendly.");
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceTier, UserRole};
    use crate::repository::InMemorySignalRepository;
    use chrono::Duration;
    use uuid::Uuid;

    fn seeker(skills_tier: Option<ExperienceTier>) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            name: "Casey".to_string(),
            position: None,
            location: Some("Berlin".to_string()),
            experience_tier: skills_tier,
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

    #[test]
    fn freshness_decays_linearly() {
        let now = Utc::now();
        assert!((freshness_score(now, now, 30) - 1.0).abs() < 1e-6);
        let half = freshness_score(now - Duration::days(15), now, 30);
        assert!((half - 0.5).abs() < 1e-3);
        assert_eq!(freshness_score(now - Duration::days(45), now, 30), 0.0);
    }

    #[test]
    fn salary_fit_tiers() {
        assert_eq!(salary_fit(Some(90_000), Some(80_000), Some(100_000), 0.67), 1.0);
        assert_eq!(salary_fit(Some(120_000), Some(80_000), Some(100_000), 0.67), 0.67);
        assert_eq!(salary_fit(Some(50_000), Some(80_000), Some(100_000), 0.67), 0.0);
        assert_eq!(salary_fit(None, Some(80_000), Some(100_000), 0.67), 0.0);
        assert_eq!(salary_fit(Some(90_000), None, None, 0.67), 0.0);
    }

    #[tokio::test]
    async fn scores_partial_skill_overlap_with_tier_and_remote() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let candidate = seeker(Some(ExperienceTier::Mid));
        let candidate_id = candidate.id;
        repo.add_candidate(
            candidate.clone(),
            vec!["Python".to_string(), "Django".to_string()],
            UserRole::JobSeeker,
        );
        repo.add_job(posting(
            &["Python", "Django", "AWS"],
            Some(ExperienceTier::Mid),
            true,
        ));

        let strategy =
            ContentBasedStrategy::new(repo.clone(), ContentScoringConfig::default());
        let candidate = repo.candidate(candidate_id).await.unwrap().unwrap();
        let skills = repo.candidate_skills(candidate_id).await.unwrap();
        let scored = strategy.recommend(&candidate, &skills, 10).await.unwrap();

        // 0.40·(2/3) + 0.20 + 0.15 + 0 + 0.10 ≈ 0.7167
        assert_eq!(scored.len(), 1);
        assert!((scored[0].score - 0.7167).abs() < 1e-3);
        assert!(scored[0].reason.contains("Python, Django"));
    }

    #[tokio::test]
    async fn weak_matches_fall_below_the_floor() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let mut candidate = seeker(None);
        candidate.location = None;
        let candidate_id = candidate.id;
        repo.add_candidate(candidate, vec![], UserRole::JobSeeker);

        // Remote posting so the prefilter passes, but no skills, no tier,
        // no salary data: 0.15 location + 0.10 freshness = 0.25 < 0.3.
        let mut job = posting(&["Rust"], None, true);
        job.location = None;
        repo.add_job(job);

        let strategy =
            ContentBasedStrategy::new(repo.clone(), ContentScoringConfig::default());
        let candidate = repo.candidate(candidate_id).await.unwrap().unwrap();
        let scored = strategy.recommend(&candidate, &[], 10).await.unwrap();
        assert!(scored.is_empty());
    }

    #[tokio::test]
    async fn results_sorted_descending_and_truncated() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let candidate = seeker(Some(ExperienceTier::Mid));
        let candidate_id = candidate.id;
        repo.add_candidate(
            candidate,
            vec!["Python".to_string(), "Django".to_string()],
            UserRole::JobSeeker,
        );

        repo.add_job(posting(&["Python"], Some(ExperienceTier::Mid), true));
        repo.add_job(posting(
            &["Python", "Django"],
            Some(ExperienceTier::Mid),
            true,
        ));
        repo.add_job(posting(
            &["Python", "Django", "AWS", "Terraform"],
            Some(ExperienceTier::Mid),
            true,
        ));

        let strategy =
            ContentBasedStrategy::new(repo.clone(), ContentScoringConfig::default());
        let candidate = repo.candidate(candidate_id).await.unwrap().unwrap();
        let skills = repo.candidate_skills(candidate_id).await.unwrap();

        let scored = strategy.recommend(&candidate, &skills, 2).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored[0].score >= scored[1].score);
    }
}
