//! Set similarity between candidates.
//!
//! Candidates are compared on two explicit signals: their skill sets and the
//! attributes of the jobs they applied to. No latent factors, no training —
//! just Jaccard over sets, blended with fixed weights.

use crate::config::SimilarityConfig;
use crate::models::{CandidateProfile, JobPosting};
use crate::repository::{CandidateFilter, SignalRepository};
use crate::utils::normalize;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Jaccard similarity |A∩B| / |A∪B|.
///
/// Two empty sets are identical (1.0); an empty set shares nothing with a
/// non-empty one (0.0). Symmetric and reflexive.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarCandidate {
    pub candidate_id: Uuid,
    pub similarity: f64,
}

pub struct SimilarityEngine {
    repo: Arc<dyn SignalRepository>,
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(repo: Arc<dyn SignalRepository>, config: SimilarityConfig) -> Self {
        Self { repo, config }
    }

    /// Ranked candidates most similar to the given one, by blended skill and
    /// applied-job-attribute similarity. Only candidates above the configured
    /// floor are returned, sorted descending; ties keep storage order.
    pub async fn similar_to(&self, candidate_id: Uuid, limit: usize) -> Result<Vec<SimilarCandidate>> {
        let Some(target) = self.repo.candidate(candidate_id).await? else {
            debug!(%candidate_id, "similarity target not found");
            return Ok(Vec::new());
        };
        let target_skills = self.repo.candidate_skills(candidate_id).await?;
        self.similar_candidates(&target, &target_skills, limit).await
    }

    pub async fn similar_candidates(
        &self,
        target: &CandidateProfile,
        target_skills: &[String],
        limit: usize,
    ) -> Result<Vec<SimilarCandidate>> {
        let others: Vec<CandidateProfile> = self
            .repo
            .find_candidates(&CandidateFilter::default())
            .await?
            .into_iter()
            .filter(|c| c.id != target.id)
            .collect();

        if others.is_empty() {
            return Ok(Vec::new());
        }

        let other_ids: Vec<Uuid> = others.iter().map(|c| c.id).collect();
        let skills_by_candidate = self.repo.skills_for_candidates(&other_ids).await?;

        // One batched posting fetch covers every applied-attribute set.
        let mut applied_ids: HashSet<Uuid> = target.applied_jobs.clone();
        for other in &others {
            applied_ids.extend(&other.applied_jobs);
        }
        let applied_ids: Vec<Uuid> = applied_ids.into_iter().collect();
        let attributes_by_job: HashMap<Uuid, HashSet<String>> = self
            .repo
            .jobs_by_ids(&applied_ids)
            .await?
            .iter()
            .map(|job| (job.id, job_attributes(job)))
            .collect();

        let target_skill_set = skill_set(target_skills);
        let target_attributes = applied_attributes(&target.applied_jobs, &attributes_by_job);

        let mut scored: Vec<SimilarCandidate> = Vec::new();
        for other in &others {
            let other_skill_set = skills_by_candidate
                .get(&other.id)
                .map(|s| skill_set(s))
                .unwrap_or_default();
            let other_attributes = applied_attributes(&other.applied_jobs, &attributes_by_job);

            let blended = self.config.skill_weight * jaccard(&target_skill_set, &other_skill_set)
                + self.config.applied_attribute_weight
                    * jaccard(&target_attributes, &other_attributes);

            if blended > self.config.min_similarity {
                scored.push(SimilarCandidate {
                    candidate_id: other.id,
                    similarity: blended,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        debug!(
            target = %target.id,
            similar = scored.len(),
            "similar-candidate ranking computed"
        );
        Ok(scored)
    }
}

fn skill_set(skills: &[String]) -> HashSet<String> {
    skills.iter().map(|s| normalize(s)).collect()
}

/// Attribute tokens of one posting: required skills, location, tier label.
fn job_attributes(job: &JobPosting) -> HashSet<String> {
    let mut attributes: HashSet<String> =
        job.required_skills.iter().map(|s| normalize(s)).collect();
    if let Some(location) = &job.location {
        attributes.insert(normalize(location));
    }
    if let Some(tier) = job.experience_tier {
        attributes.insert(tier.as_str().to_string());
    }
    attributes
}

fn applied_attributes(
    applied: &HashSet<Uuid>,
    attributes_by_job: &HashMap<Uuid, HashSet<String>>,
) -> HashSet<String> {
    let mut attributes = HashSet::new();
    for job_id in applied {
        if let Some(tokens) = attributes_by_job.get(job_id) {
            attributes.extend(tokens.iter().cloned());
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceTier, UserRole};
    use crate::repository::InMemorySignalRepository;
    use chrono::Utc;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = set(&["python", "react", "sql"]);
        let b = set(&["python", "go"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn jaccard_empty_set_conventions() {
        let empty: HashSet<String> = HashSet::new();
        let nonempty = set(&["python"]);
        assert_eq!(jaccard(&empty, &empty), 1.0);
        assert_eq!(jaccard(&nonempty, &empty), 0.0);
        assert_eq!(jaccard(&empty, &nonempty), 0.0);
    }

    #[test]
    fn jaccard_is_reflexive() {
        let a = set(&["python", "react"]);
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn identical_skill_sets_are_fully_similar() {
        let a = set(&["python", "react"]);
        let b = set(&["python", "react"]);
        assert_eq!(jaccard(&a, &b), 1.0);

        let c = set(&["cobol", "fortran"]);
        assert_eq!(jaccard(&a, &c), 0.0);
    }

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

    #[tokio::test]
    async fn ranks_by_blended_similarity_and_applies_floor() {
        let repo = Arc::new(InMemorySignalRepository::new());

        let target = seeker("Target");
        let target_id = target.id;
        repo.add_candidate(
            target,
            vec!["Python".to_string(), "React".to_string()],
            UserRole::JobSeeker,
        );

        let twin = seeker("Twin");
        let twin_id = twin.id;
        repo.add_candidate(
            twin,
            vec!["Python".to_string(), "React".to_string()],
            UserRole::JobSeeker,
        );

        let half = seeker("Half");
        let half_id = half.id;
        repo.add_candidate(
            half,
            vec!["Python".to_string(), "Go".to_string(), "Kafka".to_string()],
            UserRole::JobSeeker,
        );

        let engine = SimilarityEngine::new(repo, SimilarityConfig::default());
        let similar = engine.similar_to(target_id, 10).await.unwrap();

        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].candidate_id, twin_id);
        assert!((similar[0].similarity - 1.0).abs() < 1e-9);
        assert_eq!(similar[1].candidate_id, half_id);
        assert!(similar[0].similarity >= similar[1].similarity);
    }

    #[tokio::test]
    async fn applied_job_attributes_contribute() {
        let repo = Arc::new(InMemorySignalRepository::new());

        let job = JobPosting {
            id: Uuid::new_v4(),
            title: "Data Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            requirements: String::new(),
            required_skills: vec!["Spark".to_string()],
            location: Some("Berlin".to_string()),
            remote_allowed: false,
            job_type: None,
            experience_tier: Some(ExperienceTier::Mid),
            salary_min: None,
            salary_max: None,
            created_at: Utc::now(),
            is_active: true,
            view_count: 0,
            application_count: 0,
        };
        let job_id = job.id;
        repo.add_job(job);

        let mut target = seeker("Target");
        target.applied_jobs.insert(job_id);
        let target_id = target.id;
        repo.add_candidate(target, vec!["Python".to_string()], UserRole::JobSeeker);

        let mut peer = seeker("Peer");
        peer.applied_jobs.insert(job_id);
        repo.add_candidate(peer, vec!["Rust".to_string()], UserRole::JobSeeker);

        let engine = SimilarityEngine::new(repo, SimilarityConfig::default());
        let similar = engine.similar_to(target_id, 10).await.unwrap();

        // Disjoint skills, identical application history: 0.7·0 + 0.3·1.
        assert_eq!(similar.len(), 1);
        assert!((similar[0].similarity - 0.3).abs() < 1e-9);
    }
}
