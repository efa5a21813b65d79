//! Read-only access to the marketplace's signal data.
//!
//! The engine never mutates candidates, postings, or interaction events; it
//! reads them through this trait and writes only derived, cache-only results.
//! Method shapes are explicit about what is fetched and in what batch so an
//! implementation can choose eager joins, batched reads, or a read-through
//! cache without touching the scoring logic.

mod memory;

pub use memory::InMemorySignalRepository;

use crate::models::{
    CandidateProfile, ExperienceTier, InteractionKind, JobPosting, JobType, UserRole,
};
use crate::utils::{contains_ci, normalize};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Conjunctive filter over job postings.
///
/// `text_terms` is an AND conjunction: every term must match at least one of
/// title, description, requirements, skills, or company. `exclude_applied_by`
/// is resolved by the implementation (it needs the candidate's application
/// set); everything else is covered by [`JobFilter::matches`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFilter {
    pub text_terms: Vec<String>,
    pub location: Option<String>,
    /// When a location is set, remote-allowed postings pass regardless.
    pub include_remote: bool,
    pub job_type: Option<JobType>,
    pub experience_tier: Option<ExperienceTier>,
    /// Postings with no salary data fail salary-bounded filters.
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub skills: Vec<String>,
    pub company: Option<String>,
    pub max_age_days: Option<i64>,
    pub active_only: bool,
    pub exclude_applied_by: Option<Uuid>,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            text_terms: Vec::new(),
            location: None,
            include_remote: true,
            job_type: None,
            experience_tier: None,
            salary_min: None,
            salary_max: None,
            skills: Vec::new(),
            company: None,
            max_age_days: None,
            active_only: true,
            exclude_applied_by: None,
        }
    }
}

impl JobFilter {
    /// Predicate semantics shared by every repository implementation,
    /// except `exclude_applied_by` which needs candidate state.
    pub fn matches(&self, job: &JobPosting, now: DateTime<Utc>) -> bool {
        if self.active_only && !job.is_active {
            return false;
        }

        for term in &self.text_terms {
            let hit = contains_ci(&job.title, term)
                || contains_ci(&job.description, term)
                || contains_ci(&job.requirements, term)
                || contains_ci(&job.company, term)
                || job.required_skills.iter().any(|s| contains_ci(s, term));
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            let located = job
                .location
                .as_deref()
                .is_some_and(|l| contains_ci(l, location));
            let remote = self.include_remote && job.remote_allowed;
            if !located && !remote {
                return false;
            }
        }

        if let Some(job_type) = self.job_type {
            if job.job_type != Some(job_type) {
                return false;
            }
        }

        if let Some(tier) = self.experience_tier {
            if job.experience_tier != Some(tier) {
                return false;
            }
        }

        if let Some(floor) = self.salary_min {
            let ceiling = job.salary_max.or(job.salary_min);
            if !ceiling.is_some_and(|c| c >= floor) {
                return false;
            }
        }

        if let Some(cap) = self.salary_max {
            let floor = job.salary_min.or(job.salary_max);
            if !floor.is_some_and(|f| f <= cap) {
                return false;
            }
        }

        for skill in &self.skills {
            let wanted = normalize(skill);
            if !job.required_skills.iter().any(|s| normalize(s) == wanted) {
                return false;
            }
        }

        if let Some(company) = &self.company {
            if !contains_ci(&job.company, company) {
                return false;
            }
        }

        if let Some(max_age) = self.max_age_days {
            if job.created_at < now - Duration::days(max_age) {
                return false;
            }
        }

        true
    }
}

/// Conjunctive filter over candidate profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateFilter {
    /// AND conjunction over name, position, and skills.
    pub text_terms: Vec<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub experience_tier: Option<ExperienceTier>,
    /// Drop candidates who already applied to this posting.
    pub exclude_applied_to: Option<Uuid>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &CandidateProfile, skills: &[String]) -> bool {
        for term in &self.text_terms {
            let hit = contains_ci(&candidate.name, term)
                || candidate
                    .position
                    .as_deref()
                    .is_some_and(|p| contains_ci(p, term))
                || skills.iter().any(|s| contains_ci(s, term));
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if !candidate
                .location
                .as_deref()
                .is_some_and(|l| contains_ci(l, location))
            {
                return false;
            }
        }

        for skill in &self.skills {
            let wanted = normalize(skill);
            if !skills.iter().any(|s| normalize(s) == wanted) {
                return false;
            }
        }

        if let Some(tier) = self.experience_tier {
            if candidate.experience_tier != Some(tier) {
                return false;
            }
        }

        if let Some(job_id) = self.exclude_applied_to {
            if candidate.applied_jobs.contains(&job_id) {
                return false;
            }
        }

        true
    }
}

/// Read-only accessors over profiles, postings, and interaction signals.
#[async_trait::async_trait]
pub trait SignalRepository: Send + Sync {
    /// Fetch one candidate profile.
    async fn candidate(&self, id: Uuid) -> Result<Option<CandidateProfile>>;

    /// Skill names attached to one candidate.
    async fn candidate_skills(&self, id: Uuid) -> Result<Vec<String>>;

    /// Batched skill lookup; absent ids simply have no entry.
    async fn skills_for_candidates(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>>;

    /// Candidates matching the filter, in stable storage order.
    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<CandidateProfile>>;

    /// Postings matching the filter, in stable storage order.
    async fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<JobPosting>>;

    /// Batched posting lookup; unknown ids are skipped.
    async fn jobs_by_ids(&self, ids: &[Uuid]) -> Result<Vec<JobPosting>>;

    /// Aggregate interaction counts per job over the given candidates.
    async fn interaction_counts(
        &self,
        candidate_ids: &[Uuid],
        kind: InteractionKind,
    ) -> Result<HashMap<Uuid, u64>>;

    /// Role of the given user, if known.
    async fn user_role(&self, id: Uuid) -> Result<Option<UserRole>>;

    /// Fetch one posting.
    async fn job(&self, id: Uuid) -> Result<Option<JobPosting>> {
        Ok(self.jobs_by_ids(&[id]).await?.into_iter().next())
    }

    /// Whether the candidate applied to the job. The profile carries the
    /// application set, so the default goes through `candidate`.
    async fn has_applied(&self, candidate_id: Uuid, job_id: Uuid) -> Result<bool> {
        Ok(self
            .candidate(candidate_id)
            .await?
            .is_some_and(|c| c.applied_jobs.contains(&job_id)))
    }

    /// Whether the candidate viewed the job.
    async fn has_viewed(&self, candidate_id: Uuid, job_id: Uuid) -> Result<bool> {
        Ok(self
            .candidate(candidate_id)
            .await?
            .is_some_and(|c| c.viewed_jobs.contains(&job_id)))
    }
}
