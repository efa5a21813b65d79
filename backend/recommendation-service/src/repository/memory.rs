//! In-memory signal repository for tests and local development.

use super::{CandidateFilter, JobFilter, SignalRepository};
use crate::models::{CandidateProfile, InteractionKind, JobPosting, UserRole};
use anyhow::{bail, Result};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Stores entities keyed by id with an insertion sequence so that `find_*`
/// results come back in stable storage order, matching the tie-breaking
/// guarantees of the scoring layers. Reads can be forced to fail to exercise
/// the degraded paths.
#[derive(Default)]
pub struct InMemorySignalRepository {
    candidates: DashMap<Uuid, (u64, CandidateProfile)>,
    skills: DashMap<Uuid, Vec<String>>,
    jobs: DashMap<Uuid, (u64, JobPosting)>,
    roles: DashMap<Uuid, UserRole>,
    seq: AtomicU64,
    fail_reads: AtomicBool,
}

impl InMemorySignalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_candidate(&self, profile: CandidateProfile, skills: Vec<String>, role: UserRole) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.roles.insert(profile.id, role);
        self.skills.insert(profile.id, skills);
        self.candidates.insert(profile.id, (seq, profile));
    }

    pub fn add_job(&self, job: JobPosting) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.jobs.insert(job.id, (seq, job));
    }

    /// Make every subsequent read fail, to exercise degraded paths.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("injected repository read failure");
        }
        Ok(())
    }

    fn candidates_in_order(&self) -> Vec<CandidateProfile> {
        let mut rows: Vec<(u64, CandidateProfile)> = self
            .candidates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, profile)| profile).collect()
    }

    fn jobs_in_order(&self) -> Vec<JobPosting> {
        let mut rows: Vec<(u64, JobPosting)> =
            self.jobs.iter().map(|entry| entry.value().clone()).collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, job)| job).collect()
    }
}

#[async_trait::async_trait]
impl SignalRepository for InMemorySignalRepository {
    async fn candidate(&self, id: Uuid) -> Result<Option<CandidateProfile>> {
        self.ensure_readable()?;
        Ok(self.candidates.get(&id).map(|entry| entry.value().1.clone()))
    }

    async fn candidate_skills(&self, id: Uuid) -> Result<Vec<String>> {
        self.ensure_readable()?;
        Ok(self
            .skills
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn skills_for_candidates(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>> {
        self.ensure_readable()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.skills.get(id).map(|entry| (*id, entry.value().clone())))
            .collect())
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<CandidateProfile>> {
        self.ensure_readable()?;
        let results = self
            .candidates_in_order()
            .into_iter()
            .filter(|candidate| {
                let skills = self
                    .skills
                    .get(&candidate.id)
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default();
                filter.matches(candidate, &skills)
            })
            .collect();
        Ok(results)
    }

    async fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<JobPosting>> {
        self.ensure_readable()?;
        let now = Utc::now();
        let applied = match filter.exclude_applied_by {
            Some(candidate_id) => self
                .candidates
                .get(&candidate_id)
                .map(|entry| entry.value().1.applied_jobs.clone())
                .unwrap_or_default(),
            None => Default::default(),
        };
        let results = self
            .jobs_in_order()
            .into_iter()
            .filter(|job| !applied.contains(&job.id) && filter.matches(job, now))
            .collect();
        Ok(results)
    }

    async fn jobs_by_ids(&self, ids: &[Uuid]) -> Result<Vec<JobPosting>> {
        self.ensure_readable()?;
        let mut rows: Vec<(u64, JobPosting)> = ids
            .iter()
            .filter_map(|id| self.jobs.get(id).map(|entry| entry.value().clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, job)| job).collect())
    }

    async fn interaction_counts(
        &self,
        candidate_ids: &[Uuid],
        kind: InteractionKind,
    ) -> Result<HashMap<Uuid, u64>> {
        self.ensure_readable()?;
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for id in candidate_ids {
            let Some(entry) = self.candidates.get(id) else {
                continue;
            };
            let profile = &entry.value().1;
            let jobs = match kind {
                InteractionKind::Applied => &profile.applied_jobs,
                InteractionKind::Viewed => &profile.viewed_jobs,
            };
            for job_id in jobs {
                *counts.entry(*job_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn user_role(&self, id: Uuid) -> Result<Option<UserRole>> {
        self.ensure_readable()?;
        Ok(self.roles.get(&id).map(|entry| *entry.value()))
    }
}
