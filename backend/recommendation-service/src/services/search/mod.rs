//! Relevance-ranked, personalized search over postings and candidates.
//!
//! Filtering is pushed into the repository filter structs; scoring and
//! ordering happen here. Every result carries a relevance score, a raw
//! popularity score, and a coarse freshness tier; jobs additionally get a
//! per-candidate personalization block when the requester is known.

use crate::analytics::{AnalyticsKind, AnalyticsRecorder};
use crate::cache::{cache_key, CacheFacade};
use crate::config::{EngineConfig, SearchConfig};
use crate::error::{EngineError, Result};
use crate::models::{
    CandidateProfile, CandidateSearchResult, JobPosting, JobSearchResult, PersonalizationBlock,
    SearchPage, UserRole,
};
use crate::repository::{CandidateFilter, JobFilter, SignalRepository};
use crate::utils::{contains_ci, normalize};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SearchRanker {
    repo: Arc<dyn SignalRepository>,
    cache: Arc<dyn CacheFacade>,
    analytics: Arc<dyn AnalyticsRecorder>,
    config: SearchConfig,
    application_multiplier: i64,
    cache_ttl: Duration,
}

impl SearchRanker {
    pub fn new(
        repo: Arc<dyn SignalRepository>,
        cache: Arc<dyn CacheFacade>,
        analytics: Arc<dyn AnalyticsRecorder>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            analytics,
            config: config.search.clone(),
            application_multiplier: config.popularity.application_multiplier,
            cache_ttl: Duration::from_secs(config.cache.search_ttl_secs),
        }
    }

    /// Free-text + filtered job search, ordered by relevance, popularity,
    /// freshness. `candidate_id`, when present, attaches personalization to
    /// each result on the returned page.
    pub async fn search_jobs(
        &self,
        query: &str,
        filter: &JobFilter,
        candidate_id: Option<Uuid>,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage<JobSearchResult>> {
        let terms = tokenize(query);
        let mut repo_filter = filter.clone();
        repo_filter.text_terms = terms.clone();
        repo_filter.active_only = true;

        let subject = candidate_id.unwrap_or_else(Uuid::nil);
        let key = cache_key(
            "search:jobs",
            subject,
            &search_params(query, &repo_filter, limit, offset),
        );
        if let Some(page) = self.cached::<SearchPage<JobSearchResult>>(&key).await {
            debug!(%subject, "job search served from cache");
            return Ok(page);
        }

        let jobs = match self.repo.find_jobs(&repo_filter).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, query, "job search read failed");
                return Ok(SearchPage::empty());
            }
        };

        let now = Utc::now();
        let mut results: Vec<JobSearchResult> = jobs
            .into_iter()
            .map(|job| {
                let relevance = self.job_relevance(&job, &terms);
                let popularity = job.engagement(self.application_multiplier);
                let freshness_tier = self.freshness_tier(job.created_at, now);
                JobSearchResult {
                    job,
                    relevance,
                    popularity,
                    freshness_tier,
                    personalization: None,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.popularity.cmp(&a.popularity))
                .then_with(|| b.freshness_tier.cmp(&a.freshness_tier))
        });

        let total_count = results.len();
        let mut page: Vec<JobSearchResult> =
            results.into_iter().skip(offset).take(limit).collect();
        let has_next = offset + page.len() < total_count;

        if let Some(candidate_id) = candidate_id {
            if let Some((profile, skills)) = self.load_requester(candidate_id).await {
                let skill_set: HashSet<String> = skills.iter().map(|s| normalize(s)).collect();
                for result in &mut page {
                    result.personalization =
                        Some(personalize(&result.job, &profile, &skill_set));
                }
            }
        }

        let page = SearchPage {
            results: page,
            total_count,
            has_next,
        };

        info!(query, total = total_count, returned = page.results.len(), "job search completed");

        self.store(&key, &page).await;
        self.record(candidate_id, AnalyticsKind::JobSearch, query, &repo_filter, total_count)
            .await;

        Ok(page)
    }

    /// Candidate search for recruiters. Non-recruiter callers receive a typed
    /// denial instead of results.
    pub async fn search_candidates(
        &self,
        query: &str,
        filter: &CandidateFilter,
        recruiter_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage<CandidateSearchResult>> {
        match self.repo.user_role(recruiter_id).await {
            Ok(Some(UserRole::Recruiter)) => {}
            Ok(_) => {
                return Err(EngineError::AccessDenied(
                    "candidate search is restricted to recruiter accounts".to_string(),
                ));
            }
            Err(e) => {
                warn!(error = %e, %recruiter_id, "failed to resolve recruiter role");
                return Ok(SearchPage::empty());
            }
        }

        let terms = tokenize(query);
        let mut repo_filter = filter.clone();
        repo_filter.text_terms = terms.clone();

        let key = cache_key(
            "search:candidates",
            recruiter_id,
            &search_params(query, &repo_filter, limit, offset),
        );
        if let Some(page) = self.cached::<SearchPage<CandidateSearchResult>>(&key).await {
            debug!(%recruiter_id, "candidate search served from cache");
            return Ok(page);
        }

        let candidates = match self.repo.find_candidates(&repo_filter).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, query, "candidate search read failed");
                return Ok(SearchPage::empty());
            }
        };

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let skills_by_candidate = match self.repo.skills_for_candidates(&ids).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!(error = %e, "candidate skill read failed during search");
                Default::default()
            }
        };

        let mut results: Vec<CandidateSearchResult> = candidates
            .into_iter()
            .map(|candidate| {
                let skills = skills_by_candidate
                    .get(&candidate.id)
                    .cloned()
                    .unwrap_or_default();
                let relevance = self.candidate_relevance(&candidate, &skills, &terms);
                CandidateSearchResult {
                    candidate_id: candidate.id,
                    name: candidate.name,
                    position: candidate.position,
                    location: candidate.location,
                    experience_tier: candidate.experience_tier,
                    skills,
                    relevance,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_count = results.len();
        let page_results: Vec<CandidateSearchResult> =
            results.into_iter().skip(offset).take(limit).collect();
        let has_next = offset + page_results.len() < total_count;

        let page = SearchPage {
            results: page_results,
            total_count,
            has_next,
        };

        info!(
            query,
            total = total_count,
            returned = page.results.len(),
            "candidate search completed"
        );

        self.store(&key, &page).await;
        self.record(
            Some(recruiter_id),
            AnalyticsKind::CandidateSearch,
            query,
            &repo_filter,
            total_count,
        )
        .await;

        Ok(page)
    }

    /// Term-position-weighted relevance: earlier terms count more, title
    /// matches outrank description and skill matches. Constant for an empty
    /// query so explicit filters alone still produce a stable ordering.
    fn job_relevance(&self, job: &JobPosting, terms: &[String]) -> f64 {
        if terms.is_empty() {
            return 1.0;
        }

        terms
            .iter()
            .enumerate()
            .map(|(position, term)| {
                let position_weight = 1.0 / (position as f64 + 1.0);
                let mut field_score = 0.0;
                if contains_ci(&job.title, term) {
                    field_score += self.config.title_weight;
                }
                if contains_ci(&job.company, term) {
                    field_score += self.config.company_weight;
                }
                if job.required_skills.iter().any(|s| contains_ci(s, term)) {
                    field_score += self.config.skill_weight;
                }
                if contains_ci(&job.description, term) || contains_ci(&job.requirements, term) {
                    field_score += self.config.description_weight;
                }
                position_weight * field_score
            })
            .sum()
    }

    fn candidate_relevance(
        &self,
        candidate: &CandidateProfile,
        skills: &[String],
        terms: &[String],
    ) -> f64 {
        if terms.is_empty() {
            return 1.0;
        }

        terms
            .iter()
            .enumerate()
            .map(|(position, term)| {
                let position_weight = 1.0 / (position as f64 + 1.0);
                let mut field_score = 0.0;
                if contains_ci(&candidate.name, term) {
                    field_score += self.config.name_weight;
                }
                if candidate
                    .position
                    .as_deref()
                    .is_some_and(|p| contains_ci(p, term))
                {
                    field_score += self.config.position_weight;
                }
                if skills.iter().any(|s| contains_ci(s, term)) {
                    field_score += self.config.skill_weight;
                }
                position_weight * field_score
            })
            .sum()
    }

    fn freshness_tier(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
        let age_days = (now - created_at).num_days();
        if age_days <= self.config.fresh_days {
            3
        } else if age_days <= self.config.recent_days {
            2
        } else {
            1
        }
    }

    async fn load_requester(&self, candidate_id: Uuid) -> Option<(CandidateProfile, Vec<String>)> {
        let profile = match self.repo.candidate(candidate_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to load requester for personalization");
                return None;
            }
        };
        let skills = match self.repo.candidate_skills(candidate_id).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!(error = %e, %candidate_id, "failed to load requester skills");
                Vec::new()
            }
        };
        Some((profile, skills))
    }

    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(error = %e, "corrupt cached search page, recomputing");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "search cache read failed");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, page: &T) {
        match serde_json::to_string(page) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(key, &payload, self.cache_ttl).await {
                    warn!(error = %e, "search cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize search page for cache"),
        }
    }

    async fn record<F: Serialize>(
        &self,
        subject: Option<Uuid>,
        kind: AnalyticsKind,
        query: &str,
        filter: &F,
        result_count: usize,
    ) {
        let filters = serde_json::to_string(filter).unwrap_or_default();
        if let Err(e) = self
            .analytics
            .record(subject, kind, query, &filters, result_count)
            .await
        {
            warn!(error = %e, kind = kind.as_str(), "failed to record search analytics");
        }
    }
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(normalize)
        .filter(|term| !term.is_empty())
        .collect()
}

fn personalize(
    job: &JobPosting,
    profile: &CandidateProfile,
    skill_set: &HashSet<String>,
) -> PersonalizationBlock {
    let matching_skills: Vec<String> = job
        .required_skills
        .iter()
        .filter(|s| skill_set.contains(&normalize(s)))
        .cloned()
        .collect();
    let missing_skills: Vec<String> = job
        .required_skills
        .iter()
        .filter(|s| !skill_set.contains(&normalize(s)))
        .cloned()
        .collect();
    let skill_match_percent = if job.required_skills.is_empty() {
        0.0
    } else {
        matching_skills.len() as f64 / job.required_skills.len() as f64 * 100.0
    };

    let experience_match = matches!(
        (profile.experience_tier, job.experience_tier),
        (Some(have), Some(want)) if have == want
    );
    let location_match = job.remote_allowed
        || matches!(
            (profile.location.as_deref(), job.location.as_deref()),
            (Some(have), Some(want)) if contains_ci(want, have)
        );
    let salary_match = matches!(
        (profile.expected_salary, job.salary_min, job.salary_max),
        (Some(expected), Some(min), Some(max)) if expected >= min && expected <= max
    );

    PersonalizationBlock {
        skill_match_percent,
        matching_skills,
        missing_skills,
        experience_match,
        location_match,
        salary_match,
        has_applied: profile.applied_jobs.contains(&job.id),
        has_viewed: profile.viewed_jobs.contains(&job.id),
        recommendation_score: None,
    }
}

/// Canonical parameter string hashed into the cache key.
fn search_params<F: Serialize>(query: &str, filter: &F, limit: usize, offset: usize) -> String {
    let filters = serde_json::to_string(filter).unwrap_or_default();
    format!("q={query}&f={filters}&limit={limit}&offset={offset}")
}
