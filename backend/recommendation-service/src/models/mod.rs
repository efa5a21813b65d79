use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Ordered seniority ladder. The derive order defines adjacency for the
/// experience-match scoring ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceTier::Entry => "entry",
            ExperienceTier::Junior => "junior",
            ExperienceTier::Mid => "mid",
            ExperienceTier::Senior => "senior",
            ExperienceTier::Lead => "lead",
            ExperienceTier::Executive => "executive",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Number of steps between two tiers on the ladder.
    pub fn distance(&self, other: ExperienceTier) -> usize {
        self.index().abs_diff(other.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    JobSeeker,
    Recruiter,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::JobSeeker => "job_seeker",
            UserRole::Recruiter => "recruiter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Viewed,
    Applied,
}

/// Job-seeker profile as read from the signal repository. Skills are fetched
/// separately so implementations can pick their own batch shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub location: Option<String>,
    pub experience_tier: Option<ExperienceTier>,
    pub expected_salary: Option<i64>,
    pub applied_jobs: HashSet<Uuid>,
    pub viewed_jobs: HashSet<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: String,
    pub required_skills: Vec<String>,
    pub location: Option<String>,
    pub remote_allowed: bool,
    pub job_type: Option<JobType>,
    pub experience_tier: Option<ExperienceTier>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub view_count: i64,
    pub application_count: i64,
}

impl JobPosting {
    /// Raw engagement signal: views plus weighted applications.
    pub fn engagement(&self, application_multiplier: i64) -> i64 {
        self.view_count + application_multiplier * self.application_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRecommendationSource {
    Content,
    Collaborative,
    Popularity,
}

impl JobRecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRecommendationSource::Content => "content",
            JobRecommendationSource::Collaborative => "collaborative",
            JobRecommendationSource::Popularity => "popularity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateRecommendationSource {
    Skill,
    Experience,
    Location,
}

impl CandidateRecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateRecommendationSource::Skill => "skill",
            CandidateRecommendationSource::Experience => "experience",
            CandidateRecommendationSource::Location => "location",
        }
    }
}

/// Dominant classification of a merged recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ContentBased,
    Collaborative,
    Trending,
    SkillMatch,
    ExperienceMatch,
    LocationMatch,
    Mixed,
}

/// Merged job recommendation handed to the API layer. Ephemeral: cached with
/// a TTL, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub job_id: Uuid,
    pub score: f64,
    pub sources: Vec<JobRecommendationSource>,
    pub reasons: Vec<String>,
    pub recommendation_type: RecommendationType,
}

/// Merged candidate recommendation for a recruiter viewing one posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecommendation {
    pub candidate_id: Uuid,
    pub score: f64,
    pub sources: Vec<CandidateRecommendationSource>,
    pub reasons: Vec<String>,
    pub recommendation_type: RecommendationType,
}

/// Per-candidate annotations attached to a job search result.
/// `recommendation_score` is left for the caller to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationBlock {
    pub skill_match_percent: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience_match: bool,
    pub location_match: bool,
    pub salary_match: bool,
    pub has_applied: bool,
    pub has_viewed: bool,
    pub recommendation_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSearchResult {
    pub job: JobPosting,
    pub relevance: f64,
    pub popularity: i64,
    pub freshness_tier: u8,
    pub personalization: Option<PersonalizationBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSearchResult {
    pub candidate_id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub location: Option<String>,
    pub experience_tier: Option<ExperienceTier>,
    pub skills: Vec<String>,
    pub relevance: f64,
}

/// One page of search results. `total_count` is computed before slicing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
    pub total_count: usize,
    pub has_next: bool,
}

impl<T> SearchPage<T> {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_count: 0,
            has_next: false,
        }
    }
}
