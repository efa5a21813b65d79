//! Fire-and-forget analytics recording.
//!
//! Every search/recommendation invocation is reported for later analysis.
//! The transport lives in a separate service; from this crate's point of view
//! a failed `record` is logged by the call site and never affects the result.

use anyhow::Result;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsKind {
    JobSearch,
    CandidateSearch,
    JobRecommendations,
    CandidateRecommendations,
}

impl AnalyticsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsKind::JobSearch => "job_search",
            AnalyticsKind::CandidateSearch => "candidate_search",
            AnalyticsKind::JobRecommendations => "job_recommendations",
            AnalyticsKind::CandidateRecommendations => "candidate_recommendations",
        }
    }
}

#[async_trait::async_trait]
pub trait AnalyticsRecorder: Send + Sync {
    async fn record(
        &self,
        subject_id: Option<Uuid>,
        kind: AnalyticsKind,
        query: &str,
        filters: &str,
        result_count: usize,
    ) -> Result<()>;
}

/// Recorder that drops everything; the default for deployments where the
/// analytics pipeline is not wired up.
pub struct NoopAnalytics;

#[async_trait::async_trait]
impl AnalyticsRecorder for NoopAnalytics {
    async fn record(
        &self,
        _subject_id: Option<Uuid>,
        _kind: AnalyticsKind,
        _query: &str,
        _filters: &str,
        _result_count: usize,
    ) -> Result<()> {
        Ok(())
    }
}
