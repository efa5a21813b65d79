use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced to the API layer.
///
/// Repository read failures and analytics/cache hiccups are recovered
/// internally (logged, degraded to empty results) and never reach here;
/// the only condition the caller must branch on is an authorization denial,
/// which maps to a 403-equivalent without a stack unwind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("access denied: {0}")]
    AccessDenied(String),
}
