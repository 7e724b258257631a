/// Failure taxonomy shared across the engine crates.
///
/// `Validation` and `NotFound` are surfaced to the client and never retried.
/// `Conflict` covers lost hold races, version mismatches and illegal state
/// transitions; the client may retry, the engine never does. `Inconsistency`
/// marks provider data that violates a schedule invariant and is rejected at
/// write time.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("schedule inconsistency: {0}")]
    Inconsistency(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(entity: &str) -> Self {
        EngineError::NotFound(entity.to_string())
    }
}
