//! Engine and storage error types.
//!
//! `StoreError` is defined here rather than in `testaudit-store` so the
//! engine can classify storage failures (retryable or not) without string
//! matching, whichever backend produced them.

use thiserror::Error;

use crate::model::{QuestionId, SessionId};

/// Errors returned by the validity engine.
///
/// Skipped computations (missing timing, zero responses, sessions still in
/// progress) are reported outcomes, not errors, and never appear here.
#[derive(Debug, Error)]
pub enum ValidityError {
    /// The session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// A response references a question the item bank does not know.
    #[error("session {session_id} references unknown question {question_id}")]
    UnknownQuestion {
        session_id: SessionId,
        question_id: QuestionId,
    },

    /// No assessment has been computed for the session yet.
    #[error("no validity assessment for session {0}")]
    NotFound(SessionId),

    /// The request was rejected before anything was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The storage layer failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ValidityError {
    /// Returns `true` if the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ValidityError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` for errors caused by malformed or missing input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ValidityError::SessionNotFound(_) | ValidityError::UnknownQuestion { .. }
        )
    }
}

/// Errors raised by assessment and session storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A compare-and-swap lost against a concurrent writer.
    #[error("version conflict for session {session_id}: expected {expected}, found {actual}")]
    VersionConflict {
        session_id: SessionId,
        expected: u64,
        actual: u64,
    },

    /// The row to update does not exist.
    #[error("no stored assessment for session {0}")]
    Missing(SessionId),

    /// The backend could not be reached or failed mid-operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` if retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Unavailable(_)
        )
    }
}
