//! Storage seams consumed by the validity engine.
//!
//! Sessions and questions are read from the product's persistence layer;
//! assessments are written through an [`AssessmentStore`] that serializes
//! writes per session. Both are implemented by the `testaudit-store` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::assessment::ValidityAssessment;
use crate::error::StoreError;
use crate::model::{Question, QuestionId, Response, SessionId, TestSession};

// ---------------------------------------------------------------------------
// Session source
// ---------------------------------------------------------------------------

/// Read-only access to sessions, their responses, and the item bank.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetch a session's status and timestamps.
    async fn get_session(&self, session_id: SessionId) -> Result<Option<TestSession>, StoreError>;

    /// Fetch a session's responses in presentation order.
    async fn get_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StoreError>;

    /// Fetch the given questions. Unknown ids are simply absent from the result.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StoreError>;

    /// Ids of all completed sessions, for batch recomputation.
    async fn completed_session_ids(&self) -> Result<Vec<SessionId>, StoreError>;
}

// ---------------------------------------------------------------------------
// Assessment store
// ---------------------------------------------------------------------------

/// Single-row-per-session assessment storage.
///
/// Implementations must make `insert_if_absent` and `compare_and_swap`
/// atomic per `session_id`, and bump `version` on every successful write.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Current assessment of a session, if any.
    async fn get(&self, session_id: SessionId) -> Result<Option<ValidityAssessment>, StoreError>;

    /// Insert the assessment unless one already exists.
    ///
    /// Returns the row that is current after the call: the new one, or the
    /// existing one when another writer got there first.
    async fn insert_if_absent(
        &self,
        assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError>;

    /// Replace the current row if its version still equals `expected_version`.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError>;

    /// All assessments computed at or after `since`.
    async fn list_since(&self, since: DateTime<Utc>)
        -> Result<Vec<ValidityAssessment>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_source_is_object_safe() {
        fn _takes_boxed(_: Box<dyn SessionSource>) {}
    }

    #[test]
    fn assessment_store_is_object_safe() {
        fn _takes_boxed(_: Box<dyn AssessmentStore>) {}
    }
}
