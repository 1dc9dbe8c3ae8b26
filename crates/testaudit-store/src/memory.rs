//! In-memory session source and assessment store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use testaudit_core::assessment::ValidityAssessment;
use testaudit_core::error::StoreError;
use testaudit_core::model::{Question, QuestionId, Response, SessionId, TestSession};
use testaudit_core::traits::{AssessmentStore, SessionSource};

use crate::dataset::Dataset;

/// Keeps sessions, questions and assessments in maps.
///
/// Assessment writes are serialized by a single lock, which makes
/// `insert_if_absent` and `compare_and_swap` atomic per session.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, TestSession>>,
    questions: RwLock<HashMap<QuestionId, Question>>,
    assessments: Mutex<HashMap<SessionId, ValidityAssessment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a dataset. Later duplicates replace earlier ones.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            sessions: RwLock::new(dataset.sessions.into_iter().map(|s| (s.id, s)).collect()),
            questions: RwLock::new(dataset.questions.into_iter().map(|q| (q.id, q)).collect()),
            assessments: Mutex::new(HashMap::new()),
        }
    }

    /// Seed previously stored assessments, keeping their versions.
    pub async fn load_assessments(&self, rows: Vec<ValidityAssessment>) {
        let mut assessments = self.assessments.lock().await;
        for row in rows {
            assessments.insert(row.session_id, row);
        }
    }

    /// Put back a row as it was before a write, or drop it if there was none.
    pub(crate) async fn restore(&self, session_id: SessionId, row: Option<ValidityAssessment>) {
        let mut assessments = self.assessments.lock().await;
        match row {
            Some(row) => assessments.insert(session_id, row),
            None => assessments.remove(&session_id),
        };
    }

    /// All stored assessments ordered by session id.
    pub async fn snapshot(&self) -> Vec<ValidityAssessment> {
        let mut rows: Vec<_> = self.assessments.lock().await.values().cloned().collect();
        rows.sort_by_key(|a| a.session_id);
        rows
    }
}

#[async_trait]
impl SessionSource for MemoryStore {
    async fn get_session(&self, session_id: SessionId) -> Result<Option<TestSession>, StoreError> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn get_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&session_id)
            .map(|s| s.responses.clone())
            .unwrap_or_default())
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StoreError> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn completed_session_ids(&self) -> Result<Vec<SessionId>, StoreError> {
        let mut ids: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_completed())
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get(&self, session_id: SessionId) -> Result<Option<ValidityAssessment>, StoreError> {
        Ok(self.assessments.lock().await.get(&session_id).cloned())
    }

    async fn insert_if_absent(
        &self,
        mut assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError> {
        let mut rows = self.assessments.lock().await;
        if let Some(existing) = rows.get(&assessment.session_id) {
            tracing::debug!(
                session_id = assessment.session_id,
                "assessment already present, keeping existing row"
            );
            return Ok(existing.clone());
        }
        assessment.version = 1;
        rows.insert(assessment.session_id, assessment.clone());
        Ok(assessment)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        mut assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError> {
        let session_id = assessment.session_id;
        let mut rows = self.assessments.lock().await;
        let current = rows.get(&session_id).ok_or(StoreError::Missing(session_id))?;
        if current.version != expected_version {
            tracing::warn!(
                session_id,
                expected = expected_version,
                actual = current.version,
                "assessment version conflict"
            );
            return Err(StoreError::VersionConflict {
                session_id,
                expected: expected_version,
                actual: current.version,
            });
        }
        assessment.version = expected_version + 1;
        rows.insert(session_id, assessment.clone());
        Ok(assessment)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValidityAssessment>, StoreError> {
        let mut rows: Vec<_> = self
            .assessments
            .lock()
            .await
            .values()
            .filter(|a| a.computed_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.session_id);
        Ok(rows)
    }
}
