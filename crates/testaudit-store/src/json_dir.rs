//! Assessment storage backed by a directory of JSON files.
//!
//! The directory holds a dataset (`sessions.json`, `questions.json`) and the
//! stored assessments (`assessments.json`). The assessments file is rewritten
//! after every successful write so separate CLI invocations share state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use testaudit_core::assessment::ValidityAssessment;
use testaudit_core::error::StoreError;
use testaudit_core::model::{Question, QuestionId, Response, SessionId, TestSession};
use testaudit_core::traits::{AssessmentStore, SessionSource};

use crate::dataset::{read_json, Dataset};
use crate::memory::MemoryStore;

pub const ASSESSMENTS_FILE: &str = "assessments.json";

pub struct JsonDirStore {
    dir: PathBuf,
    inner: MemoryStore,
    /// Held across a write and the file rewrite that follows it.
    persist: Mutex<()>,
}

impl JsonDirStore {
    /// Open a data directory. A missing `assessments.json` means no assessments yet.
    pub async fn open(dir: &Path) -> Result<Self> {
        let dataset = Dataset::load_dir(dir)
            .with_context(|| format!("failed to load dataset from {}", dir.display()))?;
        let inner = MemoryStore::from_dataset(dataset);

        let path = dir.join(ASSESSMENTS_FILE);
        if path.exists() {
            let rows: Vec<ValidityAssessment> = read_json(&path)?;
            tracing::debug!("loaded {} assessments from {}", rows.len(), path.display());
            inner.load_assessments(rows).await;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            inner,
            persist: Mutex::new(()),
        })
    }

    /// All stored assessments ordered by session id.
    pub async fn assessments(&self) -> Vec<ValidityAssessment> {
        self.inner.snapshot().await
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let rows = self.inner.snapshot().await;
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.dir.join(ASSESSMENTS_FILE);
        let tmp = self.dir.join(format!("{ASSESSMENTS_FILE}.tmp"));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Write the file; on failure put the in-memory row back to `previous`.
    async fn persist_or_restore(
        &self,
        session_id: SessionId,
        previous: Option<ValidityAssessment>,
    ) -> Result<(), StoreError> {
        if let Err(e) = self.persist().await {
            tracing::warn!(session_id, "failed to persist assessments, rolling back: {e}");
            self.inner.restore(session_id, previous).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionSource for JsonDirStore {
    async fn get_session(&self, session_id: SessionId) -> Result<Option<TestSession>, StoreError> {
        self.inner.get_session(session_id).await
    }

    async fn get_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StoreError> {
        self.inner.get_responses(session_id).await
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StoreError> {
        self.inner.get_questions(ids).await
    }

    async fn completed_session_ids(&self) -> Result<Vec<SessionId>, StoreError> {
        self.inner.completed_session_ids().await
    }
}

#[async_trait]
impl AssessmentStore for JsonDirStore {
    async fn get(&self, session_id: SessionId) -> Result<Option<ValidityAssessment>, StoreError> {
        self.inner.get(session_id).await
    }

    async fn insert_if_absent(
        &self,
        assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError> {
        let _guard = self.persist.lock().await;
        if let Some(existing) = self.inner.get(assessment.session_id).await? {
            return Ok(existing);
        }
        let stored = self.inner.insert_if_absent(assessment).await?;
        self.persist_or_restore(stored.session_id, None).await?;
        Ok(stored)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        assessment: ValidityAssessment,
    ) -> Result<ValidityAssessment, StoreError> {
        let _guard = self.persist.lock().await;
        let previous = self.inner.get(assessment.session_id).await?;
        let stored = self.inner.compare_and_swap(expected_version, assessment).await?;
        self.persist_or_restore(stored.session_id, previous).await?;
        Ok(stored)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValidityAssessment>, StoreError> {
        self.inner.list_since(since).await
    }
}
