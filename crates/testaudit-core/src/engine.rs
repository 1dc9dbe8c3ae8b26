//! Central validity engine.
//!
//! Reads sessions through a [`SessionSource`], runs the aggregator, and
//! persists one assessment per completed session through an
//! [`AssessmentStore`]. Also serves reads, reports, administrator overrides,
//! and bounded-parallel batch recomputation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::aggregator::{evaluate_responses, Verdict};
use crate::assessment::ValidityAssessment;
use crate::error::ValidityError;
use crate::model::{QuestionId, SessionId, ValidityStatus};
use crate::overrides::{apply_override, OverrideRequest};
use crate::report::{build_report, ValidityReport, DEFAULT_TREND_TOLERANCE, TREND_LONG_DAYS};
use crate::traits::{AssessmentStore, SessionSource};

/// Configuration for the validity engine.
#[derive(Debug, Clone)]
pub struct ValidityEngineConfig {
    /// Maximum sessions analyzed concurrently in a batch.
    pub parallelism: usize,
    /// Rate difference below which the report trend counts as stable.
    pub trend_tolerance: f64,
}

impl Default for ValidityEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            trend_tolerance: DEFAULT_TREND_TOLERANCE,
        }
    }
}

/// Progress reporting trait for batch recomputation.
pub trait ProgressReporter: Send + Sync {
    fn on_session_start(&self, session_id: SessionId);
    fn on_session_complete(&self, assessment: &ValidityAssessment);
    fn on_session_error(&self, session_id: SessionId, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_session_start(&self, _: SessionId) {}
    fn on_session_complete(&self, _: &ValidityAssessment) {}
    fn on_session_error(&self, _: SessionId, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A session that failed during a batch run.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub session_id: SessionId,
    pub error: String,
    pub retryable: bool,
}

/// Outcome of a batch recomputation.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub assessments: Vec<ValidityAssessment>,
    pub failures: Vec<BatchFailure>,
    pub duration_ms: u64,
}

/// The central validity engine.
pub struct ValidityEngine {
    sessions: Arc<dyn SessionSource>,
    store: Arc<dyn AssessmentStore>,
    config: ValidityEngineConfig,
}

impl ValidityEngine {
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        store: Arc<dyn AssessmentStore>,
        config: ValidityEngineConfig,
    ) -> Self {
        Self {
            sessions,
            store,
            config,
        }
    }

    /// Compute and persist the validity assessment of a session.
    ///
    /// Without `force`, an existing assessment is returned unchanged. With
    /// `force`, the computed fields are replaced and override history is kept.
    /// Sessions that are not completed yield an unpersisted `incomplete`
    /// assessment.
    pub async fn compute_validity(
        &self,
        session_id: SessionId,
        force: bool,
    ) -> Result<ValidityAssessment, ValidityError> {
        if !force {
            if let Some(existing) = self.store.get(session_id).await? {
                tracing::debug!(session_id, "assessment already exists, skipping");
                return Ok(existing);
            }
        }

        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(ValidityError::SessionNotFound(session_id))?;

        let computed_at = Utc::now();

        if !session.is_completed() {
            tracing::info!(session_id, status = %session.status, "session not completed, reporting incomplete");
            return Ok(ValidityAssessment::from_verdict(
                session_id,
                Verdict::incomplete(),
                computed_at,
            ));
        }

        let responses = self.sessions.get_responses(session_id).await?;
        let question_ids: Vec<QuestionId> = responses
            .iter()
            .map(|r| r.question_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let questions: HashMap<_, _> = self
            .sessions
            .get_questions(&question_ids)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

        let verdict = evaluate_responses(session_id, &responses, &questions)?;

        let stored = match self.store.get(session_id).await? {
            Some(current) if force => {
                let next = current.recomputed(verdict, computed_at);
                self.store.compare_and_swap(current.version, next).await?
            }
            Some(current) => current,
            None => {
                let fresh = ValidityAssessment::from_verdict(session_id, verdict, computed_at);
                self.store.insert_if_absent(fresh).await?
            }
        };

        tracing::info!(
            session_id,
            status = %stored.overall_status,
            computed_status = %stored.computed_status,
            severity_score = stored.severity_score,
            flags = stored.flags.len(),
            force,
            "validity assessment stored"
        );
        Ok(stored)
    }

    /// Current assessment of a session.
    pub async fn get_validity(
        &self,
        session_id: SessionId,
    ) -> Result<ValidityAssessment, ValidityError> {
        self.store
            .get(session_id)
            .await?
            .ok_or(ValidityError::NotFound(session_id))
    }

    /// Aggregate report over the last `days` days.
    pub async fn get_validity_report(
        &self,
        days: u32,
        status_filter: Option<ValidityStatus>,
    ) -> Result<ValidityReport, ValidityError> {
        let now = Utc::now();
        let lookback = i64::from(days).max(TREND_LONG_DAYS);
        let assessments = self
            .store
            .list_since(now - chrono::Duration::days(lookback))
            .await?;
        Ok(build_report(
            &assessments,
            now,
            days,
            status_filter,
            self.config.trend_tolerance,
        ))
    }

    /// Override a session's status on behalf of an administrator.
    ///
    /// The request is validated before anything is read; the write is a
    /// compare-and-swap against the version that was read, so a concurrent
    /// override surfaces as a retryable conflict instead of being lost.
    pub async fn override_validity(
        &self,
        session_id: SessionId,
        new_status: ValidityStatus,
        reason: &str,
        admin_id: &str,
    ) -> Result<ValidityAssessment, ValidityError> {
        let request = OverrideRequest::new(new_status, reason, admin_id);
        request.validate()?;

        let current = self
            .store
            .get(session_id)
            .await?
            .ok_or(ValidityError::NotFound(session_id))?;
        let next = apply_override(&current, &request, Utc::now())?;
        let stored = self.store.compare_and_swap(current.version, next).await?;

        tracing::info!(
            session_id,
            admin_id,
            previous = ?stored.previous_status,
            status = %stored.overall_status,
            "validity status overridden"
        );
        Ok(stored)
    }

    /// Recompute many sessions with bounded parallelism.
    ///
    /// Failures are collected per session and never abort the batch.
    pub async fn compute_batch(
        &self,
        session_ids: &[SessionId],
        force: bool,
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for &session_id in session_ids {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        progress.on_session_start(session_id);
                        self.compute_validity(session_id, force).await
                    }
                    Err(_) => Err(ValidityError::Validation("semaphore closed".into())),
                };
                (session_id, result)
            });
        }

        let total = futures.len();
        let mut assessments = Vec::with_capacity(total);
        let mut failures = Vec::new();

        while let Some((session_id, result)) = futures.next().await {
            match result {
                Ok(assessment) => {
                    progress.on_session_complete(&assessment);
                    assessments.push(assessment);
                }
                Err(e) => {
                    tracing::error!("validity computation failed for session {session_id}: {e}");
                    progress.on_session_error(session_id, &e.to_string());
                    failures.push(BatchFailure {
                        session_id,
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, assessments.len(), failures.len(), elapsed);
        assessments.sort_by_key(|a| a.session_id);

        BatchOutcome {
            run_id,
            assessments,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    /// Recompute every completed session known to the session source.
    pub async fn compute_all_completed(
        &self,
        force: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchOutcome, ValidityError> {
        let ids = self.sessions.completed_session_ids().await?;
        Ok(self.compute_batch(&ids, force, progress).await)
    }
}
