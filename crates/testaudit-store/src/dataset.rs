//! Session and question datasets stored as JSON files.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use testaudit_core::model::{
    DifficultyLevel, Question, QuestionId, Response, SessionId, SessionStatus, TestSession,
};

pub const SESSIONS_FILE: &str = "sessions.json";
pub const QUESTIONS_FILE: &str = "questions.json";

/// Sessions with their responses, plus the item bank they reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub sessions: Vec<TestSession>,
    pub questions: Vec<Question>,
}

/// A problem found in a dataset. None of these stop analysis on their own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetWarning {
    #[error("session {0} appears more than once")]
    DuplicateSession(SessionId),

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("session {session_id} references unknown question {question_id}")]
    UnknownQuestion {
        session_id: SessionId,
        question_id: QuestionId,
    },

    #[error("session {0} is completed but has no completed_at")]
    MissingCompletedAt(SessionId),

    #[error("question {question_id} has p-value {p_value} outside [0, 1]")]
    PValueOutOfRange { question_id: QuestionId, p_value: f64 },
}

impl Dataset {
    /// Load `sessions.json` and `questions.json` from a directory.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            sessions: read_json(&dir.join(SESSIONS_FILE))?,
            questions: read_json(&dir.join(QUESTIONS_FILE))?,
        })
    }

    /// Write the dataset files into a directory, creating it if needed.
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        write_json(&dir.join(SESSIONS_FILE), &self.sessions)?;
        write_json(&dir.join(QUESTIONS_FILE), &self.questions)?;
        Ok(())
    }

    /// Check the dataset for inconsistencies.
    pub fn validate(&self) -> Vec<DatasetWarning> {
        let mut warnings = Vec::new();

        let mut question_ids = HashSet::new();
        for q in &self.questions {
            if !question_ids.insert(q.id) {
                warnings.push(DatasetWarning::DuplicateQuestion(q.id));
            }
            if let Some(p) = q.empirical_p_value {
                if !(0.0..=1.0).contains(&p) {
                    warnings.push(DatasetWarning::PValueOutOfRange {
                        question_id: q.id,
                        p_value: p,
                    });
                }
            }
        }

        let mut session_ids = HashSet::new();
        for s in &self.sessions {
            if !session_ids.insert(s.id) {
                warnings.push(DatasetWarning::DuplicateSession(s.id));
            }
            if s.is_completed() && s.completed_at.is_none() {
                warnings.push(DatasetWarning::MissingCompletedAt(s.id));
            }
            let mut reported = HashSet::new();
            for r in &s.responses {
                if !question_ids.contains(&r.question_id) && reported.insert(r.question_id) {
                    warnings.push(DatasetWarning::UnknownQuestion {
                        session_id: s.id,
                        question_id: r.question_id,
                    });
                }
            }
        }

        warnings
    }

    /// Count of sessions per status.
    pub fn status_counts(&self) -> HashMap<SessionStatus, usize> {
        let mut counts = HashMap::new();
        for s in &self.sessions {
            *counts.entry(s.status).or_insert(0) += 1;
        }
        counts
    }

    /// A small dataset covering each validity outcome, written by `testaudit init`.
    ///
    /// Session 1 is an honest attempt, 2 a rapid guesser, 3 an honest pattern
    /// finished too fast, 4 an aberrant pattern, 5 still in progress.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let bank: [(QuestionId, DifficultyLevel, f64); 12] = [
            (1, DifficultyLevel::Easy, 0.85),
            (2, DifficultyLevel::Easy, 0.80),
            (3, DifficultyLevel::Easy, 0.78),
            (4, DifficultyLevel::Easy, 0.72),
            (5, DifficultyLevel::Medium, 0.55),
            (6, DifficultyLevel::Medium, 0.50),
            (7, DifficultyLevel::Medium, 0.48),
            (8, DifficultyLevel::Medium, 0.45),
            (9, DifficultyLevel::Hard, 0.30),
            (10, DifficultyLevel::Hard, 0.25),
            (11, DifficultyLevel::Hard, 0.22),
            (12, DifficultyLevel::Hard, 0.18),
        ];
        let questions = bank
            .iter()
            .map(|&(id, difficulty_level, p)| Question {
                id,
                difficulty_level,
                empirical_p_value: Some(p),
                question_type: "pattern".into(),
            })
            .collect();

        let honest = [
            true, true, true, true, true, true, true, false, true, false, false, false,
        ];
        let honest_times = [45, 45, 45, 45, 70, 70, 70, 70, 90, 90, 90, 90];
        let guesser = [
            true, true, false, false, true, false, false, false, true, true, false, false,
        ];
        let aberrant = [
            false, false, false, false, false, false, false, false, true, true, true, true,
        ];

        let started = now - Duration::hours(2);
        let session = |id: SessionId, status: SessionStatus, correct: &[bool], times: &[u32]| {
            let mut at = started;
            let responses = correct
                .iter()
                .zip(times)
                .enumerate()
                .map(|(i, (&is_correct, &secs))| {
                    at += Duration::seconds(i64::from(secs));
                    Response {
                        question_id: i as QuestionId + 1,
                        is_correct,
                        time_spent_seconds: Some(secs),
                        answered_at: at,
                    }
                })
                .collect::<Vec<_>>();
            TestSession {
                id,
                user_id: Some(1000 + id),
                status,
                started_at: started,
                completed_at: (status == SessionStatus::Completed).then_some(at),
                responses,
            }
        };

        Self {
            sessions: vec![
                session(1, SessionStatus::Completed, &honest, &honest_times),
                session(2, SessionStatus::Completed, &guesser, &[2; 12]),
                session(3, SessionStatus::Completed, &honest, &[20; 12]),
                session(4, SessionStatus::Completed, &aberrant, &[60; 12]),
                session(5, SessionStatus::InProgress, &honest[..4], &honest_times[..4]),
            ],
            questions,
        }
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
