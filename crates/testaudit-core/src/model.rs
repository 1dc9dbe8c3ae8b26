//! Core data model types for testaudit.
//!
//! Sessions, responses, and questions are owned by the surrounding product;
//! the engine only reads them. Statuses and severities are shared by every
//! analyzer and by the persisted assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a test session.
pub type SessionId = i64;

/// Identifier of a question.
pub type QuestionId = i64;

/// Categorical difficulty assigned to a question by the item bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Easy => write!(f, "easy"),
            DifficultyLevel::Medium => write!(f, "medium"),
            DifficultyLevel::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" => Ok(DifficultyLevel::Medium),
            "hard" => Ok(DifficultyLevel::Hard),
            other => Err(format!("unknown difficulty level: {other}")),
        }
    }
}

/// A question from the item bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question identifier.
    pub id: QuestionId,
    /// Difficulty category assigned at generation time.
    pub difficulty_level: DifficultyLevel,
    /// Historical proportion of test-takers who answered correctly.
    #[serde(default)]
    pub empirical_p_value: Option<f64>,
    /// Item family (pattern, logic, spatial, ...).
    #[serde(default)]
    pub question_type: String,
}

/// A single answered item within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub question_id: QuestionId,
    pub is_correct: bool,
    /// Seconds spent on the item, when the client reported it.
    #[serde(default)]
    pub time_spent_seconds: Option<u32>,
    pub answered_at: DateTime<Utc>,
}

/// Lifecycle state of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// A test session. Responses are kept in presentation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    pub id: SessionId,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl TestSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Validity classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidityStatus {
    Valid,
    Suspect,
    Invalid,
    Incomplete,
}

impl ValidityStatus {
    /// Statuses an administrator may assign through an override.
    pub fn is_overridable_target(self) -> bool {
        !matches!(self, ValidityStatus::Incomplete)
    }

    /// Suspect and invalid sessions need human review.
    pub fn needs_review(self) -> bool {
        matches!(self, ValidityStatus::Suspect | ValidityStatus::Invalid)
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityStatus::Valid => write!(f, "valid"),
            ValidityStatus::Suspect => write!(f, "suspect"),
            ValidityStatus::Invalid => write!(f, "invalid"),
            ValidityStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl FromStr for ValidityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(ValidityStatus::Valid),
            "suspect" => Ok(ValidityStatus::Suspect),
            "invalid" => Ok(ValidityStatus::Invalid),
            "incomplete" => Ok(ValidityStatus::Incomplete),
            other => Err(format!("unknown validity status: {other}")),
        }
    }
}

/// Severity attached to a raised flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}
