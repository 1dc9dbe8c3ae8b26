//! Combines the three analyzers into one verdict.
//!
//! Each analyzer sees the same responses and none depends on another, so
//! their order is irrelevant. Severity points are summed across every raised
//! flag; the sum decides the status and the confidence value.

use std::collections::HashMap;

use crate::assessment::AnalysisBreakdown;
use crate::difficulty::resolve_p_value;
use crate::error::ValidityError;
use crate::flags::ValidityFlag;
use crate::guttman::{analyze_guttman, GuttmanItem};
use crate::model::{Question, QuestionId, Response, SessionId, TestSession, ValidityStatus};
use crate::person_fit::{analyze_person_fit, FitItem};
use crate::response_time::{analyze_response_times, TimedItem};

/// Severity score at or above which a session is invalid.
pub const INVALID_SEVERITY: u32 = 4;
/// Severity score at or above which a session is suspect.
pub const SUSPECT_SEVERITY: u32 = 2;
/// Confidence lost per severity point.
pub const CONFIDENCE_PENALTY: f64 = 0.15;

/// Outcome of aggregating the analyzers over one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: ValidityStatus,
    pub severity_score: u32,
    pub confidence_score: f64,
    pub flags: Vec<ValidityFlag>,
    pub analysis: AnalysisBreakdown,
}

impl Verdict {
    /// Verdict for a session that cannot be assessed yet.
    pub fn incomplete() -> Self {
        Self {
            status: ValidityStatus::Incomplete,
            severity_score: 0,
            confidence_score: confidence_for_severity(0),
            flags: Vec::new(),
            analysis: AnalysisBreakdown::default(),
        }
    }
}

pub fn status_for_severity(severity_score: u32) -> ValidityStatus {
    if severity_score >= INVALID_SEVERITY {
        ValidityStatus::Invalid
    } else if severity_score >= SUSPECT_SEVERITY {
        ValidityStatus::Suspect
    } else {
        ValidityStatus::Valid
    }
}

pub fn confidence_for_severity(severity_score: u32) -> f64 {
    (1.0 - f64::from(severity_score) * CONFIDENCE_PENALTY).max(0.0)
}

/// Sum of severity points over all flags.
pub fn severity_score(flags: &[ValidityFlag]) -> u32 {
    flags.iter().map(ValidityFlag::severity_points).sum()
}

/// Evaluate a session against its questions.
///
/// Sessions that are not completed short-circuit to `incomplete`. Every
/// response must reference a known question.
pub fn evaluate_session(
    session: &TestSession,
    questions: &HashMap<QuestionId, Question>,
) -> Result<Verdict, ValidityError> {
    if !session.is_completed() {
        tracing::debug!(session_id = session.id, status = %session.status, "session not assessable");
        return Ok(Verdict::incomplete());
    }
    evaluate_responses(session.id, &session.responses, questions)
}

/// Evaluate an ordered list of responses.
///
/// An empty list is `valid` with severity 0: absence of evidence is not
/// evidence of invalidity.
pub fn evaluate_responses(
    session_id: SessionId,
    responses: &[Response],
    questions: &HashMap<QuestionId, Question>,
) -> Result<Verdict, ValidityError> {
    let mut fit_items = Vec::with_capacity(responses.len());
    let mut timed_items = Vec::with_capacity(responses.len());
    let mut guttman_items = Vec::with_capacity(responses.len());

    for response in responses {
        let question =
            questions
                .get(&response.question_id)
                .ok_or(ValidityError::UnknownQuestion {
                    session_id,
                    question_id: response.question_id,
                })?;

        fit_items.push(FitItem {
            difficulty: question.difficulty_level,
            is_correct: response.is_correct,
        });
        timed_items.push(TimedItem {
            difficulty: question.difficulty_level,
            is_correct: response.is_correct,
            time_spent_seconds: response.time_spent_seconds,
        });
        guttman_items.push(GuttmanItem {
            p_value: resolve_p_value(question),
            is_correct: response.is_correct,
        });
    }

    if responses.is_empty() {
        return Ok(Verdict {
            status: ValidityStatus::Valid,
            severity_score: 0,
            confidence_score: confidence_for_severity(0),
            flags: Vec::new(),
            analysis: AnalysisBreakdown::default(),
        });
    }

    let analysis = AnalysisBreakdown {
        person_fit: analyze_person_fit(&fit_items),
        response_time: Some(analyze_response_times(&timed_items)),
        guttman: analyze_guttman(&guttman_items),
    };

    let flags = analysis.merged_flags();
    let score = severity_score(&flags);
    let status = status_for_severity(score);

    tracing::debug!(
        session_id,
        responses = responses.len(),
        flags = flags.len(),
        severity_score = score,
        %status,
        "aggregated validity verdict"
    );

    Ok(Verdict {
        status,
        severity_score: score,
        confidence_score: confidence_for_severity(score),
        flags,
        analysis,
    })
}
