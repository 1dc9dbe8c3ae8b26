//! Validity flags raised by the analyzers.
//!
//! Each flag type carries its own typed payload so the aggregator can match
//! exhaustively on what was raised. Serialized as
//! `{"severity": "...", "flag_type": "...", <payload fields>}`.

use serde::{Deserialize, Serialize};

use crate::model::Severity;

/// A single raised validity flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityFlag {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: FlagKind,
}

/// Flag type plus its details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag_type", rename_all = "snake_case")]
pub enum FlagKind {
    /// Correctness pattern disagrees with the taker's performance tier.
    AberrantResponsePattern {
        fit_ratio: f64,
        unexpected_count: usize,
        total_responses: usize,
        threshold: f64,
    },
    /// Several answers given faster than a plausible reading time.
    MultipleRapidResponses {
        rapid_count: usize,
        threshold_seconds: u32,
    },
    /// Hard items answered correctly implausibly fast.
    SuspiciouslyFastOnHard {
        fast_correct_hard_count: usize,
        threshold_seconds: u32,
    },
    /// At least one very long pause on a single item.
    ExtendedPauses {
        pause_count: usize,
        longest_seconds: u32,
        threshold_seconds: u32,
    },
    /// Whole test finished in too little time.
    TotalTimeTooFast {
        total_time_seconds: u64,
        threshold_seconds: u64,
    },
    /// Whole test took an excessive amount of time.
    TotalTimeExcessive {
        total_time_seconds: u64,
        threshold_seconds: u64,
    },
    /// Guttman error rate above the aberrant threshold.
    HighErrorsAberrant {
        error_count: usize,
        error_rate: f64,
        threshold: f64,
    },
    /// Guttman error rate above the elevated threshold.
    ElevatedErrors {
        error_count: usize,
        error_rate: f64,
        threshold: f64,
    },
}

impl FlagKind {
    /// Wire name of the flag type.
    pub fn flag_type(&self) -> &'static str {
        match self {
            FlagKind::AberrantResponsePattern { .. } => "aberrant_response_pattern",
            FlagKind::MultipleRapidResponses { .. } => "multiple_rapid_responses",
            FlagKind::SuspiciouslyFastOnHard { .. } => "suspiciously_fast_on_hard",
            FlagKind::ExtendedPauses { .. } => "extended_pauses",
            FlagKind::TotalTimeTooFast { .. } => "total_time_too_fast",
            FlagKind::TotalTimeExcessive { .. } => "total_time_excessive",
            FlagKind::HighErrorsAberrant { .. } => "high_errors_aberrant",
            FlagKind::ElevatedErrors { .. } => "elevated_errors",
        }
    }
}

impl ValidityFlag {
    pub fn new(severity: Severity, kind: FlagKind) -> Self {
        Self { severity, kind }
    }

    pub fn flag_type(&self) -> &'static str {
        self.kind.flag_type()
    }

    /// Points this flag contributes to a session's severity score.
    ///
    /// Person-fit and Guttman flags have fixed weights. Response-time flags
    /// are weighted by severity: each High flag adds 2, Medium adds nothing.
    pub fn severity_points(&self) -> u32 {
        match &self.kind {
            FlagKind::AberrantResponsePattern { .. } => 2,
            FlagKind::HighErrorsAberrant { .. } => 2,
            FlagKind::ElevatedErrors { .. } => 1,
            FlagKind::MultipleRapidResponses { .. }
            | FlagKind::SuspiciouslyFastOnHard { .. }
            | FlagKind::ExtendedPauses { .. }
            | FlagKind::TotalTimeTooFast { .. }
            | FlagKind::TotalTimeExcessive { .. } => match self.severity {
                Severity::High => 2,
                Severity::Medium | Severity::Low | Severity::None => 0,
            },
        }
    }
}
