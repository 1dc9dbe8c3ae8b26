//! Response-time analysis.
//!
//! Flags implausible per-item and whole-test timing. Responses without a
//! reported time are left out of the per-item checks; the whole-test checks
//! only run when every response carries a time, so a partial sum is never
//! mistaken for a fast test.

use serde::{Deserialize, Serialize};

use crate::flags::{FlagKind, ValidityFlag};
use crate::model::{DifficultyLevel, Severity};

pub const RAPID_RESPONSE_SECONDS: u32 = 3;
pub const RAPID_RESPONSE_MIN_COUNT: usize = 3;
pub const FAST_HARD_SECONDS: u32 = 10;
pub const FAST_HARD_MIN_COUNT: usize = 2;
pub const EXTENDED_PAUSE_SECONDS: u32 = 300;
pub const MIN_TOTAL_SECONDS: u64 = 300;
pub const MAX_TOTAL_SECONDS: u64 = 7200;

/// One response as seen by the timing analyzer.
#[derive(Debug, Clone, Copy)]
pub struct TimedItem {
    pub difficulty: DifficultyLevel,
    pub is_correct: bool,
    pub time_spent_seconds: Option<u32>,
}

/// Result of response-time analysis for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeAnalysis {
    pub total_responses: usize,
    /// Responses that carried a time.
    pub timed_responses: usize,
    /// Sum of response times, present only when every response was timed.
    pub total_time_seconds: Option<u64>,
    pub mean_time_seconds: Option<f64>,
    pub rapid_count: usize,
    pub fast_correct_hard_count: usize,
    pub flags: Vec<ValidityFlag>,
}

impl ResponseTimeAnalysis {
    pub fn has_complete_timing(&self) -> bool {
        self.total_responses > 0 && self.timed_responses == self.total_responses
    }
}

/// Analyze response timing. Every check is evaluated independently.
pub fn analyze_response_times(items: &[TimedItem]) -> ResponseTimeAnalysis {
    let times: Vec<u32> = items.iter().filter_map(|i| i.time_spent_seconds).collect();
    let timed_responses = times.len();

    let rapid_count = times
        .iter()
        .filter(|&&t| t < RAPID_RESPONSE_SECONDS)
        .count();

    let fast_correct_hard_count = items
        .iter()
        .filter(|i| i.is_correct && i.difficulty == DifficultyLevel::Hard)
        .filter(|i| matches!(i.time_spent_seconds, Some(t) if t < FAST_HARD_SECONDS))
        .count();

    let pauses: Vec<u32> = times
        .iter()
        .copied()
        .filter(|&t| t > EXTENDED_PAUSE_SECONDS)
        .collect();

    let timed_sum: u64 = times.iter().map(|&t| u64::from(t)).sum();
    let total_time_seconds =
        (!items.is_empty() && timed_responses == items.len()).then_some(timed_sum);
    let mean_time_seconds =
        (timed_responses > 0).then(|| timed_sum as f64 / timed_responses as f64);

    let mut flags = Vec::new();

    if rapid_count >= RAPID_RESPONSE_MIN_COUNT {
        flags.push(ValidityFlag::new(
            Severity::High,
            FlagKind::MultipleRapidResponses {
                rapid_count,
                threshold_seconds: RAPID_RESPONSE_SECONDS,
            },
        ));
    }

    if fast_correct_hard_count >= FAST_HARD_MIN_COUNT {
        flags.push(ValidityFlag::new(
            Severity::High,
            FlagKind::SuspiciouslyFastOnHard {
                fast_correct_hard_count,
                threshold_seconds: FAST_HARD_SECONDS,
            },
        ));
    }

    if let Some(&longest) = pauses.iter().max() {
        flags.push(ValidityFlag::new(
            Severity::Medium,
            FlagKind::ExtendedPauses {
                pause_count: pauses.len(),
                longest_seconds: longest,
                threshold_seconds: EXTENDED_PAUSE_SECONDS,
            },
        ));
    }

    match total_time_seconds {
        Some(total) if total < MIN_TOTAL_SECONDS => {
            flags.push(ValidityFlag::new(
                Severity::High,
                FlagKind::TotalTimeTooFast {
                    total_time_seconds: total,
                    threshold_seconds: MIN_TOTAL_SECONDS,
                },
            ));
        }
        Some(total) if total > MAX_TOTAL_SECONDS => {
            flags.push(ValidityFlag::new(
                Severity::Medium,
                FlagKind::TotalTimeExcessive {
                    total_time_seconds: total,
                    threshold_seconds: MAX_TOTAL_SECONDS,
                },
            ));
        }
        Some(_) => {}
        None => {
            if timed_responses < items.len() {
                tracing::debug!(
                    missing = items.len() - timed_responses,
                    "skipping total-time checks: incomplete timing data"
                );
            }
        }
    }

    tracing::debug!(
        timed_responses,
        rapid_count,
        fast_correct_hard_count,
        flags = flags.len(),
        "response-time analysis"
    );

    ResponseTimeAnalysis {
        total_responses: items.len(),
        timed_responses,
        total_time_seconds,
        mean_time_seconds,
        rapid_count,
        fast_correct_hard_count,
        flags,
    }
}
