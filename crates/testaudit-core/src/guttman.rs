//! Guttman error analysis.
//!
//! A Guttman error is a pair of items where the harder one was answered
//! correctly and the easier one incorrectly. Honest responding produces few
//! such pairs; answers copied from an outside source tend to produce many.

use serde::{Deserialize, Serialize};

use crate::flags::{FlagKind, ValidityFlag};
use crate::model::Severity;

pub const HIGH_ERROR_RATE: f64 = 0.30;
pub const ELEVATED_ERROR_RATE: f64 = 0.20;
pub const SHORT_TEST_HIGH_ERROR_RATE: f64 = 0.45;
pub const SHORT_TEST_ELEVATED_ERROR_RATE: f64 = 0.30;
/// Tests with fewer items than this use the short-test thresholds.
pub const SHORT_TEST_ITEMS: usize = 5;

/// One response as seen by the Guttman analyzer.
#[derive(Debug, Clone, Copy)]
pub struct GuttmanItem {
    /// Resolved p-value; lower is harder.
    pub p_value: f64,
    pub is_correct: bool,
}

/// How the session's error rate compares to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuttmanClassification {
    Normal,
    ElevatedErrors,
    HighErrorsAberrant,
}

/// Result of Guttman analysis for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuttmanAnalysis {
    pub total_responses: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub error_count: usize,
    /// Errors over the maximum possible, always in `[0, 1]`.
    pub error_rate: f64,
    pub classification: GuttmanClassification,
    pub flag: Option<ValidityFlag>,
}

/// Count Guttman error pairs.
///
/// Items are sorted hardest first; for each incorrect item, every correct item
/// strictly harder than it is an error. Ties in difficulty never count.
pub fn count_guttman_errors(items: &[GuttmanItem]) -> usize {
    let mut sorted: Vec<GuttmanItem> = items.to_vec();
    sorted.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));

    let mut errors = 0;
    // correct items seen in strictly harder difficulty groups
    let mut correct_harder = 0;
    let mut idx = 0;
    while idx < sorted.len() {
        let p = sorted[idx].p_value;
        let group_end = sorted[idx..]
            .iter()
            .position(|item| item.p_value != p)
            .map_or(sorted.len(), |offset| idx + offset);
        let group = &sorted[idx..group_end];

        let group_incorrect = group.iter().filter(|item| !item.is_correct).count();
        errors += group_incorrect * correct_harder;
        correct_harder += group.len() - group_incorrect;
        idx = group_end;
    }
    errors
}

/// Analyze a session's responses. Returns `None` for an empty session.
pub fn analyze_guttman(items: &[GuttmanItem]) -> Option<GuttmanAnalysis> {
    let total = items.len();
    if total == 0 {
        return None;
    }

    let correct_count = items.iter().filter(|i| i.is_correct).count();
    let incorrect_count = total - correct_count;
    let error_count = count_guttman_errors(items);

    let max_errors = correct_count * incorrect_count;
    let error_rate = if max_errors == 0 {
        0.0
    } else {
        error_count as f64 / max_errors as f64
    };

    let (high, elevated) = if total < SHORT_TEST_ITEMS {
        (SHORT_TEST_HIGH_ERROR_RATE, SHORT_TEST_ELEVATED_ERROR_RATE)
    } else {
        (HIGH_ERROR_RATE, ELEVATED_ERROR_RATE)
    };

    let (classification, flag) = if error_rate > high {
        (
            GuttmanClassification::HighErrorsAberrant,
            Some(ValidityFlag::new(
                Severity::High,
                FlagKind::HighErrorsAberrant {
                    error_count,
                    error_rate,
                    threshold: high,
                },
            )),
        )
    } else if error_rate > elevated {
        (
            GuttmanClassification::ElevatedErrors,
            Some(ValidityFlag::new(
                Severity::Medium,
                FlagKind::ElevatedErrors {
                    error_count,
                    error_rate,
                    threshold: elevated,
                },
            )),
        )
    } else {
        (GuttmanClassification::Normal, None)
    };

    tracing::debug!(
        total,
        error_count,
        error_rate,
        ?classification,
        "guttman analysis"
    );

    Some(GuttmanAnalysis {
        total_responses: total,
        correct_count,
        incorrect_count,
        error_count,
        error_rate,
        classification,
        flag,
    })
}
