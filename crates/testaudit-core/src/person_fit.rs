//! Person-fit analysis.
//!
//! Compares each response against the outcome expected for the taker's
//! performance tier on an item of that difficulty. A high share of
//! unexpected outcomes suggests the pattern was not produced by a single
//! consistent ability level.

use serde::{Deserialize, Serialize};

use crate::flags::{FlagKind, ValidityFlag};
use crate::model::{DifficultyLevel, Severity};

/// Fit ratio at or above which the pattern is flagged.
pub const FIT_RATIO_THRESHOLD: f64 = 0.25;
/// Looser threshold for short tests, where natural variance is higher.
pub const SHORT_TEST_FIT_RATIO_THRESHOLD: f64 = 0.40;
/// Tests with fewer responses than this use the short-test threshold.
pub const SHORT_TEST_ITEMS: usize = 5;

/// Performance tier derived from overall accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    High,
    Medium,
    Low,
}

impl PerformanceTier {
    /// `high` above 70% correct, `low` below 40%, `medium` in between
    /// (both bounds inclusive).
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy > 0.70 {
            PerformanceTier::High
        } else if accuracy >= 0.40 {
            PerformanceTier::Medium
        } else {
            PerformanceTier::Low
        }
    }

    /// Outcome expected from this tier on an item of the given difficulty.
    pub fn expectation(self, difficulty: DifficultyLevel) -> Expect {
        use DifficultyLevel::*;
        match (self, difficulty) {
            (PerformanceTier::High, Easy | Medium) => Expect::Correct,
            (PerformanceTier::High, Hard) => Expect::Either,
            (PerformanceTier::Medium, Easy) => Expect::Correct,
            (PerformanceTier::Medium, Medium | Hard) => Expect::Either,
            (PerformanceTier::Low, Easy) => Expect::Either,
            (PerformanceTier::Low, Medium | Hard) => Expect::Incorrect,
        }
    }
}

/// Expected outcome of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Correct,
    Incorrect,
    /// No expectation; neither outcome is surprising.
    Either,
}

impl Expect {
    pub fn is_unexpected(self, is_correct: bool) -> bool {
        match self {
            Expect::Correct => !is_correct,
            Expect::Incorrect => is_correct,
            Expect::Either => false,
        }
    }
}

/// One scored item as seen by the person-fit analyzer.
#[derive(Debug, Clone, Copy)]
pub struct FitItem {
    pub difficulty: DifficultyLevel,
    pub is_correct: bool,
}

/// Result of person-fit analysis for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFitAnalysis {
    pub total_responses: usize,
    pub correct_count: usize,
    pub accuracy: f64,
    pub tier: PerformanceTier,
    pub unexpected_count: usize,
    pub fit_ratio: f64,
    pub threshold: f64,
    pub flag: Option<ValidityFlag>,
}

impl PersonFitAnalysis {
    pub fn is_aberrant(&self) -> bool {
        self.flag.is_some()
    }
}

/// Analyze a session's responses. Returns `None` for an empty session.
pub fn analyze_person_fit(items: &[FitItem]) -> Option<PersonFitAnalysis> {
    let total = items.len();
    if total == 0 {
        return None;
    }

    let correct_count = items.iter().filter(|i| i.is_correct).count();
    let accuracy = correct_count as f64 / total as f64;
    let tier = PerformanceTier::from_accuracy(accuracy);

    let unexpected_count = items
        .iter()
        .filter(|i| tier.expectation(i.difficulty).is_unexpected(i.is_correct))
        .count();
    let fit_ratio = unexpected_count as f64 / total as f64;

    let threshold = if total < SHORT_TEST_ITEMS {
        SHORT_TEST_FIT_RATIO_THRESHOLD
    } else {
        FIT_RATIO_THRESHOLD
    };

    let flag = (fit_ratio >= threshold).then(|| {
        ValidityFlag::new(
            Severity::High,
            FlagKind::AberrantResponsePattern {
                fit_ratio,
                unexpected_count,
                total_responses: total,
                threshold,
            },
        )
    });

    tracing::debug!(
        total,
        unexpected_count,
        fit_ratio,
        ?tier,
        aberrant = flag.is_some(),
        "person-fit analysis"
    );

    Some(PersonFitAnalysis {
        total_responses: total,
        correct_count,
        accuracy,
        tier,
        unexpected_count,
        fit_ratio,
        threshold,
        flag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use DifficultyLevel::*;

    fn item(difficulty: DifficultyLevel, is_correct: bool) -> FitItem {
        FitItem {
            difficulty,
            is_correct,
        }
    }

    #[test]
    fn empty_session_is_not_computable() {
        assert!(analyze_person_fit(&[]).is_none());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(PerformanceTier::from_accuracy(0.71), PerformanceTier::High);
        assert_eq!(PerformanceTier::from_accuracy(0.70), PerformanceTier::Medium);
        assert_eq!(PerformanceTier::from_accuracy(0.40), PerformanceTier::Medium);
        assert_eq!(PerformanceTier::from_accuracy(0.39), PerformanceTier::Low);
    }

    #[test]
    fn expectation_table() {
        assert!(PerformanceTier::High.expectation(Easy).is_unexpected(false));
        assert!(!PerformanceTier::High.expectation(Hard).is_unexpected(false));
        assert!(PerformanceTier::Low.expectation(Hard).is_unexpected(true));
        assert!(!PerformanceTier::Low.expectation(Easy).is_unexpected(true));
        assert!(!PerformanceTier::Low.expectation(Easy).is_unexpected(false));
    }

    #[test]
    fn consistent_high_performer_fits() {
        let mut items = vec![item(Easy, true); 4];
        items.extend(vec![item(Medium, true); 4]);
        items.push(item(Hard, false));
        items.push(item(Hard, true));

        let result = analyze_person_fit(&items).unwrap();
        assert_eq!(result.tier, PerformanceTier::High);
        assert_eq!(result.unexpected_count, 0);
        assert!(!result.is_aberrant());
    }

    #[test]
    fn low_performer_acing_hard_items_is_aberrant() {
        // 3/10 correct -> low tier; all three correct answers are hard items
        let mut items = vec![item(Hard, true); 3];
        items.extend(vec![item(Easy, false); 7]);

        let result = analyze_person_fit(&items).unwrap();
        assert_eq!(result.tier, PerformanceTier::Low);
        assert_eq!(result.unexpected_count, 3);
        assert!((result.fit_ratio - 0.3).abs() < 1e-9);
        assert!(result.is_aberrant());
        let flag = result.flag.unwrap();
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.flag_type(), "aberrant_response_pattern");
    }

    #[test]
    fn ratio_below_threshold_is_not_flagged() {
        // 8/10 correct -> high tier; two missed easy items -> ratio 0.2
        let mut items = vec![item(Medium, true); 8];
        items.push(item(Easy, false));
        items.push(item(Easy, false));

        let result = analyze_person_fit(&items).unwrap();
        assert_eq!(result.tier, PerformanceTier::High);
        assert_eq!(result.unexpected_count, 2);
        assert!(!result.is_aberrant());
    }

    #[test]
    fn short_test_uses_looser_threshold() {
        // 3/4 correct -> high; 1 missed easy -> ratio 0.25, below 0.40
        let items = vec![
            item(Easy, false),
            item(Medium, true),
            item(Medium, true),
            item(Hard, true),
        ];
        let result = analyze_person_fit(&items).unwrap();
        assert_eq!(result.threshold, SHORT_TEST_FIT_RATIO_THRESHOLD);
        assert!((result.fit_ratio - 0.25).abs() < 1e-9);
        assert!(!result.is_aberrant());

        // The same ratio on a standard-length test is flagged
        let items = vec![
            item(Easy, false),
            item(Easy, false),
            item(Medium, true),
            item(Medium, true),
            item(Medium, true),
            item(Medium, true),
            item(Medium, true),
            item(Medium, true),
        ];
        let result = analyze_person_fit(&items).unwrap();
        assert_eq!(result.tier, PerformanceTier::High);
        assert_eq!(result.threshold, FIT_RATIO_THRESHOLD);
        assert!((result.fit_ratio - 0.25).abs() < 1e-9);
        assert!(result.is_aberrant());
    }

    #[test]
    fn adding_an_unexpected_response_never_lowers_fit_ratio() {
        // Tier stays high throughout: adding a missed easy item to a high
        // performer is unexpected.
        let mut items = vec![item(Easy, true); 9];
        items.push(item(Medium, true));
        let mut previous = analyze_person_fit(&items).unwrap().fit_ratio;
        for _ in 0..2 {
            items.push(item(Easy, false));
            let result = analyze_person_fit(&items).unwrap();
            assert_eq!(result.tier, PerformanceTier::High);
            assert!(result.fit_ratio >= previous);
            previous = result.fit_ratio;
        }
    }
}
