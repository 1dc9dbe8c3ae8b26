//! Difficulty resolution.
//!
//! An item's difficulty is expressed as a p-value: the population probability
//! of answering it correctly. Lower p means a harder item.

use crate::model::{DifficultyLevel, Question};

/// Fallback p-value used when a question has no empirical calibration.
pub fn fallback_p_value(level: DifficultyLevel) -> f64 {
    match level {
        DifficultyLevel::Easy => 0.75,
        DifficultyLevel::Medium => 0.50,
        DifficultyLevel::Hard => 0.25,
    }
}

/// Resolve the difficulty estimate of a question, always in `[0, 1]`.
///
/// Prefers the empirical p-value; a missing or non-finite value falls back
/// to the categorical mapping. Empirical values outside the unit interval are
/// clamped.
pub fn resolve_p_value(question: &Question) -> f64 {
    match question.empirical_p_value {
        Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => fallback_p_value(question.difficulty_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(level: DifficultyLevel, p: Option<f64>) -> Question {
        Question {
            id: 1,
            difficulty_level: level,
            empirical_p_value: p,
            question_type: "pattern".into(),
        }
    }

    #[test]
    fn fallback_mapping() {
        assert_eq!(resolve_p_value(&question(DifficultyLevel::Easy, None)), 0.75);
        assert_eq!(resolve_p_value(&question(DifficultyLevel::Medium, None)), 0.50);
        assert_eq!(resolve_p_value(&question(DifficultyLevel::Hard, None)), 0.25);
    }

    #[test]
    fn empirical_value_wins() {
        let q = question(DifficultyLevel::Hard, Some(0.82));
        assert_eq!(resolve_p_value(&q), 0.82);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(resolve_p_value(&question(DifficultyLevel::Easy, Some(1.4))), 1.0);
        assert_eq!(resolve_p_value(&question(DifficultyLevel::Easy, Some(-0.2))), 0.0);
    }

    #[test]
    fn nan_falls_back() {
        let q = question(DifficultyLevel::Medium, Some(f64::NAN));
        assert_eq!(resolve_p_value(&q), 0.50);
    }
}
