//! Administrator overrides of a computed validity status.
//!
//! An override moves an assessment from `computed` to `overridden`; further
//! overrides are allowed. Each one records the status in force immediately
//! before it in `previous_status`. Only that single step is kept, so a chain
//! of overrides can be walked back one step at a time, not replayed in full.

use chrono::{DateTime, Utc};

use crate::assessment::ValidityAssessment;
use crate::error::ValidityError;
use crate::model::ValidityStatus;

/// Minimum override reason length, in characters.
pub const MIN_REASON_CHARS: usize = 10;

/// An administrator's request to override a session's status.
#[derive(Debug, Clone)]
pub struct OverrideRequest {
    pub new_status: ValidityStatus,
    pub reason: String,
    pub admin_id: String,
}

impl OverrideRequest {
    pub fn new(
        new_status: ValidityStatus,
        reason: impl Into<String>,
        admin_id: impl Into<String>,
    ) -> Self {
        Self {
            new_status,
            reason: reason.into(),
            admin_id: admin_id.into(),
        }
    }

    /// Check the request before anything is read or written.
    pub fn validate(&self) -> Result<(), ValidityError> {
        let reason_len = self.reason.trim().chars().count();
        if reason_len < MIN_REASON_CHARS {
            return Err(ValidityError::Validation(format!(
                "override reason must be at least {MIN_REASON_CHARS} characters, got {reason_len}"
            )));
        }
        if !self.new_status.is_overridable_target() {
            return Err(ValidityError::Validation(format!(
                "cannot override to status '{}'",
                self.new_status
            )));
        }
        if self.admin_id.trim().is_empty() {
            return Err(ValidityError::Validation("admin id is required".into()));
        }
        Ok(())
    }
}

/// Apply an override to the current assessment, returning the new row.
///
/// The computed status and severity are left untouched. The returned row keeps
/// the current `version`; the store bumps it on commit.
pub fn apply_override(
    current: &ValidityAssessment,
    request: &OverrideRequest,
    at: DateTime<Utc>,
) -> Result<ValidityAssessment, ValidityError> {
    request.validate()?;

    let mut next = current.clone();
    next.previous_status = Some(current.overall_status);
    next.overall_status = request.new_status;
    next.override_status = Some(request.new_status);
    next.override_reason = Some(request.reason.trim().to_string());
    next.overridden_by = Some(request.admin_id.clone());
    next.overridden_at = Some(at);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Verdict;
    use crate::assessment::{AnalysisBreakdown, OverrideState};

    fn computed(status: ValidityStatus, severity_score: u32) -> ValidityAssessment {
        ValidityAssessment::from_verdict(
            5,
            Verdict {
                status,
                severity_score,
                confidence_score: 1.0,
                flags: vec![],
                analysis: AnalysisBreakdown::default(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn short_reason_is_rejected() {
        let current = computed(ValidityStatus::Suspect, 2);
        let req = OverrideRequest::new(ValidityStatus::Valid, "short", "admin-1");
        let err = apply_override(&current, &req, Utc::now()).unwrap_err();
        assert!(matches!(err, ValidityError::Validation(_)));
    }

    #[test]
    fn ten_character_reason_is_accepted() {
        let current = computed(ValidityStatus::Suspect, 2);
        let req = OverrideRequest::new(ValidityStatus::Valid, "0123456789", "admin-1");
        let next = apply_override(&current, &req, Utc::now()).unwrap();
        assert_eq!(next.overall_status, ValidityStatus::Valid);
        assert_eq!(next.override_state(), OverrideState::Overridden);
    }

    #[test]
    fn nine_characters_plus_padding_is_rejected() {
        let req = OverrideRequest::new(ValidityStatus::Valid, "  012345678  ", "admin-1");
        assert!(req.validate().is_err());
    }

    #[test]
    fn incomplete_is_not_a_target() {
        let req = OverrideRequest::new(
            ValidityStatus::Incomplete,
            "session was interrupted",
            "admin-1",
        );
        assert!(matches!(req.validate(), Err(ValidityError::Validation(_))));
    }

    #[test]
    fn override_preserves_computed_status() {
        let current = computed(ValidityStatus::Invalid, 5);
        let at = Utc::now();
        let req = OverrideRequest::new(
            ValidityStatus::Valid,
            "proctor confirmed identity on camera",
            "admin-7",
        );
        let next = apply_override(&current, &req, at).unwrap();

        assert_eq!(next.computed_status, ValidityStatus::Invalid);
        assert_eq!(next.severity_score, 5);
        assert_eq!(next.previous_status, Some(ValidityStatus::Invalid));
        assert_eq!(next.override_status, Some(ValidityStatus::Valid));
        assert_eq!(next.overridden_by.as_deref(), Some("admin-7"));
        assert_eq!(next.overridden_at, Some(at));
    }

    #[test]
    fn chained_overrides_keep_one_step_of_history() {
        let current = computed(ValidityStatus::Invalid, 4);
        let first = apply_override(
            &current,
            &OverrideRequest::new(ValidityStatus::Suspect, "partial evidence of help", "a"),
            Utc::now(),
        )
        .unwrap();
        let second = apply_override(
            &first,
            &OverrideRequest::new(ValidityStatus::Valid, "appeal upheld after review", "b"),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(second.previous_status, Some(ValidityStatus::Suspect));
        assert_eq!(second.computed_status, ValidityStatus::Invalid);
        assert_eq!(second.overall_status, ValidityStatus::Valid);
        assert_eq!(second.overridden_by.as_deref(), Some("b"));
    }
}
