//! The persisted validity assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Verdict;
use crate::flags::ValidityFlag;
use crate::guttman::GuttmanAnalysis;
use crate::model::{SessionId, ValidityStatus};
use crate::person_fit::PersonFitAnalysis;
use crate::response_time::ResponseTimeAnalysis;

/// Per-analyzer results, each carrying the flags it raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBreakdown {
    #[serde(default)]
    pub person_fit: Option<PersonFitAnalysis>,
    #[serde(default)]
    pub response_time: Option<ResponseTimeAnalysis>,
    #[serde(default)]
    pub guttman: Option<GuttmanAnalysis>,
}

impl AnalysisBreakdown {
    /// All raised flags, person-fit first, then timing, then Guttman.
    pub fn merged_flags(&self) -> Vec<ValidityFlag> {
        let mut flags = Vec::new();
        if let Some(flag) = self.person_fit.as_ref().and_then(|p| p.flag.clone()) {
            flags.push(flag);
        }
        if let Some(rt) = &self.response_time {
            flags.extend(rt.flags.iter().cloned());
        }
        if let Some(flag) = self.guttman.as_ref().and_then(|g| g.flag.clone()) {
            flags.push(flag);
        }
        flags
    }
}

/// Whether an assessment still carries its computed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideState {
    Computed,
    Overridden,
}

/// The current validity assessment of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityAssessment {
    pub session_id: SessionId,
    /// Effective status: the override when one is in force, else computed.
    pub overall_status: ValidityStatus,
    /// Status produced by the aggregator; overrides never touch it.
    pub computed_status: ValidityStatus,
    pub severity_score: u32,
    pub confidence_score: f64,
    pub flags: Vec<ValidityFlag>,
    #[serde(default)]
    pub analysis: AnalysisBreakdown,
    pub computed_at: DateTime<Utc>,
    #[serde(default)]
    pub override_status: Option<ValidityStatus>,
    #[serde(default)]
    pub override_reason: Option<String>,
    #[serde(default)]
    pub overridden_by: Option<String>,
    #[serde(default)]
    pub overridden_at: Option<DateTime<Utc>>,
    /// Status in force immediately before the latest override.
    #[serde(default)]
    pub previous_status: Option<ValidityStatus>,
    /// Storage row version, bumped on every write.
    #[serde(default)]
    pub version: u64,
}

impl ValidityAssessment {
    /// Build a fresh, un-overridden assessment from a verdict.
    pub fn from_verdict(
        session_id: SessionId,
        verdict: Verdict,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            overall_status: verdict.status,
            computed_status: verdict.status,
            severity_score: verdict.severity_score,
            confidence_score: verdict.confidence_score,
            flags: verdict.flags,
            analysis: verdict.analysis,
            computed_at,
            override_status: None,
            override_reason: None,
            overridden_by: None,
            overridden_at: None,
            previous_status: None,
            version: 0,
        }
    }

    /// Replace the computed fields with a new verdict, keeping override
    /// history. An override in force keeps deciding `overall_status`.
    pub fn recomputed(&self, verdict: Verdict, computed_at: DateTime<Utc>) -> Self {
        let overall_status = self.override_status.unwrap_or(verdict.status);
        Self {
            session_id: self.session_id,
            overall_status,
            computed_status: verdict.status,
            severity_score: verdict.severity_score,
            confidence_score: verdict.confidence_score,
            flags: verdict.flags,
            analysis: verdict.analysis,
            computed_at,
            override_status: self.override_status,
            override_reason: self.override_reason.clone(),
            overridden_by: self.overridden_by.clone(),
            overridden_at: self.overridden_at,
            previous_status: self.previous_status,
            version: self.version,
        }
    }

    pub fn override_state(&self) -> OverrideState {
        if self.override_status.is_some() {
            OverrideState::Overridden
        } else {
            OverrideState::Computed
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.override_state() == OverrideState::Overridden
    }

    /// Flag types raised for this session, in merge order.
    pub fn flag_types(&self) -> Vec<&'static str> {
        self.flags.iter().map(|f| f.flag_type()).collect()
    }
}
