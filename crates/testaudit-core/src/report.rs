//! Validity reports over many assessments, with JSON persistence and a
//! 7-day vs 30-day trend.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::ValidityAssessment;
use crate::model::{SessionId, ValidityStatus};

/// Short trend window, in days.
pub const TREND_SHORT_DAYS: i64 = 7;
/// Long trend window, in days.
pub const TREND_LONG_DAYS: i64 = 30;
/// Rate difference below which the trend counts as stable.
pub const DEFAULT_TREND_TOLERANCE: f64 = 0.05;

/// Aggregate view of recent assessments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidityReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Reporting window, in days back from `generated_at`.
    pub period_days: u32,
    #[serde(default)]
    pub status_filter: Option<ValidityStatus>,
    pub summary: StatusSummary,
    /// Number of sessions on which each flag type was raised.
    pub by_flag_type: BTreeMap<String, usize>,
    pub trend: Trend,
    /// Suspect or invalid sessions nobody has reviewed yet.
    pub action_needed: Vec<ActionItem>,
}

/// Counts by effective status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub valid: usize,
    pub suspect: usize,
    pub invalid: usize,
    pub overridden: usize,
    pub average_severity: f64,
    pub average_confidence: f64,
}

/// Direction of the flagged-session rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
    InsufficientData,
}

/// Share of suspect or invalid sessions in the last 7 vs last 30 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub sessions_7d: usize,
    pub sessions_30d: usize,
    pub flagged_rate_7d: f64,
    pub flagged_rate_30d: f64,
    pub direction: TrendDirection,
}

/// A session awaiting administrator review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub session_id: SessionId,
    pub status: ValidityStatus,
    pub severity_score: u32,
    pub flag_types: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

/// Build a report from assessments computed up to `now`.
///
/// `assessments` should cover at least the last 30 days so the trend can be
/// computed; the summary only considers the last `period_days`.
pub fn build_report(
    assessments: &[ValidityAssessment],
    now: DateTime<Utc>,
    period_days: u32,
    status_filter: Option<ValidityStatus>,
    trend_tolerance: f64,
) -> ValidityReport {
    let period_start = now - Duration::days(i64::from(period_days));
    let in_period: Vec<&ValidityAssessment> = assessments
        .iter()
        .filter(|a| a.computed_at >= period_start && a.computed_at <= now)
        .filter(|a| status_filter.map_or(true, |s| a.overall_status == s))
        .collect();

    let mut summary = StatusSummary {
        total: in_period.len(),
        ..Default::default()
    };
    let mut by_flag_type: BTreeMap<String, usize> = BTreeMap::new();
    for a in &in_period {
        match a.overall_status {
            ValidityStatus::Valid => summary.valid += 1,
            ValidityStatus::Suspect => summary.suspect += 1,
            ValidityStatus::Invalid => summary.invalid += 1,
            ValidityStatus::Incomplete => {}
        }
        if a.is_overridden() {
            summary.overridden += 1;
        }
        for flag in &a.flags {
            *by_flag_type.entry(flag.flag_type().to_string()).or_default() += 1;
        }
    }
    if !in_period.is_empty() {
        let n = in_period.len() as f64;
        summary.average_severity =
            in_period.iter().map(|a| f64::from(a.severity_score)).sum::<f64>() / n;
        summary.average_confidence = in_period.iter().map(|a| a.confidence_score).sum::<f64>() / n;
    }

    let mut action_needed: Vec<ActionItem> = in_period
        .iter()
        .filter(|a| a.overall_status.needs_review() && !a.is_overridden())
        .map(|a| ActionItem {
            session_id: a.session_id,
            status: a.overall_status,
            severity_score: a.severity_score,
            flag_types: a.flag_types().into_iter().map(String::from).collect(),
            computed_at: a.computed_at,
        })
        .collect();
    action_needed.sort_by(|a, b| {
        b.severity_score
            .cmp(&a.severity_score)
            .then(b.computed_at.cmp(&a.computed_at))
    });

    ValidityReport {
        id: Uuid::new_v4(),
        generated_at: now,
        period_days,
        status_filter,
        summary,
        by_flag_type,
        trend: compute_trend(assessments, now, trend_tolerance),
        action_needed,
    }
}

/// Compare the flagged rate of the last 7 days against the last 30.
pub fn compute_trend(
    assessments: &[ValidityAssessment],
    now: DateTime<Utc>,
    tolerance: f64,
) -> Trend {
    let window = |days: i64| -> (usize, f64) {
        let start = now - Duration::days(days);
        let in_window: Vec<&ValidityAssessment> = assessments
            .iter()
            .filter(|a| a.computed_at >= start && a.computed_at <= now)
            .collect();
        let flagged = in_window
            .iter()
            .filter(|a| a.overall_status.needs_review())
            .count();
        let rate = if in_window.is_empty() {
            0.0
        } else {
            flagged as f64 / in_window.len() as f64
        };
        (in_window.len(), rate)
    };

    let (sessions_7d, flagged_rate_7d) = window(TREND_SHORT_DAYS);
    let (sessions_30d, flagged_rate_30d) = window(TREND_LONG_DAYS);

    let direction = if sessions_7d == 0 || sessions_30d == 0 {
        TrendDirection::InsufficientData
    } else {
        let delta = flagged_rate_7d - flagged_rate_30d;
        if delta > tolerance {
            TrendDirection::Worsening
        } else if delta < -tolerance {
            TrendDirection::Improving
        } else {
            TrendDirection::Stable
        }
    };

    Trend {
        sessions_7d,
        sessions_30d,
        flagged_rate_7d,
        flagged_rate_30d,
        direction,
    }
}

impl ValidityReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let s = &self.summary;

        md.push_str(&format!(
            "**Validity report, last {} days:** {} sessions, {} valid, {} suspect, {} invalid ({} overridden)\n\n",
            self.period_days, s.total, s.valid, s.suspect, s.invalid, s.overridden
        ));
        md.push_str(&format!(
            "Average severity {:.2}, average confidence {:.2}\n\n",
            s.average_severity, s.average_confidence
        ));
        md.push_str(&format!(
            "Trend: {:.1}% flagged (7d) vs {:.1}% flagged (30d), {}\n\n",
            self.trend.flagged_rate_7d * 100.0,
            self.trend.flagged_rate_30d * 100.0,
            direction_label(self.trend.direction)
        ));

        if !self.by_flag_type.is_empty() {
            md.push_str("### Flags\n\n");
            md.push_str("| Flag | Sessions |\n");
            md.push_str("|------|----------|\n");
            for (flag, count) in &self.by_flag_type {
                md.push_str(&format!("| {flag} | {count} |\n"));
            }
            md.push('\n');
        }

        if !self.action_needed.is_empty() {
            md.push_str("### Needs review\n\n");
            md.push_str("| Session | Status | Severity | Flags |\n");
            md.push_str("|---------|--------|----------|-------|\n");
            for item in &self.action_needed {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    item.session_id,
                    item.status,
                    item.severity_score,
                    item.flag_types.join(", ")
                ));
            }
        }

        md
    }

    /// Returns true if any session is waiting for review.
    pub fn has_pending_reviews(&self) -> bool {
        !self.action_needed.is_empty()
    }
}

pub fn direction_label(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Improving => "improving",
        TrendDirection::Stable => "stable",
        TrendDirection::Worsening => "worsening",
        TrendDirection::InsufficientData => "insufficient data",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{confidence_for_severity, status_for_severity, Verdict};
    use crate::assessment::AnalysisBreakdown;
    use crate::flags::{FlagKind, ValidityFlag};
    use crate::model::Severity;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
    }

    fn assessment(session_id: SessionId, severity_score: u32, days_ago: i64) -> ValidityAssessment {
        let flags = if severity_score >= 2 {
            vec![ValidityFlag::new(
                Severity::High,
                FlagKind::TotalTimeTooFast {
                    total_time_seconds: 120,
                    threshold_seconds: 300,
                },
            )]
        } else {
            vec![]
        };
        ValidityAssessment::from_verdict(
            session_id,
            Verdict {
                status: status_for_severity(severity_score),
                severity_score,
                confidence_score: confidence_for_severity(severity_score),
                flags,
                analysis: AnalysisBreakdown::default(),
            },
            now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn summary_counts_period_only() {
        let all = vec![
            assessment(1, 0, 1),
            assessment(2, 2, 2),
            assessment(3, 4, 3),
            assessment(4, 4, 20),
        ];
        let report = build_report(&all, now(), 7, None, DEFAULT_TREND_TOLERANCE);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.suspect, 1);
        assert_eq!(report.summary.invalid, 1);
        assert_eq!(report.by_flag_type.get("total_time_too_fast"), Some(&2));
        assert!((report.summary.average_severity - 2.0).abs() < 1e-9);
    }

    #[test]
    fn status_filter_narrows_summary() {
        let all = vec![assessment(1, 0, 1), assessment(2, 4, 1), assessment(3, 5, 2)];
        let report = build_report(
            &all,
            now(),
            30,
            Some(ValidityStatus::Invalid),
            DEFAULT_TREND_TOLERANCE,
        );
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.valid, 0);
        assert_eq!(report.action_needed.len(), 2);
        // highest severity first
        assert_eq!(report.action_needed[0].session_id, 3);
    }

    #[test]
    fn overridden_sessions_leave_the_review_queue() {
        let mut reviewed = assessment(1, 4, 1);
        reviewed.override_status = Some(ValidityStatus::Invalid);
        let all = vec![reviewed, assessment(2, 2, 1)];
        let report = build_report(&all, now(), 30, None, DEFAULT_TREND_TOLERANCE);
        assert_eq!(report.summary.overridden, 1);
        assert_eq!(report.action_needed.len(), 1);
        assert_eq!(report.action_needed[0].session_id, 2);
    }

    #[test]
    fn worsening_trend() {
        // last week: 2 of 2 flagged; older: 0 of 8 flagged
        let mut all: Vec<ValidityAssessment> = (0..8).map(|i| assessment(i, 0, 15)).collect();
        all.push(assessment(100, 4, 1));
        all.push(assessment(101, 2, 2));

        let trend = compute_trend(&all, now(), DEFAULT_TREND_TOLERANCE);
        assert_eq!(trend.sessions_7d, 2);
        assert_eq!(trend.sessions_30d, 10);
        assert!((trend.flagged_rate_7d - 1.0).abs() < 1e-9);
        assert!((trend.flagged_rate_30d - 0.2).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Worsening);
    }

    #[test]
    fn improving_and_stable_trends() {
        let mut all: Vec<ValidityAssessment> = (0..5).map(|i| assessment(i, 4, 20)).collect();
        all.extend((10..15).map(|i| assessment(i, 0, 1)));
        assert_eq!(
            compute_trend(&all, now(), DEFAULT_TREND_TOLERANCE).direction,
            TrendDirection::Improving
        );

        let steady: Vec<ValidityAssessment> = (0..10).map(|i| assessment(i, 0, i % 20)).collect();
        assert_eq!(
            compute_trend(&steady, now(), DEFAULT_TREND_TOLERANCE).direction,
            TrendDirection::Stable
        );
    }

    #[test]
    fn empty_window_is_insufficient() {
        let all = vec![assessment(1, 0, 12)];
        let trend = compute_trend(&all, now(), DEFAULT_TREND_TOLERANCE);
        assert_eq!(trend.direction, TrendDirection::InsufficientData);
    }

    #[test]
    fn save_json_writes_file() {
        let report = build_report(&[assessment(1, 2, 1)], now(), 7, None, 0.05);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded: ValidityReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.summary, report.summary);
        assert_eq!(loaded.action_needed.len(), 1);
    }

    #[test]
    fn markdown_output() {
        let report = build_report(&[assessment(77, 4, 1)], now(), 7, None, 0.05);
        let md = report.to_markdown();
        assert!(md.contains("Needs review"));
        assert!(md.contains("| 77 | invalid | 4 |"));
        assert!(md.contains("total_time_too_fast"));
    }
}
