//! Quality audit: per-category z-scores and ordered status classification.
//!
//! Each record is scored against its own category (the peer group) and then
//! classified by the first matching rule in this priority order:
//!
//! | priority | condition                         | status         |
//! |----------|-----------------------------------|----------------|
//! | 1        | stock count missing               | `MISSING`      |
//! | 2        | stock count < 0                   | `NEGATIVE`     |
//! | 3        | \|z\| > `anomaly_z_threshold`     | `STAT_ANOMALY` |
//! | 4        | stock count > `outlier_threshold` | `OUTLIER`      |
//! | -        | otherwise                         | `CLEAN`        |
//!
//! The z-score is zero whenever the group standard deviation is undefined
//! (fewer than two present values) or zero, so singleton groups can never be
//! statistical anomalies.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::AuditConfig;
use crate::rules::RuleSet;
use crate::stats;
use crate::types::AuditStatus;

/// Mean and spread of the present values of one category.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupStats {
    /// Number of present (non-missing) values.
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` below two present values.
    pub std_dev: Option<f64>,
}

impl GroupStats {
    fn from_values(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: stats::mean(values),
            std_dev: stats::sample_std_dev(values),
        }
    }

    /// Standardized deviation of `value`, zero when the spread is undefined or zero.
    pub fn z_score(&self, value: f64) -> f64 {
        match (self.mean, self.std_dev) {
            (Some(mean), Some(sd)) if sd > 0.0 && sd.is_finite() => (value - mean) / sd,
            _ => 0.0,
        }
    }
}

/// Compute statistics for every group key present in `observations`.
///
/// Groups are independent, so they are reduced in parallel; the ordered map
/// makes the result identical to a sequential pass.
pub fn compute_group_stats(observations: &[(&str, Option<f64>)]) -> BTreeMap<String, GroupStats> {
    let mut partitions: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (group, value) in observations {
        let present = partitions.entry(*group).or_default();
        if let Some(v) = value {
            present.push(*v);
        }
    }

    partitions
        .into_par_iter()
        .map(|(group, values)| (group.to_string(), GroupStats::from_values(&values)))
        .collect()
}

/// What the status rules look at for one record.
#[derive(Clone, Copy, Debug)]
pub struct AuditInput {
    pub value: Option<f64>,
    pub z_score: f64,
}

/// Per-record audit result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuditOutcome {
    pub z_score: f64,
    pub status: AuditStatus,
}

/// Classifies records using thresholds from `AuditConfig`.
pub struct QualityAuditor {
    rules: RuleSet<AuditInput, AuditStatus>,
}

impl QualityAuditor {
    pub fn new(config: &AuditConfig) -> Self {
        let z_threshold = config.anomaly_z_threshold;
        let outlier_threshold = config.outlier_threshold;

        let rules = RuleSet::new(AuditStatus::Clean)
            .rule(AuditStatus::Missing, |i: &AuditInput| i.value.is_none())
            .rule(AuditStatus::Negative, |i: &AuditInput| {
                i.value.map_or(false, |v| v < 0.0)
            })
            .rule(AuditStatus::StatAnomaly, move |i: &AuditInput| {
                i.z_score.abs() > z_threshold
            })
            .rule(AuditStatus::Outlier, move |i: &AuditInput| {
                i.value.map_or(false, |v| v > outlier_threshold)
            });

        Self { rules }
    }

    /// The status rules in evaluation order.
    pub fn priority_order(&self) -> Vec<AuditStatus> {
        self.rules.priority_order()
    }

    pub fn classify(&self, value: Option<f64>, z_score: f64) -> AuditStatus {
        self.rules.evaluate(&AuditInput { value, z_score })
    }

    /// Score and classify a batch of `(group_key, value)` observations.
    ///
    /// Output is index-aligned with the input.
    pub fn audit(&self, observations: &[(&str, Option<f64>)]) -> Vec<AuditOutcome> {
        let group_stats = compute_group_stats(observations);

        observations
            .iter()
            .map(|(group, value)| {
                let z_score = match (value, group_stats.get(*group)) {
                    (Some(v), Some(stats)) => stats.z_score(*v),
                    _ => 0.0,
                };
                AuditOutcome {
                    z_score,
                    status: self.classify(*value, z_score),
                }
            })
            .collect()
    }
}

impl Default for QualityAuditor {
    fn default() -> Self {
        Self::new(&AuditConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(outcomes: &[AuditOutcome]) -> Vec<AuditStatus> {
        outcomes.iter().map(|o| o.status).collect()
    }

    #[test]
    fn priority_order_is_fixed() {
        let auditor = QualityAuditor::default();
        assert_eq!(
            auditor.priority_order(),
            vec![
                AuditStatus::Missing,
                AuditStatus::Negative,
                AuditStatus::StatAnomaly,
                AuditStatus::Outlier,
                AuditStatus::Clean,
            ]
        );
    }

    #[test]
    fn small_group_with_missing_and_negative() {
        let auditor = QualityAuditor::default();
        let obs = [("A", Some(50.0)), ("A", Some(-5.0)), ("A", None)];
        let outcomes = auditor.audit(&obs);
        assert_eq!(
            statuses(&outcomes),
            vec![AuditStatus::Clean, AuditStatus::Negative, AuditStatus::Missing]
        );
        // Missing values are never standardized.
        assert_eq!(outcomes[2].z_score, 0.0);
    }

    #[test]
    fn singleton_group_is_outlier_not_anomaly() {
        let auditor = QualityAuditor::default();
        let outcomes = auditor.audit(&[("Z", Some(5000.0))]);
        assert_eq!(outcomes[0].z_score, 0.0);
        assert_eq!(outcomes[0].status, AuditStatus::Outlier);
    }

    #[test]
    fn negative_beats_statistical_anomaly() {
        let auditor = QualityAuditor::default();
        let mut obs: Vec<(&str, Option<f64>)> = vec![("T", Some(100.0)); 9];
        obs.push(("T", Some(-900.0)));
        let outcomes = auditor.audit(&obs);
        assert!(outcomes[9].z_score.abs() > 1.5);
        assert_eq!(outcomes[9].status, AuditStatus::Negative);
    }

    #[test]
    fn statistical_anomaly_beats_outlier() {
        let auditor = QualityAuditor::default();
        let mut obs: Vec<(&str, Option<f64>)> = vec![("E", Some(10.0)); 9];
        obs.push(("E", Some(5000.0)));
        let outcomes = auditor.audit(&obs);
        assert_eq!(outcomes[9].status, AuditStatus::StatAnomaly);
        assert!(outcomes[..9].iter().all(|o| o.status == AuditStatus::Clean));
    }

    #[test]
    fn constant_group_has_zero_scores() {
        let auditor = QualityAuditor::default();
        let outcomes = auditor.audit(&[("C", Some(7.0)), ("C", Some(7.0)), ("C", Some(7.0))]);
        assert!(outcomes.iter().all(|o| o.z_score == 0.0));
    }

    #[test]
    fn z_scores_standardize_each_group() {
        let auditor = QualityAuditor::default();
        let obs = [
            ("A", Some(10.0)),
            ("B", Some(1000.0)),
            ("A", Some(20.0)),
            ("B", Some(1500.0)),
            ("A", Some(35.0)),
            ("B", Some(900.0)),
            ("A", None),
            ("A", Some(12.0)),
        ];
        let outcomes = auditor.audit(&obs);

        for group in ["A", "B"] {
            let z: Vec<f64> = obs
                .iter()
                .zip(&outcomes)
                .filter(|((g, v), _)| *g == group && v.is_some())
                .map(|(_, o)| o.z_score)
                .collect();
            let n = z.len() as f64;
            let mean = z.iter().sum::<f64>() / n;
            let var = z.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            assert!(mean.abs() < 1e-9, "group {} mean {}", group, mean);
            assert!((var - 1.0).abs() < 1e-9, "group {} variance {}", group, var);
        }
    }

    #[test]
    fn thresholds_are_tunable() {
        let config = AuditConfig {
            outlier_threshold: 100.0,
            ..AuditConfig::default()
        };
        let auditor = QualityAuditor::new(&config);
        assert_eq!(auditor.classify(Some(150.0), 0.0), AuditStatus::Outlier);
        assert_eq!(QualityAuditor::default().classify(Some(150.0), 0.0), AuditStatus::Clean);
    }

    #[test]
    fn group_stats_skip_missing_values() {
        let stats = compute_group_stats(&[("A", Some(2.0)), ("A", None), ("A", Some(4.0)), ("B", None)]);
        assert_eq!(stats["A"].count, 2);
        assert_eq!(stats["A"].mean, Some(3.0));
        assert_eq!(stats["B"].count, 0);
        assert_eq!(stats["B"].mean, None);
    }
}
