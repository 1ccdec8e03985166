//! Stock count remediation.
//!
//! Missing counts are imputed with the median of the valid counts in the
//! same category, then every cleaned value is floored at zero. A count is
//! valid when it is present and non-negative: negative stock is a data-entry
//! error and must not drag the imputed value down. The original count is left
//! untouched on the record.

use std::collections::BTreeMap;

use crate::config::MissingGroupPolicy;
use crate::stats;

/// Median of the valid (present, non-negative) values per group key. `None`
/// when a group has no valid values at all.
pub fn group_medians(observations: &[(&str, Option<f64>)]) -> BTreeMap<String, Option<f64>> {
    let mut partitions: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (group, value) in observations {
        let valid = partitions.entry(*group).or_default();
        if let Some(v) = value.filter(|v| *v >= 0.0) {
            valid.push(v);
        }
    }
    partitions
        .into_iter()
        .map(|(group, values)| (group.to_string(), stats::median(&values)))
        .collect()
}

pub struct Remediator {
    policy: MissingGroupPolicy,
}

impl Remediator {
    pub fn new(policy: MissingGroupPolicy) -> Self {
        Self { policy }
    }

    /// Value imputed for groups with no valid counts.
    fn fallback(&self, observations: &[(&str, Option<f64>)]) -> f64 {
        match self.policy {
            MissingGroupPolicy::Zero => 0.0,
            MissingGroupPolicy::GlobalMedian => {
                let valid: Vec<f64> = observations
                    .iter()
                    .filter_map(|(_, v)| v.filter(|v| *v >= 0.0))
                    .collect();
                stats::median(&valid).unwrap_or(0.0)
            }
        }
    }

    /// Cleaned value for each observation, index-aligned with the input.
    /// No returned value is negative.
    pub fn remediate(&self, observations: &[(&str, Option<f64>)]) -> Vec<f64> {
        let medians = group_medians(observations);
        let fallback = self.fallback(observations);

        for (group, median) in &medians {
            if median.is_none() {
                log::warn!(
                    "category={} has no valid stock counts; imputing {}",
                    group,
                    fallback
                );
            }
        }

        observations
            .iter()
            .map(|(group, value)| {
                let imputed = match value {
                    Some(v) => *v,
                    None => medians
                        .get(*group)
                        .copied()
                        .flatten()
                        .unwrap_or(fallback),
                };
                imputed.max(0.0)
            })
            .collect()
    }
}

impl Default for Remediator {
    fn default() -> Self {
        Self::new(MissingGroupPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imputes_group_median_and_floors_negatives() {
        let obs = [("A", Some(50.0)), ("A", Some(-5.0)), ("A", None)];
        let cleaned = Remediator::default().remediate(&obs);
        // -5 is invalid, so the group median is 50
        assert_eq!(cleaned, vec![50.0, 0.0, 50.0]);
    }

    #[test]
    fn present_non_negative_values_pass_through() {
        let obs = [("A", Some(0.0)), ("A", Some(12.5)), ("B", Some(7.0))];
        assert_eq!(Remediator::default().remediate(&obs), vec![0.0, 12.5, 7.0]);
    }

    #[test]
    fn group_with_only_negative_counts_falls_back() {
        let obs = [("N", Some(-10.0)), ("N", Some(-20.0)), ("N", None)];
        let cleaned = Remediator::default().remediate(&obs);
        assert_eq!(cleaned, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn all_missing_group_uses_global_median() {
        let obs = [
            ("A", Some(10.0)),
            ("A", Some(30.0)),
            ("B", Some(20.0)),
            ("Toys", None),
        ];
        let cleaned = Remediator::new(MissingGroupPolicy::GlobalMedian).remediate(&obs);
        assert_eq!(cleaned[3], 20.0);
    }

    #[test]
    fn all_missing_group_with_zero_policy() {
        let obs = [("A", Some(10.0)), ("Toys", None)];
        let cleaned = Remediator::new(MissingGroupPolicy::Zero).remediate(&obs);
        assert_eq!(cleaned, vec![10.0, 0.0]);
    }

    #[test]
    fn nothing_present_anywhere_imputes_zero() {
        let obs = [("A", None), ("B", None)];
        let cleaned = Remediator::default().remediate(&obs);
        assert_eq!(cleaned, vec![0.0, 0.0]);
    }

    #[test]
    fn group_medians_report_empty_groups() {
        let medians = group_medians(&[
            ("A", Some(1.0)),
            ("A", Some(3.0)),
            ("A", Some(-8.0)),
            ("B", None),
            ("C", Some(-1.0)),
        ]);
        assert_eq!(medians["A"], Some(2.0));
        assert_eq!(medians["B"], None);
        assert_eq!(medians["C"], None);
    }
}
