//! ABC (Pareto) classification by cumulative share of stock value.
//!
//! Items are ranked by total value, highest first, and walked while keeping a
//! running share of the grand total. Items whose running share is within the
//! A cutoff are class A, within the B cutoff class B, and the tail class C.
//! Ranking is a stable sort, so equal values keep their input order and
//! classes are reproducible across runs.

use crate::config::AuditConfig;
use crate::types::AbcClass;
use crate::util::descending_nan_last;

/// Tier for a cumulative percentage.
pub fn tier_for(cumulative_pct: f64, a_cutoff: f64, b_cutoff: f64) -> AbcClass {
    if cumulative_pct <= a_cutoff {
        AbcClass::A
    } else if cumulative_pct <= b_cutoff {
        AbcClass::B
    } else {
        AbcClass::C
    }
}

/// Indices of `values` ordered by value descending. NaN goes last; ties keep
/// input order.
pub fn rank_descending(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| descending_nan_last(values[a], values[b]));
    order
}

/// Cumulative percentage and tier for values already sorted descending.
///
/// Negative and NaN values contribute nothing to the running total. When the
/// grand total is zero every item is in the tail: cumulative share 100, class C.
pub fn assign_tiers(sorted_values: &[f64], config: &AuditConfig) -> Vec<(f64, AbcClass)> {
    let contribution = |v: f64| if v.is_nan() { 0.0 } else { v.max(0.0) };
    let grand_total: f64 = sorted_values.iter().map(|&v| contribution(v)).sum();

    let mut running = 0.0;
    sorted_values
        .iter()
        .map(|&v| {
            running += contribution(v);
            let pct = if grand_total > 0.0 {
                (running * 100.0 / grand_total).min(100.0)
            } else {
                100.0
            };
            (pct, tier_for(pct, config.abc_a_cutoff, config.abc_b_cutoff))
        })
        .collect()
}

/// One item's ABC result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbcAssignment {
    /// Index into the unsorted input.
    pub index: usize,
    pub cumulative_pct: f64,
    pub class: AbcClass,
}

/// Rank and tier unsorted values. Output is in rank order.
pub fn classify_abc(values: &[f64], config: &AuditConfig) -> Vec<AbcAssignment> {
    let order = rank_descending(values);
    let sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
    order
        .into_iter()
        .zip(assign_tiers(&sorted, config))
        .map(|(index, (cumulative_pct, class))| AbcAssignment {
            index,
            cumulative_pct,
            class,
        })
        .collect()
}
