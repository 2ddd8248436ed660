//! Subsidy rules: the tiered central scheme and per-region add-ons.

use crate::config::{RegionRule, SizingPolicy, SubsidyTier};

/// A region-specific incentive, evaluated on the quantized capacity.
pub trait RegionIncentive {
    fn subsidy(&self, capacity_kw: f64) -> f64;
}

impl RegionIncentive for RegionRule {
    fn subsidy(&self, capacity_kw: f64) -> f64 {
        match *self {
            RegionRule::CappedPerKw { per_kw_rate, cap } => (capacity_kw * per_kw_rate).min(cap),
            RegionRule::Flat { amount } => {
                if capacity_kw > 0.0 { amount } else { 0.0 }
            }
        }
    }
}

/// Step function over the tier list: the highest tier whose threshold is met wins.
pub fn central_subsidy(capacity_kw: f64, tiers: &[SubsidyTier]) -> f64 {
    tiers
        .iter()
        .filter(|t| capacity_kw >= t.min_kw)
        .max_by(|a, b| a.min_kw.total_cmp(&b.min_kw))
        .map_or(0.0, |t| t.amount)
}

/// Region add-on; regions without a rule (or not listed at all) yield 0.
pub fn region_subsidy(capacity_kw: f64, region: &str, policy: &SizingPolicy) -> f64 {
    policy
        .region_rule(region)
        .map_or(0.0, |rule| rule.subsidy(capacity_kw))
}
