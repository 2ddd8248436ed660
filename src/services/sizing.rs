//! ============================================================
//!  Residential Solar Sizing & Financial Model
//!
//!  Pipeline:
//!   1. Daily need        – monthly draw over a fixed 30-day month
//!   2. Capacity          – daily need / (sun hours × loss factor),
//!                          rounded UP to the next 0.5 kW step
//!   3. Panel count       – capacity / nameplate wattage, rounded up
//!   4. Costs             – hardware (per panel technology) + labour
//!   5. Subsidies         – central tiers + region add-on, net ≥ 0
//!   6. Savings / payback – full bill assumed offset
//!   7. Environment       – grid CO2 avoided, tree equivalent
//! ============================================================

use crate::config::SizingPolicy;
use crate::errors::CalculationError;
use crate::models::solar::{CalculationInput, CalculationResult};
use crate::services::incentives;

/// Round a raw capacity up to the next 0.5 kW increment.
pub fn quantize_capacity(raw_kw: f64) -> f64 {
    (raw_kw * 2.0).ceil() / 2.0
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, CalculationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalculationError::InvalidInput { field, value })
    }
}

/// Derived quantities must stay finite and fit the integer type they end up in.
fn within(quantity: &'static str, value: f64, max: f64) -> Result<f64, CalculationError> {
    if value.is_finite() && value <= max {
        Ok(value)
    } else {
        Err(CalculationError::OutOfRange { quantity, value })
    }
}

/// Size the installation and derive its costs, subsidies, payback and
/// environmental impact. Pure: identical input and policy give identical output.
pub fn compute_metrics(
    input: &CalculationInput,
    policy: &SizingPolicy,
) -> Result<CalculationResult, CalculationError> {
    let monthly_kwh = non_negative("monthly_consumption_kwh", input.monthly_consumption_kwh)?;
    let rate = non_negative("electricity_rate_per_kwh", input.electricity_rate_per_kwh)?;
    let sun_hours = input.sun_hours_per_day;
    if !sun_hours.is_finite() {
        return Err(CalculationError::InvalidInput { field: "sun_hours_per_day", value: sun_hours });
    }
    if sun_hours <= 0.0 {
        return Err(CalculationError::NotComputable { sun_hours_per_day: sun_hours });
    }
    let panel = policy
        .panel(input.panel_technology)
        .ok_or(CalculationError::UnknownPanelTechnology(input.panel_technology))?;

    // ── 1-2. Capacity ──────────────────────────────────────────
    let daily_kwh = monthly_kwh / policy.days_per_month;
    let raw_kw = daily_kwh / (sun_hours * policy.system_loss_factor);
    if !raw_kw.is_finite() {
        return Err(CalculationError::NotComputable { sun_hours_per_day: sun_hours });
    }
    let required_kw = quantize_capacity(raw_kw);

    // ── 3. Panels ──────────────────────────────────────────────
    let total_panels = within(
        "total_panels",
        (required_kw * 1000.0 / policy.standard_panel_wattage_w).ceil(),
        u32::MAX as f64,
    )? as u32;

    // ── 4. Costs ───────────────────────────────────────────────
    let system_wattage = required_kw * 1000.0;
    let hardware_cost = system_wattage * panel.cost_per_watt;
    let installation_cost = system_wattage * policy.labor_cost_per_watt;
    let estimated_cost = within("estimated_cost", hardware_cost + installation_cost, f64::MAX)?;

    // ── 5. Subsidies ───────────────────────────────────────────
    let central_subsidy = incentives::central_subsidy(required_kw, &policy.central_subsidy_tiers);
    let region_subsidy = incentives::region_subsidy(required_kw, &input.region, policy);
    let final_cost = (estimated_cost - (central_subsidy + region_subsidy)).max(0.0);

    // ── 6. Savings ─────────────────────────────────────────────
    let monthly_savings = within("monthly_savings", monthly_kwh * rate, f64::MAX)?;
    let payback_period_years = if monthly_savings == 0.0 {
        f64::INFINITY
    } else {
        final_cost / (monthly_savings * 12.0)
    };

    // ── 7. Environment ─────────────────────────────────────────
    let co2_saved_kg_per_year = within(
        "co2_saved_kg_per_year",
        monthly_kwh * 12.0 * policy.grid_emission_factor,
        f64::MAX,
    )?;
    let trees_equivalent = within(
        "trees_equivalent",
        (co2_saved_kg_per_year / policy.co2_per_tree_per_year).round(),
        u64::MAX as f64,
    )? as u64;

    tracing::debug!(
        "[CALC] region={} panel={} raw={:.3} kW → {} kW, {} panels, net ₹{:.0}",
        input.region, input.panel_technology, raw_kw, required_kw, total_panels, final_cost
    );

    Ok(CalculationResult {
        required_kw,
        total_panels,
        hardware_cost,
        installation_cost,
        estimated_cost,
        central_subsidy,
        region_subsidy,
        final_cost,
        monthly_savings,
        payback_period_years,
        co2_saved_kg_per_year,
        trees_equivalent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::solar::PanelTechnology;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn input(monthly: f64, sun: f64, rate: f64, region: &str, panel: PanelTechnology) -> CalculationInput {
        CalculationInput {
            monthly_consumption_kwh: monthly,
            sun_hours_per_day: sun,
            electricity_rate_per_kwh: rate,
            region: region.to_string(),
            panel_technology: panel,
        }
    }

    #[test]
    fn test_uttar_pradesh_dcr_household() {
        let policy = SizingPolicy::default();
        let r = compute_metrics(
            &input(300.0, 5.0, 8.5, "Uttar Pradesh", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap();

        assert_eq!(r.required_kw, 3.0);
        assert_eq!(r.total_panels, 6);
        assert_eq!(r.hardware_cost, 105000.0);
        assert_eq!(r.installation_cost, 36000.0);
        assert_eq!(r.estimated_cost, 141000.0);
        assert_eq!(r.central_subsidy, 78000.0);
        assert_eq!(r.region_subsidy, 30000.0);
        assert_eq!(r.final_cost, 33000.0);
        assert_relative_eq!(r.monthly_savings, 2550.0);
        assert_relative_eq!(r.payback_period_years, 33000.0 / 30600.0);
        assert_relative_eq!(r.payback_period_years, 1.078, epsilon = 1e-3);
        assert_relative_eq!(r.co2_saved_kg_per_year, 2880.0);
        assert_eq!(r.trees_equivalent, 137);
        assert_eq!(r.payback_label(), "1.1 years");
    }

    #[test]
    fn test_region_without_rule_gets_central_only() {
        let policy = SizingPolicy::default();
        let r = compute_metrics(
            &input(300.0, 5.0, 8.5, "Karnataka", PanelTechnology::Monocrystalline),
            &policy,
        )
        .unwrap();
        assert_eq!(r.region_subsidy, 0.0);
        assert_eq!(r.hardware_cost, 96000.0);
        assert_eq!(r.final_cost, 132000.0 - 78000.0);
    }

    #[test]
    fn test_small_system_net_cost_clamped() {
        // 1 kW of cheap panels with generous add-on: subsidies exceed gross cost
        let mut policy = SizingPolicy::default();
        policy.labor_cost_per_watt = 0.0;
        let r = compute_metrics(
            &input(60.0, 3.0, 7.0, "Uttar Pradesh", PanelTechnology::Polycrystalline),
            &policy,
        )
        .unwrap();
        assert_eq!(r.required_kw, 1.0);
        assert_eq!(r.estimated_cost, 26000.0);
        assert_eq!(r.central_subsidy + r.region_subsidy, 45000.0);
        assert_eq!(r.final_cost, 0.0);
        assert_eq!(r.payback_period_years, 0.0);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.01, 0.5)]
    #[case(0.5, 0.5)]
    #[case(2.667, 3.0)]
    #[case(3.0, 3.0)]
    #[case(3.01, 3.5)]
    fn test_quantize_capacity(#[case] raw: f64, #[case] expected: f64) {
        assert_eq!(quantize_capacity(raw), expected);
    }

    #[test]
    fn test_zero_rate_gives_infinite_payback() {
        let policy = SizingPolicy::default();
        let r = compute_metrics(
            &input(300.0, 5.0, 0.0, "Delhi", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap();
        assert_eq!(r.monthly_savings, 0.0);
        assert_eq!(r.payback_period_years, f64::INFINITY);
        assert_eq!(r.payback_label(), "N/A");
    }

    #[test]
    fn test_zero_consumption() {
        let policy = SizingPolicy::default();
        let r = compute_metrics(
            &input(0.0, 5.0, 8.5, "Uttar Pradesh", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap();
        assert_eq!(r.required_kw, 0.0);
        assert_eq!(r.total_panels, 0);
        assert_eq!(r.estimated_cost, 0.0);
        assert_eq!(r.central_subsidy, 0.0);
        assert_eq!(r.region_subsidy, 0.0);
        assert_eq!(r.final_cost, 0.0);
        assert!(r.payback_period_years.is_infinite());
        assert_eq!(r.trees_equivalent, 0);
    }

    #[test]
    fn test_zero_sun_hours_not_computable() {
        let policy = SizingPolicy::default();
        let err = compute_metrics(
            &input(300.0, 0.0, 8.5, "Delhi", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap_err();
        assert_eq!(err, CalculationError::NotComputable { sun_hours_per_day: 0.0 });
    }

    #[rstest]
    #[case(-1.0, 5.0, 8.5, "monthly_consumption_kwh")]
    #[case(300.0, f64::NAN, 8.5, "sun_hours_per_day")]
    #[case(300.0, 5.0, f64::NAN, "electricity_rate_per_kwh")]
    #[case(f64::INFINITY, 5.0, 8.5, "monthly_consumption_kwh")]
    fn test_invalid_inputs_rejected(
        #[case] monthly: f64,
        #[case] sun: f64,
        #[case] rate: f64,
        #[case] expected_field: &str,
    ) {
        let policy = SizingPolicy::default();
        match compute_metrics(&input(monthly, sun, rate, "Delhi", PanelTechnology::DcrPanels), &policy) {
            Err(CalculationError::InvalidInput { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[rstest]
    #[case(-2.0)]
    #[case(-0.0)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_positive_sun_hours_not_computable(#[case] sun: f64) {
        let policy = SizingPolicy::default();
        let err = compute_metrics(&input(300.0, sun, 8.5, "Delhi", PanelTechnology::DcrPanels), &policy);
        match (sun.is_finite(), err) {
            (true, Err(CalculationError::NotComputable { .. })) => {}
            (false, Err(CalculationError::InvalidInput { field, .. })) => assert_eq!(field, "sun_hours_per_day"),
            (_, other) => panic!("unexpected {:?} for sun hours {}", other, sun),
        }
    }

    #[test]
    fn test_vanishing_sun_hours_not_computable() {
        // 10 kWh/day over ~1e-320 h overflows the raw capacity to infinity
        let policy = SizingPolicy::default();
        let err = compute_metrics(
            &input(300.0, 1e-320, 8.5, "Uttar Pradesh", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, CalculationError::NotComputable { .. }), "got {:?}", err);
    }

    #[test]
    fn test_panel_count_overflow_rejected() {
        // Finite capacity, but more panels than a u32 can count
        let policy = SizingPolicy::default();
        let err = compute_metrics(
            &input(1e15, 5.0, 8.5, "Delhi", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, CalculationError::OutOfRange { quantity: "total_panels", .. }), "got {:?}", err);
    }

    #[test]
    fn test_unvalidated_policy_cannot_saturate_casts() {
        let mut policy = SizingPolicy::default();
        policy.standard_panel_wattage_w = 0.0;
        let err = compute_metrics(
            &input(300.0, 5.0, 8.5, "Delhi", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, CalculationError::OutOfRange { quantity: "total_panels", .. }));

        let mut policy = SizingPolicy::default();
        policy.co2_per_tree_per_year = 0.0;
        let err = compute_metrics(
            &input(0.0, 5.0, 8.5, "Delhi", PanelTechnology::DcrPanels),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, CalculationError::OutOfRange { quantity: "trees_equivalent", .. }));
    }

    #[test]
    fn test_missing_panel_spec_rejected() {
        let mut policy = SizingPolicy::default();
        policy.panels.retain(|p| p.technology != PanelTechnology::Polycrystalline);
        let err = compute_metrics(
            &input(300.0, 5.0, 8.5, "Delhi", PanelTechnology::Polycrystalline),
            &policy,
        )
        .unwrap_err();
        assert_eq!(err, CalculationError::UnknownPanelTechnology(PanelTechnology::Polycrystalline));
    }

    fn panel_strategy() -> impl Strategy<Value = PanelTechnology> {
        prop_oneof![
            Just(PanelTechnology::Monocrystalline),
            Just(PanelTechnology::Polycrystalline),
            Just(PanelTechnology::DcrPanels),
        ]
    }

    fn region_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("Uttar Pradesh"), Just("Gujarat"), Just("Somewhere Else")]
    }

    proptest! {
        #[test]
        fn prop_capacity_is_smallest_half_step(
            monthly in 0.1f64..5000.0,
            sun in 0.5f64..12.0,
        ) {
            let policy = SizingPolicy::default();
            let r = compute_metrics(&input(monthly, sun, 8.0, "Delhi", PanelTechnology::DcrPanels), &policy).unwrap();
            let raw_kw = monthly / 30.0 / (sun * 0.75);
            let doubled = r.required_kw * 2.0;
            prop_assert_eq!(doubled.fract(), 0.0);
            prop_assert!(doubled >= raw_kw * 2.0);
            prop_assert!(doubled - 1.0 < raw_kw * 2.0);
        }

        #[test]
        fn prop_panels_cover_capacity(
            monthly in 0.1f64..5000.0,
            sun in 0.5f64..12.0,
        ) {
            let policy = SizingPolicy::default();
            let r = compute_metrics(&input(monthly, sun, 8.0, "Delhi", PanelTechnology::DcrPanels), &policy).unwrap();
            prop_assert!(r.required_kw > 0.0);
            prop_assert!(r.total_panels >= 1);
            prop_assert!(r.total_panels as f64 * 540.0 >= r.required_kw * 1000.0);
        }

        #[test]
        fn prop_net_cost_never_negative(
            monthly in 0.0f64..5000.0,
            sun in 0.5f64..12.0,
            rate in 0.0f64..20.0,
            region in region_strategy(),
            panel in panel_strategy(),
            labor in 0.0f64..15.0,
        ) {
            let mut policy = SizingPolicy::default();
            policy.labor_cost_per_watt = labor;
            let r = compute_metrics(&input(monthly, sun, rate, region, panel), &policy).unwrap();
            prop_assert!(r.final_cost >= 0.0);
            prop_assert!(r.region_subsidy <= 30000.0);
        }

        #[test]
        fn prop_payback_infinite_iff_no_savings(
            monthly in prop_oneof![Just(0.0f64), 1.0f64..2000.0],
            rate in prop_oneof![Just(0.0f64), 0.5f64..20.0],
        ) {
            let policy = SizingPolicy::default();
            let r = compute_metrics(&input(monthly, 5.0, rate, "Uttar Pradesh", PanelTechnology::DcrPanels), &policy).unwrap();
            prop_assert_eq!(!r.payback_period_years.is_finite(), r.monthly_savings == 0.0);
            prop_assert!(!r.payback_period_years.is_nan());
        }

        #[test]
        fn prop_central_subsidy_monotonic(a in 0u32..40, b in 0u32..40) {
            let policy = SizingPolicy::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = incentives::central_subsidy(lo as f64 / 2.0, &policy.central_subsidy_tiers);
            let hi = incentives::central_subsidy(hi as f64 / 2.0, &policy.central_subsidy_tiers);
            prop_assert!(lo <= hi);
        }

        #[test]
        fn prop_idempotent(
            monthly in 0.0f64..5000.0,
            sun in 0.5f64..12.0,
            rate in 0.0f64..20.0,
            region in region_strategy(),
            panel in panel_strategy(),
        ) {
            let policy = SizingPolicy::default();
            let i = input(monthly, sun, rate, region, panel);
            let a = compute_metrics(&i, &policy).unwrap();
            let b = compute_metrics(&i, &policy).unwrap();
            prop_assert_eq!(a.required_kw.to_bits(), b.required_kw.to_bits());
            prop_assert_eq!(a.final_cost.to_bits(), b.final_cost.to_bits());
            prop_assert_eq!(a.payback_period_years.to_bits(), b.payback_period_years.to_bits());
            prop_assert_eq!(a.co2_saved_kg_per_year.to_bits(), b.co2_saved_kg_per_year.to_bits());
            prop_assert_eq!(a, b);
        }
    }
}
