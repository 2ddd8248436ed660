use crate::models::solar::{CalculationResult, ProjectionPoint};

pub const PROJECTION_YEARS: u32 = 15;

/// Cumulative savings and net benefit for each year of the horizon.
pub fn savings_projection(result: &CalculationResult, years: u32) -> Vec<ProjectionPoint> {
    let annual_savings = result.monthly_savings * 12.0;
    (1..=years)
        .map(|year| {
            let cumulative = annual_savings * year as f64;
            ProjectionPoint {
                year,
                label: format!("Y{}", year),
                cumulative_savings: cumulative.round() as i64,
                net_benefit: (cumulative - result.final_cost).round() as i64,
            }
        })
        .collect()
}
