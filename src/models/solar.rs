use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

// ─── Panel technology ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelTechnology {
    Monocrystalline,
    Polycrystalline,
    /// Domestic Content Requirement panels, required for PM Surya Ghar eligibility.
    DcrPanels,
}

impl PanelTechnology {
    pub const ALL: [PanelTechnology; 3] = [
        PanelTechnology::Monocrystalline,
        PanelTechnology::Polycrystalline,
        PanelTechnology::DcrPanels,
    ];
}

impl fmt::Display for PanelTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PanelTechnology::Monocrystalline => "MONOCRYSTALLINE",
            PanelTechnology::Polycrystalline => "POLYCRYSTALLINE",
            PanelTechnology::DcrPanels => "DCR_PANELS",
        };
        f.write_str(label)
    }
}

/// Static parameters of one panel technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PanelSpec {
    pub technology: PanelTechnology,
    /// Module efficiency as a fraction (0..1)
    pub efficiency: f64,
    /// Hardware cost in INR per watt of nameplate capacity
    pub cost_per_watt: f64,
    pub lifespan_years: u32,
    pub description: String,
}

// ─── Calculation input / result ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationInput {
    /// Average monthly household draw (kWh, "units")
    pub monthly_consumption_kwh: f64,
    /// Average peak-sun-equivalent hours per day
    pub sun_hours_per_day: f64,
    /// Tariff in INR per kWh
    pub electricity_rate_per_kwh: f64,
    /// State name; regions without a configured rule get no region subsidy
    pub region: String,
    pub panel_technology: PanelTechnology,
}

/// Output of the sizing model. Built fresh on every call, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CalculationResult {
    /// Installed capacity in kW, rounded up to a 0.5 kW step
    pub required_kw: f64,
    pub total_panels: u32,
    pub hardware_cost: f64,
    pub installation_cost: f64,
    /// Hardware + installation, before subsidies
    pub estimated_cost: f64,
    pub central_subsidy: f64,
    pub region_subsidy: f64,
    /// Net investment after subsidies, never negative
    pub final_cost: f64,
    pub monthly_savings: f64,
    /// Infinite when there are no savings; serialized as `null` in that case
    #[serde(serialize_with = "finite_or_null")]
    #[schema(value_type = Option<f64>)]
    pub payback_period_years: f64,
    pub co2_saved_kg_per_year: f64,
    pub trees_equivalent: u64,
}

impl CalculationResult {
    pub fn payback_is_finite(&self) -> bool {
        self.payback_period_years.is_finite()
    }

    /// Human-readable payback, `N/A` when the period is unbounded.
    pub fn payback_label(&self) -> String {
        if self.payback_is_finite() {
            format!("{:.1} years", self.payback_period_years)
        } else {
            "N/A".to_string()
        }
    }
}

fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

/// One year of the cumulative savings curve.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectionPoint {
    pub year: u32,
    /// Chart label, e.g. `Y3`
    pub label: String,
    pub cumulative_savings: i64,
    /// Cumulative savings minus the net investment
    pub net_benefit: i64,
}

// ─── Advisory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Advice {
    pub summary: String,
    pub benefits: Vec<String>,
    pub recommendations: String,
}

// ─── Generative Language wire types ──────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

// ─── REST API response types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct CalculationResponse {
    pub timestamp: DateTime<Utc>,
    /// Generation number assigned to this calculation
    pub generation: u64,
    /// True when a newer calculation started before this one's advice arrived
    pub superseded: bool,
    pub input: CalculationInput,
    pub result: CalculationResult,
    pub payback_label: String,
    pub projection: Vec<ProjectionPoint>,
    pub advice: Advice,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub result: CalculationResult,
    pub payback_label: String,
}

/// Content of the last-write-wins result slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LatestCalculation {
    pub generation: u64,
    pub computed_at: DateTime<Utc>,
    pub input: CalculationInput,
    pub result: CalculationResult,
    /// Absent until the advice for this generation has arrived
    pub advice: Option<Advice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionInfo {
    pub name: String,
    pub has_region_incentive: bool,
}
