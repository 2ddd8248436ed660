use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ConfigError;
use crate::models::solar::{PanelSpec, PanelTechnology};

fn default_port() -> u16 { 8080 }

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub policy: SizingPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// Remote text-generation backend used for the advisory summary.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_s: u64,
    /// Firm name the prompt speaks for
    pub consultant_name: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_s: 15,
            consultant_name: "Parth solar solutions".to_string(),
        }
    }
}

// ─── Sizing policy ───────────────────────────────────────────────────────────

/// Jurisdiction-specific constants read by the sizing model.
///
/// Every field has a default matching the current Indian residential scheme,
/// so a config file only needs to list what it overrides.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
#[serde(default)]
pub struct SizingPolicy {
    /// Fixed month length used to derive daily energy need
    pub days_per_month: f64,
    /// Derating for dust, heat, inverter and wiring losses (< 1)
    pub system_loss_factor: f64,
    /// Nameplate wattage of one panel unit
    pub standard_panel_wattage_w: f64,
    pub labor_cost_per_watt: f64,
    /// Grid carbon intensity, kg CO2 per kWh
    pub grid_emission_factor: f64,
    /// CO2 absorbed by one tree per year, kg
    pub co2_per_tree_per_year: f64,
    pub panels: Vec<PanelSpec>,
    /// Central subsidy tiers; order does not matter
    pub central_subsidy_tiers: Vec<SubsidyTier>,
    /// Supported regions, with an optional additional incentive each
    pub regions: Vec<RegionPolicy>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
pub struct SubsidyTier {
    /// Minimum installed capacity (kW) for this tier
    pub min_kw: f64,
    pub amount: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
pub struct RegionPolicy {
    pub name: String,
    #[serde(default)]
    pub rule: Option<RegionRule>,
}

/// Region-specific incentive layered on top of the central subsidy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionRule {
    /// `min(capacity_kw * per_kw_rate, cap)`
    CappedPerKw { per_kw_rate: f64, cap: f64 },
    /// Fixed amount for any non-zero installation
    Flat { amount: f64 },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        let regions = [
            "Uttar Pradesh", "Maharashtra", "Gujarat", "Karnataka", "Tamil Nadu",
            "Rajasthan", "Delhi", "West Bengal", "Madhya Pradesh", "Haryana",
        ]
        .into_iter()
        .map(|name| RegionPolicy {
            name: name.to_string(),
            rule: (name == "Uttar Pradesh").then_some(RegionRule::CappedPerKw {
                per_kw_rate: 15000.0,
                cap: 30000.0,
            }),
        })
        .collect();

        Self {
            days_per_month: 30.0,
            system_loss_factor: 0.75,
            standard_panel_wattage_w: 540.0,
            labor_cost_per_watt: 12.0,
            grid_emission_factor: 0.8,
            co2_per_tree_per_year: 21.0,
            panels: vec![
                PanelSpec {
                    technology: PanelTechnology::Monocrystalline,
                    efficiency: 0.20,
                    cost_per_watt: 32.0,
                    lifespan_years: 25,
                    description: "High performance. Best for cities with limited roof space like Delhi or Mumbai.".to_string(),
                },
                PanelSpec {
                    technology: PanelTechnology::Polycrystalline,
                    efficiency: 0.16,
                    cost_per_watt: 26.0,
                    lifespan_years: 20,
                    description: "Budget-friendly. Widely used in rural solar installations.".to_string(),
                },
                PanelSpec {
                    technology: PanelTechnology::DcrPanels,
                    efficiency: 0.19,
                    cost_per_watt: 35.0,
                    lifespan_years: 25,
                    description: "Made in India. Mandatory for availing PM Surya Ghar subsidies.".to_string(),
                },
            ],
            // PM Surya Ghar: Muft Bijli Yojana
            central_subsidy_tiers: vec![
                SubsidyTier { min_kw: 1.0, amount: 30000.0 },
                SubsidyTier { min_kw: 2.0, amount: 60000.0 },
                SubsidyTier { min_kw: 3.0, amount: 78000.0 },
            ],
            regions,
        }
    }
}

impl SizingPolicy {
    pub fn panel(&self, technology: PanelTechnology) -> Option<&PanelSpec> {
        self.panels.iter().find(|p| p.technology == technology)
    }

    pub fn region_rule(&self, region: &str) -> Option<&RegionRule> {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .and_then(|r| r.rule.as_ref())
    }

    /// Reject constants that would turn the sizing model into inf/NaN output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("days_per_month", self.days_per_month)?;
        positive("system_loss_factor", self.system_loss_factor)?;
        if self.system_loss_factor > 1.0 {
            return Err(ConfigError::Policy(format!(
                "system_loss_factor must be at most 1 (got {})",
                self.system_loss_factor
            )));
        }
        positive("standard_panel_wattage_w", self.standard_panel_wattage_w)?;
        positive("co2_per_tree_per_year", self.co2_per_tree_per_year)?;
        non_negative("labor_cost_per_watt", self.labor_cost_per_watt)?;
        non_negative("grid_emission_factor", self.grid_emission_factor)?;

        for technology in PanelTechnology::ALL {
            let panel = self.panel(technology).ok_or_else(|| {
                ConfigError::Policy(format!("no panel specification for {}", technology))
            })?;
            non_negative("panels.cost_per_watt", panel.cost_per_watt)?;
        }
        for tier in &self.central_subsidy_tiers {
            non_negative("central_subsidy_tiers.min_kw", tier.min_kw)?;
            non_negative("central_subsidy_tiers.amount", tier.amount)?;
        }
        for region in &self.regions {
            match region.rule {
                Some(RegionRule::CappedPerKw { per_kw_rate, cap }) => {
                    non_negative("regions.rule.per_kw_rate", per_kw_rate)?;
                    non_negative("regions.rule.cap", cap)?;
                }
                Some(RegionRule::Flat { amount }) => non_negative("regions.rule.amount", amount)?,
                None => {}
            }
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Policy(format!("{} must be finite and > 0 (got {})", field, value)))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Policy(format!("{} must be finite and >= 0 (got {})", field, value)))
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.policy.validate()?;
        Ok(config)
    }
}
