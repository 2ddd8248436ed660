use std::future::Future;
use std::time::Duration;

use crate::config::AdvisoryConfig;
use crate::errors::AdvisoryError;
use crate::models::solar::{
    Advice, CalculationInput, CalculationResult, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part,
};

/// Anything able to turn a prompt into structured advice.
pub trait AdviceSource {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<Advice, AdvisoryError>> + Send;
}

/// Client for the Generative Language `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    cfg: AdvisoryConfig,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(cfg: AdvisoryConfig, api_key: Option<String>) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_s.max(1)))
            .build()?;
        Ok(Self { http, cfg, api_key })
    }

    /// Reads the API key from the environment variable named in the config.
    pub fn from_env(cfg: AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        Self::new(cfg, api_key)
    }

    pub fn consultant_name(&self) -> &str {
        &self.cfg.consultant_name
    }

    pub fn is_ready(&self) -> bool {
        self.cfg.enabled && self.api_key.is_some()
    }
}

impl AdviceSource for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Advice, AdvisoryError> {
        if !self.cfg.enabled {
            return Err(AdvisoryError::Disabled);
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdvisoryError::MissingApiKey(self.cfg.api_key_env.clone()))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.endpoint.trim_end_matches('/'),
            self.cfg.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt.to_string()) }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: advice_schema(),
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AdvisoryError::Status(response.status().as_u16()));
        }
        let envelope = response.json::<GenerateContentResponse>().await?;
        parse_advice(&envelope)
    }
}

fn advice_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "benefits": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendations": { "type": "STRING" }
        },
        "required": ["summary", "benefits", "recommendations"]
    })
}

/// Extract the JSON advice carried as text in the first candidate.
pub fn parse_advice(envelope: &GenerateContentResponse) -> Result<Advice, AdvisoryError> {
    let text = envelope
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
        .filter(|t| !t.trim().is_empty())
        .ok_or(AdvisoryError::EmptyResponse)?;
    Ok(serde_json::from_str(text)?)
}

pub fn build_prompt(input: &CalculationInput, result: &CalculationResult, consultant_name: &str) -> String {
    format!(
        "As a solar energy consultant from \"{consultant}\", analyze this installation for a customer in {region}:\n\
         Monthly Bill: {units} units\n\
         System Size: {kw} kW\n\
         Panel Type: {panel}\n\
         Estimated Total Cost: ₹{estimated:.0}\n\
         Central Subsidy (PM Surya Ghar): ₹{central:.0}\n\
         State Subsidy: ₹{regional:.0}\n\
         Net Investment: ₹{net:.0}\n\
         Payback: {payback}\n\n\
         Provide a concise summary, 3 key benefits (mentioning Net Metering or specific Indian policies), \
         and a recommendation for {region} conditions. Maintain a professional yet encouraging tone.",
        consultant = consultant_name,
        region = input.region,
        units = input.monthly_consumption_kwh,
        kw = result.required_kw,
        panel = input.panel_technology,
        estimated = result.estimated_cost,
        central = result.central_subsidy,
        regional = result.region_subsidy,
        net = result.final_cost,
        payback = result.payback_label(),
    )
}

/// Static advice returned whenever generation fails.
pub fn fallback_advice(consultant_name: &str) -> Advice {
    Advice {
        summary: format!(
            "{} highly recommends solar for your location under the PM Surya Ghar scheme.",
            consultant_name
        ),
        benefits: vec![
            "Eliminate up to 300 units of monthly billing".to_string(),
            "Fastest ROI with current Indian subsidies".to_string(),
            "Reliable energy during peak Indian summer".to_string(),
        ],
        recommendations: "We recommend DCR panels for full subsidy eligibility and long-term durability in local weather.".to_string(),
    }
}

/// One attempt at remote advice; any failure falls back to static text.
pub async fn get_advice<S: AdviceSource>(
    source: &S,
    input: &CalculationInput,
    result: &CalculationResult,
    consultant_name: &str,
) -> Advice {
    let prompt = build_prompt(input, result, consultant_name);
    match source.generate(&prompt).await {
        Ok(advice) => advice,
        Err(e) => {
            tracing::warn!("[ADVISORY] Generation failed, using fallback: {}", e);
            fallback_advice(consultant_name)
        }
    }
}
