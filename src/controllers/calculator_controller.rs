use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::{Config, SizingPolicy};
use crate::errors::CalculationError;
use crate::models::solar::{
    CalculationInput, CalculationResponse, LatestCalculation, MetricsResponse, PanelSpec, RegionInfo,
};
use crate::services::advisory::{self, GeminiClient};
use crate::services::projection::{savings_projection, PROJECTION_YEARS};
use crate::services::sizing::compute_metrics;
use crate::shared_state::AppState;

fn calculation_error(e: CalculationError) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({"error": e.to_string()}))).into_response()
}

/// POST /api/calculate
/// Size a system and generate advisory text
///
/// Computes capacity, costs, subsidies, payback and environmental impact, then
/// asks the text-generation backend for advice. Advice falls back to static
/// text on any failure. Only the newest calculation is kept as "latest".
#[utoipa::path(
    post,
    path = "/api/calculate",
    request_body = CalculationInput,
    responses(
        (status = 200, description = "Sizing result with projection and advice", body = CalculationResponse),
        (status = 422, description = "Input cannot be sized")
    )
)]
pub async fn calculate(
    State(state): State<AppState>,
    State(config): State<Config>,
    State(advisor): State<GeminiClient>,
    Json(input): Json<CalculationInput>,
) -> impl IntoResponse {
    let result = match compute_metrics(&input, &config.policy) {
        Ok(r) => r,
        Err(e) => {
            tracing::info!("[CALC] {} rejected: {}", input.region, e);
            return calculation_error(e);
        }
    };
    // Only a computable request may supersede the current calculation.
    let generation = state.begin_calculation();
    tracing::info!(
        "[CALC] #{} {} | {} kW | {} panels | net ₹{:.0} | payback {}",
        generation, input.region, result.required_kw, result.total_panels,
        result.final_cost, result.payback_label()
    );
    state.publish_result(generation, input.clone(), result.clone());

    let advice = advisory::get_advice(&advisor, &input, &result, advisor.consultant_name()).await;
    let superseded = !state.attach_advice(generation, advice.clone());
    if superseded {
        tracing::info!("[ADVISORY] #{} superseded by #{}, advice not stored", generation, state.current_generation());
    }

    let response = CalculationResponse {
        timestamp: chrono::Utc::now(),
        generation,
        superseded,
        projection: savings_projection(&result, PROJECTION_YEARS),
        payback_label: result.payback_label(),
        input,
        result,
        advice,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// POST /api/metrics
/// Size a system without advisory text
///
/// Pure computation; does not touch the latest-calculation slot.
#[utoipa::path(
    post,
    path = "/api/metrics",
    request_body = CalculationInput,
    responses(
        (status = 200, description = "Sizing result", body = MetricsResponse),
        (status = 422, description = "Input cannot be sized")
    )
)]
pub async fn compute(
    State(config): State<Config>,
    Json(input): Json<CalculationInput>,
) -> impl IntoResponse {
    match compute_metrics(&input, &config.policy) {
        Ok(result) => {
            let response = MetricsResponse {
                timestamp: chrono::Utc::now(),
                payback_label: result.payback_label(),
                result,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => calculation_error(e),
    }
}

/// GET /api/calculations/latest
/// Get the most recent calculation
#[utoipa::path(
    get,
    path = "/api/calculations/latest",
    responses(
        (status = 200, description = "Most recent calculation", body = LatestCalculation),
        (status = 404, description = "Nothing calculated yet")
    )
)]
pub async fn get_latest(State(state): State<AppState>) -> impl IntoResponse {
    match state.latest() {
        Some(latest) => (StatusCode::OK, Json(latest)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "No calculation yet"}))).into_response(),
    }
}

/// GET /api/panels
/// List panel technologies
#[utoipa::path(
    get,
    path = "/api/panels",
    responses(
        (status = 200, description = "Panel catalog", body = Vec<PanelSpec>)
    )
)]
pub async fn list_panels(State(config): State<Config>) -> impl IntoResponse {
    Json(config.policy.panels).into_response()
}

/// GET /api/regions
/// List supported regions
///
/// Regions flagged with `has_region_incentive` get an additional subsidy on
/// top of the central scheme.
#[utoipa::path(
    get,
    path = "/api/regions",
    responses(
        (status = 200, description = "Supported regions", body = Vec<RegionInfo>)
    )
)]
pub async fn list_regions(State(config): State<Config>) -> impl IntoResponse {
    let regions: Vec<RegionInfo> = config
        .policy
        .regions
        .iter()
        .map(|r| RegionInfo {
            name: r.name.clone(),
            has_region_incentive: r.rule.is_some(),
        })
        .collect();
    Json(regions).into_response()
}

/// GET /api/policy
/// Get the active sizing policy
#[utoipa::path(
    get,
    path = "/api/policy",
    responses(
        (status = 200, description = "Constants, tiers and region rules in effect", body = SizingPolicy)
    )
)]
pub async fn get_policy(State(config): State<Config>) -> impl IntoResponse {
    Json(config.policy).into_response()
}
