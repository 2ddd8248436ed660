use utoipa::OpenApi;
use crate::controllers::calculator_controller;
use crate::models::solar;
use crate::config;

#[derive(OpenApi)]
#[openapi(
    paths(
        calculator_controller::calculate,
        calculator_controller::compute,
        calculator_controller::get_latest,
        calculator_controller::list_panels,
        calculator_controller::list_regions,
        calculator_controller::get_policy
    ),
    components(
        schemas(
            solar::CalculationInput,
            solar::CalculationResult,
            solar::CalculationResponse,
            solar::MetricsResponse,
            solar::LatestCalculation,
            solar::PanelSpec,
            solar::PanelTechnology,
            solar::ProjectionPoint,
            solar::Advice,
            solar::RegionInfo,
            config::SizingPolicy,
            config::SubsidyTier,
            config::RegionPolicy,
            config::RegionRule
        )
    ),
    tags(
        (name = "solar-roi-calc", description = "Residential Solar Sizing & ROI API")
    )
)]
pub struct ApiDoc;
