use axum::{routing::{get, post}, Router};
use crate::controllers::calculator_controller::{
    calculate, compute, get_latest, get_policy, list_panels, list_regions,
};
use crate::shared_state::SharedState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>`, `State<Config>` and `State<GeminiClient>`
/// via `FromRef<SharedState>`.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/calculate",            post(calculate))
        .route("/metrics",              post(compute))
        .route("/calculations/latest",  get(get_latest))
        .route("/panels",               get(list_panels))
        .route("/regions",              get(list_regions))
        .route("/policy",               get(get_policy))
        .with_state(shared)
}
