use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use axum::extract::FromRef;
use chrono::Utc;

use crate::config::Config;
use crate::models::solar::{Advice, CalculationInput, CalculationResult, LatestCalculation};
use crate::services::advisory::GeminiClient;

/// Last-write-wins result slot.
///
/// Every calculation takes a new generation number. Results and advice are
/// only written into the slot when they belong to the newest generation, so
/// an advisory response that arrives after a newer calculation has started
/// is dropped.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    generation: Arc<AtomicU64>,
    latest: Arc<RwLock<Option<LatestCalculation>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a calculation; the returned token supersedes all earlier ones.
    pub fn begin_calculation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Store the numeric result for `generation`. Returns false if superseded.
    pub fn publish_result(&self, generation: u64, input: CalculationInput, result: CalculationResult) -> bool {
        let Ok(mut slot) = self.latest.write() else {
            tracing::error!("[STATE] Result slot lock poisoned, generation {} not stored", generation);
            return false;
        };
        if !self.is_current(generation) {
            return false;
        }
        *slot = Some(LatestCalculation {
            generation,
            computed_at: Utc::now(),
            input,
            result,
            advice: None,
        });
        true
    }

    /// Attach advice to the slot if it still holds `generation`. Returns false
    /// when the advice is stale and was discarded.
    pub fn attach_advice(&self, generation: u64, advice: Advice) -> bool {
        let Ok(mut slot) = self.latest.write() else {
            tracing::error!("[STATE] Result slot lock poisoned, generation {} not stored", generation);
            return false;
        };
        if !self.is_current(generation) {
            return false;
        }
        match slot.as_mut() {
            Some(latest) if latest.generation == generation => {
                latest.advice = Some(advice);
                true
            }
            _ => false,
        }
    }

    pub fn latest(&self) -> Option<LatestCalculation> {
        match self.latest.read() {
            Ok(slot) => slot.clone(),
            Err(_) => {
                tracing::error!("[STATE] Result slot lock poisoned, latest calculation unavailable");
                None
            }
        }
    }
}

/// Router state; handlers extract the parts they need via `FromRef`.
#[derive(Clone, Debug)]
pub struct SharedState {
    pub app: AppState,
    pub config: Config,
    pub advisor: GeminiClient,
}

impl FromRef<SharedState> for AppState {
    fn from_ref(shared: &SharedState) -> Self {
        shared.app.clone()
    }
}

impl FromRef<SharedState> for Config {
    fn from_ref(shared: &SharedState) -> Self {
        shared.config.clone()
    }
}

impl FromRef<SharedState> for GeminiClient {
    fn from_ref(shared: &SharedState) -> Self {
        shared.advisor.clone()
    }
}
