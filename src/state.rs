use std::sync::Arc;

use crate::clients::{recognition::RecognitionService, results_api::ResultsApi};
use crate::config::Config;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub recognition: Arc<dyn RecognitionService>,
    /// `None` when no results API is configured; evaluations are then not persisted.
    pub results_api: Option<ResultsApi>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
