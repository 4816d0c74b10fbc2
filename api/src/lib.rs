pub mod config;
pub mod estimate_form;
pub mod handlers;
pub mod page;
pub mod startup;

use blueprint_estimator::EstimationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<EstimationService>,
}

impl AppState {
    pub fn new(estimator: Arc<EstimationService>) -> Self {
        Self { estimator }
    }
}
