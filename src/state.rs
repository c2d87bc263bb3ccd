use std::sync::Arc;

use crate::{assignments::AssignmentCoordinator, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub assignments: Arc<AssignmentCoordinator>,
}

impl AppState {
    pub fn new(config: AppConfig, assignments: AssignmentCoordinator) -> Self {
        Self {
            config: Arc::new(config),
            assignments: Arc::new(assignments),
        }
    }
}
