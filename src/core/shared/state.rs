use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::crm::CrmServices;

/// Shared handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub crm: CrmServices,
}

impl AppState {
    pub fn new(config: AppConfig, crm: CrmServices) -> Self {
        Self {
            config: Arc::new(config),
            crm,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
