use std::{fmt, sync::Arc};

use gatekeep_config::Config;
use gatekeep_core::AuthCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<AuthCoordinator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(coordinator: AuthCoordinator, config: Arc<Config>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            config,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
