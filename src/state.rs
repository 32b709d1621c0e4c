use std::sync::Arc;

use crate::config::Config;
use crate::lifecycle::LifecycleManager;
use crate::store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle manager over the entity store
    pub manager: LifecycleManager,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            manager: LifecycleManager::new(store),
            config: Arc::new(config),
        }
    }

    /// Entity store, for the thin credential endpoints that bypass the manager
    pub fn store(&self) -> &Arc<dyn Store> {
        self.manager.store()
    }
}
