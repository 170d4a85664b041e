use std::sync::Arc;

use crate::authorization::AuthorizationResolver;
use crate::config::AppConfig;
use crate::database::PersonStore;
use crate::observer::EventDispatcher;
use crate::services::PersonService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub persons: Arc<PersonService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PersonStore>,
        resolver: Arc<dyn AuthorizationResolver>,
        dispatcher: EventDispatcher,
        config: AppConfig,
    ) -> Self {
        let config = Arc::new(config);
        let persons = PersonService::new(store, resolver, Arc::new(dispatcher), config.clone());
        Self {
            persons: Arc::new(persons),
            config,
        }
    }
}
