//! Shared application state
//!
//! One `AppState` is built at startup and cloned into every request handler.

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseService,
    pub services: Arc<ServiceFactory>,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseService) -> Self {
        let services = ServiceFactory::new(db.clone(), settings.clone());
        Self {
            settings: Arc::new(settings),
            db,
            services: Arc::new(services),
        }
    }
}
