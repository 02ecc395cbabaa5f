use crate::config::AppConfig;
use crate::db::Store;

pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Store::new(config.database_url.clone()),
        }
    }
}
