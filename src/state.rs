use crate::config::Config;
use crate::storage::Storage;
use std::sync::Arc;

/// Shared state handed to every page and admin handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    /// Public base URL, used in feeds and `openstatesUrl`
    pub site_url: String,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, site_url: impl Into<String>) -> Self {
        Self {
            storage,
            site_url: site_url.into().trim_end_matches('/').to_string(),
            admin_token: None,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            admin_token: config.admin.token.clone(),
            ..Self::new(storage, config.server.site_url.clone())
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }
}
