//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::products::ProductStore;

/// State shared across all HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub products: Arc<ProductStore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let products = Arc::new(ProductStore::load(&config.products_path));
        Self {
            config: Arc::new(config),
            products,
        }
    }
}
