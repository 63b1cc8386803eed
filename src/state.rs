use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::notification_service::Notifier;

/// Shared application state, constructed once at startup and threaded into
/// every handler through axum's `State` extractor. The pool is the only
/// shared mutable resource in the process.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, config: Arc::new(config), notifier }
    }
}
