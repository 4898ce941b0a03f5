use std::sync::Arc;

use crate::captcha::CaptchaVerifier;
use crate::config::ServerConfig;
use crate::notifications::email::Mailer;
use crate::storage::DiskStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: enroll_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Upload persistence rooted at the configured upload directory.
    pub storage: Arc<DiskStorage>,
    /// Captcha verifier for the public agent onboarding form.
    pub captcha: Arc<CaptchaVerifier>,
    /// Outgoing email; `None` when SMTP is not configured.
    pub mailer: Option<Arc<Mailer>>,
}

impl AppState {
    /// Assemble the state from a pool and loaded configuration.
    pub fn new(pool: enroll_db::DbPool, config: ServerConfig) -> Self {
        let storage = Arc::new(DiskStorage::new(config.upload_dir.clone()));
        let captcha = Arc::new(CaptchaVerifier::new(config.captcha.clone()));
        let mailer = config.email.clone().map(|cfg| Arc::new(Mailer::new(cfg)));
        Self {
            pool,
            config: Arc::new(config),
            storage,
            captcha,
            mailer,
        }
    }
}
