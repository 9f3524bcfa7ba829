use crate::config::AppConfig;
use crate::crypto::{Crypto, CryptoError};
use crate::db::Database;
use crate::middleware::RateLimiter;
use crate::services::notify::Notifier;
use std::sync::Arc;

pub struct AppState {
    pub db: Database,
    pub crypto: Arc<Crypto>,
    pub session_key: Vec<u8>,
    pub config: AppConfig,
    pub notifier: Arc<dyn Notifier>,
    /// Shared by sign-in, sign-up and password reset (10 requests per minute per IP).
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: Database,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CryptoError> {
        let crypto = Arc::new(Crypto::from_key_bytes(&config.enc_key)?);
        Ok(Self {
            db,
            crypto,
            session_key: config.session_key.clone(),
            config,
            notifier,
            auth_limiter: RateLimiter::new(10, 60),
        })
    }
}

pub type SharedState = Arc<AppState>;
