use std::{sync::Arc, time::Duration};

use anyhow::Context;
use dhandraft_core::{Database, JwtManager, PasswordHasher, Settings};

use crate::{
    limits::UserRateLimiter,
    metrics::Metrics,
    realtime::{AlertHub, ChatHub},
};

/// Shared by every handler and socket task; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub passwords: PasswordHasher,
    pub alert_hub: Arc<AlertHub>,
    pub chat_hub: Arc<ChatHub>,
    /// One accepted chat message per user per `chat.min_interval_secs`.
    pub chat_limiter: Arc<UserRateLimiter>,
    pub api_limiter: Arc<UserRateLimiter>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(settings: Settings, db: Database) -> anyhow::Result<Self> {
        let jwt = JwtManager::from_config(&settings.auth);
        let chat_limiter =
            UserRateLimiter::one_per(Duration::from_secs(settings.chat.min_interval_secs));
        let api_limiter = UserRateLimiter::per_minute(settings.security.rate_limit_per_minute);
        let metrics = Metrics::new().context("registering metrics")?;

        Ok(Self {
            settings: Arc::new(settings),
            db,
            jwt: Arc::new(jwt),
            passwords: PasswordHasher::new(),
            alert_hub: Arc::new(AlertHub::new()),
            chat_hub: Arc::new(ChatHub::new()),
            chat_limiter: Arc::new(chat_limiter),
            api_limiter: Arc::new(api_limiter),
            metrics: Arc::new(metrics),
        })
    }

    /// State over a fresh in-memory database.
    pub fn in_memory(settings: Settings) -> anyhow::Result<Self> {
        Self::new(settings, Database::in_memory())
    }
}
