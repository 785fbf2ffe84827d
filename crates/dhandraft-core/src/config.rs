use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Upper bound for day-valued settings; keeps timestamp arithmetic in range.
pub const MAX_DAYS: i64 = 36_500;

/// Signing secret used when nothing is configured. Startup warns loudly when it is in effect.
pub const INSECURE_DEFAULT_SECRET: &str = "INSECURE-DEFAULT-SECRET-CHANGE-IN-PRODUCTION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8001,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    #[serde(rename = "rocksdb")]
    RocksDb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Directory for the RocksDB backend; ignored by the in-memory backend.
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: String,
}

impl DatabaseConfig {
    fn default_path() -> String {
        "data/dhandraft.db".to_string()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    // Never serialized; comes from config files or env only.
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<SecretString>,
    #[serde(default = "AuthConfig::default_expiration_days")]
    pub jwt_expiration_days: i64,
}

impl AuthConfig {
    fn default_expiration_days() -> i64 {
        7
    }

    pub fn secret(&self) -> &str {
        self.jwt_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .unwrap_or(INSECURE_DEFAULT_SECRET)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret() == INSECURE_DEFAULT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_days: Self::default_expiration_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "CorsConfig::default_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn default_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages replayed to a socket right after it connects.
    #[serde(default = "ChatConfig::default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "ChatConfig::default_max_message_chars")]
    pub max_message_chars: usize,
    /// Minimum spacing between two accepted messages of the same user.
    #[serde(default = "ChatConfig::default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "ChatConfig::default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "ChatConfig::default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl ChatConfig {
    fn default_history_limit() -> usize {
        50
    }

    fn default_max_message_chars() -> usize {
        500
    }

    fn default_min_interval_secs() -> u64 {
        2
    }

    fn default_retention_days() -> i64 {
        30
    }

    fn default_sweep_interval_secs() -> u64 {
        3600
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: Self::default_history_limit(),
            max_message_chars: Self::default_max_message_chars(),
            min_interval_secs: Self::default_min_interval_secs(),
            retention_days: Self::default_retention_days(),
            sweep_interval_secs: Self::default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "AlertsConfig::default_impact_threshold")]
    pub impact_threshold: u32,
    #[serde(default = "AlertsConfig::default_high_severity_threshold")]
    pub high_severity_threshold: u32,
}

impl AlertsConfig {
    fn default_impact_threshold() -> u32 {
        75
    }

    fn default_high_severity_threshold() -> u32 {
        85
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            impact_threshold: Self::default_impact_threshold(),
            high_severity_threshold: Self::default_high_severity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "SecurityConfig::default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

impl SecurityConfig {
    fn default_rate_limit() -> u32 {
        1200
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: Self::default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "SeedConfig::default_demo_data")]
    pub demo_data: bool,
}

impl SeedConfig {
    fn default_demo_data() -> bool {
        true
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_data: Self::default_demo_data(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            chat: ChatConfig::default(),
            alerts: AlertsConfig::default(),
            security: SecurityConfig::default(),
            seed: SeedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.host.trim().is_empty(),
            "server.host cannot be empty"
        );
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");
        anyhow::ensure!(
            (1..=MAX_DAYS).contains(&self.auth.jwt_expiration_days),
            "auth.jwt_expiration_days must be between 1 and {MAX_DAYS}"
        );
        anyhow::ensure!(
            (1..=MAX_DAYS).contains(&self.chat.retention_days),
            "chat.retention_days must be between 1 and {MAX_DAYS}"
        );
        anyhow::ensure!(
            self.chat.max_message_chars > 0,
            "chat.max_message_chars must be > 0"
        );
        anyhow::ensure!(
            self.chat.min_interval_secs > 0,
            "chat.min_interval_secs must be > 0"
        );
        anyhow::ensure!(
            self.security.rate_limit_per_minute > 0,
            "security.rate_limit_per_minute must be > 0"
        );
        if self.database.backend == StorageBackendKind::RocksDb {
            anyhow::ensure!(
                !self.database.path.trim().is_empty(),
                "database.path cannot be empty"
            );
        }
        Ok(())
    }
}

/// Loads [`Settings`] from layered config files and the environment.
pub struct ConfigManager;

impl ConfigManager {
    /// `./config` when it exists, otherwise the current directory.
    pub fn default_config_dir() -> PathBuf {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            project_config
        } else {
            cwd
        }
    }

    pub fn load(config_dir: Option<PathBuf>, env_override: Option<String>) -> Result<Settings> {
        let config_dir = config_dir.unwrap_or_else(Self::default_config_dir);
        let env_name = env_override.unwrap_or_else(Settings::default_env);
        info!("Using config directory: {:?} (env: {})", config_dir, env_name);

        let mut settings = Self::load_from_sources(&config_dir, &env_name)?;
        settings.env = env_name;
        Self::apply_legacy_env(&mut settings)?;
        settings.validate()?;

        if settings.auth.uses_default_secret() {
            warn!("Using default JWT secret! Set JWT_SECRET or DHANDRAFT__AUTH__JWT_SECRET in production!");
        }
        Ok(settings)
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let settings: Settings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.json", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(cfg::Environment::with_prefix("DHANDRAFT").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }

    /// Variables understood by earlier deployments of the service.
    fn apply_legacy_env(settings: &mut Settings) -> Result<()> {
        if let Ok(secret) = env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                settings.auth.jwt_secret = Some(SecretString::from(secret));
            }
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            settings.cors.allowed_origins = parse_origins(&origins);
        }
        if let Ok(port) = env::var("PORT") {
            settings.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        Ok(())
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.chat.history_limit, 50);
        assert_eq!(settings.chat.min_interval_secs, 2);
        assert_eq!(settings.auth.jwt_expiration_days, 7);
        assert!(settings.auth.uses_default_secret());
        assert!(settings.cors.allows_any());
    }

    #[test]
    fn rejects_zero_rate_window() {
        let mut settings = Settings::default();
        settings.chat.min_interval_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_day_counts() {
        for days in [0, -1, MAX_DAYS + 1, 1_000_000_000] {
            let mut settings = Settings::default();
            settings.chat.retention_days = days;
            assert!(settings.validate().is_err(), "retention_days = {days}");

            let mut settings = Settings::default();
            settings.auth.jwt_expiration_days = days;
            assert!(settings.validate().is_err(), "jwt_expiration_days = {days}");
        }

        let mut settings = Settings::default();
        settings.chat.retention_days = MAX_DAYS;
        settings.auth.jwt_expiration_days = MAX_DAYS;
        settings.validate().unwrap();
    }

    #[test]
    fn loads_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
host = "127.0.0.1"
port = 9000

[chat]
history_limit = 10

[auth]
jwt_secret = "a-very-long-test-secret-value-0123456789"
"#,
        )
        .unwrap();

        let settings = ConfigManager::load_from_sources(dir.path(), "test").unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.chat.history_limit, 10);
        assert_eq!(settings.chat.max_message_chars, 500);
        assert_eq!(settings.auth.secret(), "a-very-long-test-secret-value-0123456789");
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
