pub mod config;
pub mod error;
pub mod models;
pub mod security;
pub mod storage;

pub use config::{
    AlertsConfig, AuthConfig, ChatConfig, ConfigManager, CorsConfig, DatabaseConfig,
    LoggingConfig, SecurityConfig, SeedConfig, ServerConfig, Settings, StorageBackendKind,
    INSECURE_DEFAULT_SECRET, MAX_DAYS,
};
pub use error::*;
pub use models::*;
pub use security::{Claims, JwtManager, PasswordHasher};
pub use storage::*;
