use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// Secure flag on session cookies. Always true in production.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides (DATABASE_URL itself is read at pool creation)
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_IDLE_TIMEOUT_SECS") {
            self.database.idle_timeout_secs = v.parse().unwrap_or(self.database.idle_timeout_secs);
        }

        // Auth overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.auth.access_secret = v;
        }
        if let Ok(v) = env::var("JWT_REFRESH_SECRET") {
            self.auth.refresh_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_TTL_MINUTES") {
            self.auth.access_ttl_minutes = v.parse().unwrap_or(self.auth.access_ttl_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_TTL_DAYS") {
            self.auth.refresh_ttl_days = v.parse().unwrap_or(self.auth.refresh_ttl_days);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
            },
            auth: AuthConfig {
                // Dev-only fallbacks; real deployments set JWT_SECRET / JWT_REFRESH_SECRET
                access_secret: "dev-access-secret-change-me".to_string(),
                refresh_secret: "dev-refresh-secret-change-me".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                secure_cookies: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
                idle_timeout_secs: 300,
            },
            auth: AuthConfig {
                // Must come from the environment; token issuance fails closed if empty
                access_secret: String::new(),
                refresh_secret: String::new(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                secure_cookies: true,
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
