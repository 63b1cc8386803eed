use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration. Built once in `main` and carried in `AppState`;
/// nothing on the request path reads the environment directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

/// Which authentication flow this deployment exposes. Exactly one is live;
/// endpoints of the other mode return 404 so the two identity-resolution
/// paths can never race on the same users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Frictionless login-by-name: users are created on first login.
    NameOnly,
    /// Email + password signup/signin with bcrypt hashing.
    Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub session_ttl_days: i64,
    pub auth_mode: AuthMode,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Incoming-webhook URL for mention notifications. Dispatch is skipped
    /// entirely when unset.
    pub webhook_url: Option<String>,
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
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs =
                v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_DAYS") {
            self.security.session_ttl_days = v.parse().unwrap_or(self.security.session_ttl_days);
        }
        if let Ok(v) = env::var("CALENDAR_AUTH_MODE") {
            self.security.auth_mode = match v.as_str() {
                "credentials" => AuthMode::Credentials,
                _ => AuthMode::NameOnly,
            };
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(v) = env::var("NOTIFY_WEBHOOK_URL") {
            if !v.is_empty() {
                self.notifications.webhook_url = Some(v);
            }
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000, request_timeout_secs: 30 },
            database: DatabaseConfig { max_connections: 10, connect_timeout_secs: 30 },
            security: SecurityConfig {
                jwt_secret: "development-secret-do-not-use-in-production".to_string(),
                session_ttl_days: 7,
                auth_mode: AuthMode::NameOnly,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
            notifications: NotificationConfig { webhook_url: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000, request_timeout_secs: 15 },
            database: DatabaseConfig { max_connections: 50, connect_timeout_secs: 5 },
            security: SecurityConfig {
                // Must come from JWT_SECRET; startup refuses an empty secret
                jwt_secret: String::new(),
                session_ttl_days: 7,
                auth_mode: AuthMode::NameOnly,
                cors_origins: vec![],
            },
            notifications: NotificationConfig { webhook_url: None },
        }
    }
}
