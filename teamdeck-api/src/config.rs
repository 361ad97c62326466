/// Configuration management for the API server
///
/// Loads configuration from environment variables into a typed struct.
/// Validation happens once at startup; a missing or undersized secret
/// aborts the process before it can serve a request.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: bind host (default: 0.0.0.0)
/// - `API_PORT`: bind port (default: 8080)
/// - `API_CORS_ORIGINS`: comma-separated origins, `*` for permissive (default: *)
/// - `API_PRODUCTION`: enables HSTS and strict CORS (default: false)
/// - `JWT_ACCESS_SECRET`: access-token signing key, >= 32 chars (required)
/// - `JWT_REFRESH_SECRET`: refresh-token signing key, >= 32 chars (required)
/// - `ACCESS_TOKEN_TTL_MINUTES`: access-token lifetime (default: 15)
/// - `REFRESH_TOKEN_TTL_DAYS`: refresh-token lifetime (default: 7)
/// - `REDIS_URL`: rate-limiter backend; limiter disabled when unset
///
/// # Example
///
/// ```no_run
/// use teamdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("listening on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use teamdeck_shared::auth::session::TokenSettings;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Redis configuration (rate limiting)
    pub redis: RedisConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS, strict headers)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// JWT configuration
///
/// Access and refresh tokens use separate signing keys. Generate each
/// with: `openssl rand -hex 32`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for access-token signing
    pub access_secret: String,

    /// Secret key for refresh-token signing
    pub refresh_secret: String,

    /// Access-token lifetime in minutes
    pub access_ttl_minutes: i64,

    /// Refresh-token lifetime in days
    pub refresh_ttl_days: i64,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL; the auth rate limiter is disabled when unset
    pub url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value fails to
    /// parse, or a JWT secret is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (development convenience)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("API_CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("API_PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let access_secret = env::var("JWT_ACCESS_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_ACCESS_SECRET environment variable is required"))?;
        let refresh_secret = env::var("JWT_REFRESH_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_REFRESH_SECRET environment variable is required"))?;

        if access_secret.len() < 32 {
            anyhow::bail!("JWT_ACCESS_SECRET must be at least 32 characters long");
        }
        if refresh_secret.len() < 32 {
            anyhow::bail!("JWT_REFRESH_SECRET must be at least 32 characters long");
        }

        let access_ttl_minutes = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()?;
        let refresh_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;

        let redis_url = env::var("REDIS_URL").ok();

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            redis: RedisConfig { url: redis_url },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the session service's token settings
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings::new(
            self.jwt.access_secret.clone(),
            self.jwt.refresh_secret.clone(),
        )
        .with_lifetimes(
            Duration::minutes(self.jwt.access_ttl_minutes),
            Duration::days(self.jwt.refresh_ttl_days),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                access_secret: "access-secret-key-at-least-32-bytes!".to_string(),
                refresh_secret: "refresh-secret-key-at-least-32-byte".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            redis: RedisConfig { url: None },
        }
    }

    #[test]
    fn test_bind_address() {
        let config = test_config();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_token_settings() {
        let config = test_config();
        let settings = config.token_settings();

        assert_eq!(settings.access_secret, config.jwt.access_secret);
        assert_eq!(settings.refresh_secret, config.jwt.refresh_secret);
        assert_eq!(settings.access_ttl, Duration::minutes(15));
        assert_eq!(settings.refresh_ttl, Duration::days(7));
    }
}
