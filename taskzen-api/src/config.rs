/// Configuration management for the API server
///
/// Loads configuration from environment variables into typed structs at
/// startup. Nothing reads the environment after boot; every component gets
/// its configuration injected at construction.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: `*`)
/// - `JWT_SECRET`: Secret key for token signing (required, >= 32 bytes)
/// - `JWT_SESSION_TTL_SECONDS`: Register/login token lifetime (default: 86400)
/// - `JWT_OAUTH_TTL_SECONDS`: OAuth callback token lifetime (default: 3600)
/// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` / `GOOGLE_REDIRECT_URL`:
///   Google OAuth app (optional; Google login disabled when absent)
/// - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET` / `GITHUB_REDIRECT_URL`:
///   GitHub OAuth app (optional; GitHub login disabled when absent)
/// - `FRONTEND_OAUTH_CALLBACK_URL`: Where successful OAuth logins land
/// - `FRONTEND_OAUTH_FAILURE_URL`: Where failed OAuth logins land
/// - `AI_SERVICE_URL`: Base URL of the prioritization service (optional)
/// - `RUST_LOG`: Log level (default: info)
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// OAuth provider configuration
    pub oauth: OAuthConfig,

    /// External AI prioritization service
    pub ai: AiConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; a single `*` entry means permissive
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
///
/// The two TTLs are policy, not literals: register/login issue
/// session-class tokens while OAuth callbacks issue shorter-lived ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// Must be kept secret and at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Lifetime of tokens issued by register/login (seconds)
    pub session_ttl_seconds: i64,

    /// Lifetime of tokens issued by OAuth callbacks (seconds)
    pub oauth_ttl_seconds: i64,
}

impl JwtConfig {
    /// Session token lifetime as a duration
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    /// OAuth callback token lifetime as a duration
    pub fn oauth_ttl(&self) -> Duration {
        Duration::seconds(self.oauth_ttl_seconds)
    }
}

/// Credentials for one OAuth provider application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProvider {
    /// OAuth application client id
    pub client_id: String,

    /// OAuth application client secret
    pub client_secret: String,

    /// Callback URL registered with the provider
    pub redirect_url: String,
}

/// OAuth configuration
///
/// A provider left unconfigured simply disables that login route; the rest
/// of the server is unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Google OAuth application, if configured
    pub google: Option<OAuthProvider>,

    /// GitHub OAuth application, if configured
    pub github: Option<OAuthProvider>,

    /// Frontend URL that receives the token after a successful OAuth login
    pub frontend_callback_url: String,

    /// Frontend URL that receives failed OAuth logins
    pub frontend_failure_url: String,
}

/// External AI prioritization service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of the service; prioritization is unavailable when absent
    pub service_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or malformed, or
    /// if the signing secret is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let session_ttl_seconds = env::var("JWT_SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<i64>()?;

        let oauth_ttl_seconds = env::var("JWT_OAUTH_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<i64>()?;

        let frontend_callback_url = env::var("FRONTEND_OAUTH_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:3000/oauth/callback".to_string());

        let frontend_failure_url = env::var("FRONTEND_OAUTH_FAILURE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/login?error=oauth".to_string());

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                session_ttl_seconds,
                oauth_ttl_seconds,
            },
            oauth: OAuthConfig {
                google: Self::provider_from_env("GOOGLE"),
                github: Self::provider_from_env("GITHUB"),
                frontend_callback_url,
                frontend_failure_url,
            },
            ai: AiConfig {
                service_url: env::var("AI_SERVICE_URL").ok(),
            },
        })
    }

    /// Reads one provider's credentials; None unless id and secret are both set
    fn provider_from_env(prefix: &str) -> Option<OAuthProvider> {
        let client_id = env::var(format!("{}_CLIENT_ID", prefix)).ok()?;
        let client_secret = env::var(format!("{}_CLIENT_SECRET", prefix)).ok()?;
        let redirect_url = env::var(format!("{}_REDIRECT_URL", prefix)).unwrap_or_else(|_| {
            format!(
                "http://localhost:8080/auth/{}/callback",
                prefix.to_lowercase()
            )
        });

        Some(OAuthProvider {
            client_id,
            client_secret,
            redirect_url,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
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
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                session_ttl_seconds: 86400,
                oauth_ttl_seconds: 3600,
            },
            oauth: OAuthConfig {
                google: None,
                github: None,
                frontend_callback_url: "http://localhost:3000/oauth/callback".to_string(),
                frontend_failure_url: "http://localhost:3000/login?error=oauth".to_string(),
            },
            ai: AiConfig { service_url: None },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_ttl_policy_is_distinct() {
        let config = test_config();
        assert_eq!(config.jwt.session_ttl(), Duration::hours(24));
        assert_eq!(config.jwt.oauth_ttl(), Duration::hours(1));
        assert!(config.jwt.session_ttl() > config.jwt.oauth_ttl());
    }
}
