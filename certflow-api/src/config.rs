/// Configuration management for the API server
///
/// Loads configuration from environment variables (with `.env` support for
/// development) into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `API_PRODUCTION`: Enables HSTS when "true" (default: false)
/// - `APP_BASE_URL`: Public base URL used for sign-in links in email
///   (default: http://localhost:3000)
/// - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`: SMTP relay;
///   when `SMTP_HOST` is unset, outbound mail is logged instead of sent
/// - `BATCH_CONCURRENCY`: Per-request assignment fan-out width (default: 4)
/// - `BATCH_NOTIFY_TIMEOUT_SECONDS`: Notification send deadline (default: 10)
/// - `RUST_LOG`: Log filter (default: info)
///
/// # Example
///
/// ```no_run
/// use certflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use certflow_shared::mailer::SmtpConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Application-level settings
    pub app: AppConfig,

    /// SMTP relay settings; None disables real delivery
    #[serde(skip)]
    pub smtp: Option<SmtpSettings>,

    /// Batch workflow tuning
    pub batch: BatchConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; "*" means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public base URL of the learner front-end, used in notification links
    pub base_url: String,
}

/// SMTP relay settings
///
/// Kept out of serialized config output - the password is a secret.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Relay hostname
    pub host: String,

    /// Relay username
    pub username: String,

    /// Relay password
    pub password: String,

    /// Sender address
    pub from_address: String,
}

impl SmtpSettings {
    /// Converts to the shared mailer configuration
    pub fn to_mailer_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            from_address: self.from_address.clone(),
        }
    }
}

/// Batch workflow tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// How many references are processed concurrently per request
    pub concurrency: usize,

    /// Deadline for a single notification send (seconds)
    pub notify_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or any variable
    /// has an unparseable value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
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
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpSettings {
                host,
                username: env::var("SMTP_USERNAME")
                    .map_err(|_| anyhow::anyhow!("SMTP_USERNAME is required when SMTP_HOST is set"))?,
                password: env::var("SMTP_PASSWORD")
                    .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD is required when SMTP_HOST is set"))?,
                from_address: env::var("SMTP_FROM")
                    .map_err(|_| anyhow::anyhow!("SMTP_FROM is required when SMTP_HOST is set"))?,
            }),
            Err(_) => None,
        };

        let concurrency = env::var("BATCH_CONCURRENCY")
            .unwrap_or_else(|_| "4".to_string())
            .parse::<usize>()?;

        if concurrency == 0 {
            anyhow::bail!("BATCH_CONCURRENCY must be at least 1");
        }

        let notify_timeout_seconds = env::var("BATCH_NOTIFY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()?;

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
            app: AppConfig { base_url },
            smtp,
            batch: BatchConfig {
                concurrency,
                notify_timeout_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
