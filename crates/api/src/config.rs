use std::path::PathBuf;

use persona_core::expiry::DEFAULT_RETENTION_DAYS;

use crate::auth::jwt::JwtConfig;

/// Default interval between expiry sweeps: once a day.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Generation streams
    /// are exempt.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background jobs to stop (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Mark the session cookie `Secure` and `SameSite=Strict`.
    pub cookie_secure: bool,
    /// Filesystem root for generated images, served at `/uploads`.
    pub uploads_dir: PathBuf,
    /// Lifetime of jobs and profiles in days (default: `7`).
    pub retention_days: i64,
    /// Seconds between expiry sweeps (default: one day).
    pub expiry_sweep_interval_secs: u64,
    /// Admin account seeded at startup when `admin_password` is set.
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `5000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                    |
    /// | `COOKIE_SECURE`              | `false`                 |
    /// | `UPLOADS_DIR`                | `./uploads`             |
    /// | `RETENTION_DAYS`             | `7`                     |
    /// | `EXPIRY_SWEEP_INTERVAL_SECS` | `86400`                 |
    /// | `ADMIN_USERNAME`             | `admin`                 |
    /// | `ADMIN_PASSWORD`             | unset (no seeding)      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let uploads_dir =
            PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".into()));

        let retention_days: i64 = std::env::var("RETENTION_DAYS")
            .unwrap_or_else(|_| DEFAULT_RETENTION_DAYS.to_string())
            .parse()
            .expect("RETENTION_DAYS must be a valid i64");
        assert!(retention_days > 0, "RETENTION_DAYS must be positive");

        let expiry_sweep_interval_secs: u64 = std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("EXPIRY_SWEEP_INTERVAL_SECS must be a valid u64");

        let admin_username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
        let admin_password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            cookie_secure,
            uploads_dir,
            retention_days,
            expiry_sweep_interval_secs,
            admin_username,
            admin_password,
        }
    }
}
