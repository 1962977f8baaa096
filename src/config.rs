use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    /// Independent secret for refresh tokens; falls back to the access
    /// secret when JWT_REFRESH_SECRET is unset.
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    /// "*" or a comma-separated list of exact origins.
    pub allowed_origins: String,
    pub environment: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the whole configuration once at startup. Any missing required
    /// value is a fatal error: main propagates it and the process exits
    /// before binding a listener.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;

        let access_secret =
            std::env::var("JWT_ACCESS_SECRET").context("JWT_ACCESS_SECRET is required")?;
        let refresh_secret =
            std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| access_secret.clone());
        let jwt = JwtConfig {
            access_secret,
            refresh_secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authgate-users".into()),
            access_ttl_minutes: std::env::var("JWT_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").context("SMTP_HOST is required")?,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").context("SMTP_USERNAME is required")?,
            password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is required")?,
            from: std::env::var("EMAIL_FROM").context("EMAIL_FROM is required")?,
        };

        Ok(Self {
            database_url,
            jwt,
            smtp,
            allowed_origins: std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".into()),
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        })
    }
}
