use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// UTC wall-clock time of the daily alert dispatch, `HH:MM`.
    pub alerts_daily_at: String,
    pub alerts_lookback_days: i64,
    pub search_default_per_page: u32,
    pub search_max_per_page: u32,
    /// Public frontend URL used for links in outgoing mail.
    pub app_url: String,
    pub mail: Option<MailConfig>,
}

/// SMTP settings. The mail channel is disabled when `SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mail = match std::env::var("SMTP_HOST") {
            Ok(smtp_host) if !smtp_host.trim().is_empty() => Some(MailConfig {
                smtp_host,
                smtp_username: require_env("SMTP_USERNAME")?,
                smtp_password: require_env("SMTP_PASSWORD")?,
                from: require_env("MAIL_FROM")?,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            alerts_daily_at: std::env::var("ALERTS_DAILY_AT").unwrap_or_else(|_| "09:00".to_string()),
            alerts_lookback_days: parse_env("ALERTS_LOOKBACK_DAYS", 7)?,
            search_default_per_page: parse_env("SEARCH_DEFAULT_PER_PAGE", 15)?,
            search_max_per_page: parse_env("SEARCH_MAX_PER_PAGE", 100)?,
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            mail,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/jobboard_test".to_string(),
            database_max_connections: 1,
            port: 0,
            rust_log: "debug".to_string(),
            alerts_daily_at: "09:00".to_string(),
            alerts_lookback_days: 7,
            search_default_per_page: 15,
            search_max_per_page: 100,
            app_url: "http://localhost:5173".to_string(),
            mail: None,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
