use std::env;

use derive_more::Display;
use dotenv::dotenv;

/// Process configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub smhi_base_url: String,
    pub email: EmailConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// seconds
    pub access_ttl: i64,
    /// seconds
    pub refresh_ttl: i64,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub from: String,
    pub app_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display(fmt = "missing environment variable '{}'", _0)]
    Missing(&'static str),

    #[display(fmt = "environment variable '{}' has an invalid value", _0)]
    Invalid(&'static str),
}

impl std::error::Error for ConfigError {}

const DEFAULT_ACCESS_TTL: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL: i64 = 5 * 24 * 60 * 60;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: or_default("BIND_ADDR", "127.0.0.1:8080"),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            jwt: JwtConfig {
                access_secret: required("JWT_ACCESS_SECRET")?,
                refresh_secret: required("JWT_REFRESH_SECRET")?,
                access_ttl: parsed("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL)?,
                refresh_ttl: parsed("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL)?,
            },
            smhi_base_url: or_default("SMHI_BASE_URL", "https://opendata-download-metfcst.smhi.se"),
            email: EmailConfig {
                api_key: optional("RESEND_API_KEY"),
                base_url: or_default("RESEND_BASE_URL", "https://api.resend.com"),
                from: or_default("EMAIL_FROM", "BudEvent <noreply@budevent.app>"),
                app_base_url: or_default("APP_BASE_URL", "http://localhost:3000"),
            },
            chat: ChatConfig {
                api_key: optional("OPENAI_API_KEY"),
                base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: or_default("OPENAI_MODEL", "gpt-4o-mini"),
            },
        })
    }
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn or_default(key: &'static str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_and_rejects_garbage() {
        env::remove_var("BUDEVENT_TEST_UNSET");
        assert_eq!(parsed("BUDEVENT_TEST_UNSET", 7u32).unwrap(), 7);

        env::set_var("BUDEVENT_TEST_GARBAGE", "seven");
        assert!(matches!(
            parsed::<u32>("BUDEVENT_TEST_GARBAGE", 7),
            Err(ConfigError::Invalid("BUDEVENT_TEST_GARBAGE"))
        ));
    }

    #[test]
    fn blank_values_count_as_missing() {
        env::set_var("BUDEVENT_TEST_BLANK", "   ");
        assert!(matches!(
            required("BUDEVENT_TEST_BLANK"),
            Err(ConfigError::Missing(_))
        ));
    }
}
