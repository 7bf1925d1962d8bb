use thiserror::Error;

use crate::app_config::{AppConfig, Environment, MailConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the process environment so the
/// rules can be tested with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let jwt_secret = require("STOREFRONT_JWT_SECRET")?;

    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"))?;

    let bind_addr = parse_addr("STOREFRONT_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");

    let jwt_ttl_hours = parse_u32("STOREFRONT_JWT_TTL_HOURS", "720")?;
    if jwt_ttl_hours == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_JWT_TTL_HOURS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let rate_limit_max_requests = parse_usize("STOREFRONT_RATE_LIMIT_MAX_REQUESTS", "100")?;
    let rate_limit_window_secs = parse_u64("STOREFRONT_RATE_LIMIT_WINDOW_SECS", "600")?;

    let upload_dir = PathBuf::from(or_default("STOREFRONT_UPLOAD_DIR", "./uploads"));
    let store_name = or_default("STOREFRONT_STORE_NAME", "Storefront");

    let mail_timeout_secs = parse_u64("STOREFRONT_MAIL_TIMEOUT_SECS", "15")?;
    let mail = match (
        optional("STOREFRONT_MAIL_API_URL"),
        optional("STOREFRONT_MAIL_API_KEY"),
    ) {
        (Some(api_url), Some(api_key)) => Some(MailConfig {
            api_url,
            api_key,
            from_address: optional("STOREFRONT_MAIL_FROM")
                .unwrap_or_else(|| "no-reply@localhost".to_string()),
            timeout_secs: mail_timeout_secs,
        }),
        _ => None,
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        jwt_secret,
        jwt_ttl_hours: i64::from(jwt_ttl_hours),
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_max_requests,
        rate_limit_window_secs,
        upload_dir,
        store_name,
        mail,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
