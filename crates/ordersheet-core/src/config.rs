use crate::app_config::{AppConfig, Environment, NumericMode};
use crate::ConfigError;

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ORDERSHEET_ENV", "development"));
    let log_level = or_default("ORDERSHEET_LOG_LEVEL", "info");
    let platforms_path = PathBuf::from(or_default(
        "ORDERSHEET_PLATFORMS_PATH",
        "./config/platforms.yaml",
    ));

    let numeric_mode = or_default("ORDERSHEET_NUMERIC_MODE", "strict")
        .parse::<NumericMode>()
        .map_err(|reason| invalid("ORDERSHEET_NUMERIC_MODE", reason))?;

    let dispatch_cutoff_hour = parse_u32("ORDERSHEET_DISPATCH_CUTOFF_HOUR", "18")?;
    if dispatch_cutoff_hour > 23 {
        return Err(invalid(
            "ORDERSHEET_DISPATCH_CUTOFF_HOUR",
            format!("hour must be between 0 and 23, got {dispatch_cutoff_hour}"),
        ));
    }

    let db_max_connections = parse_u32("ORDERSHEET_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("ORDERSHEET_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ORDERSHEET_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        platforms_path,
        numeric_mode,
        dispatch_cutoff_hour,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
