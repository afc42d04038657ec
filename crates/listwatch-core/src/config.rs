use crate::app_config::AppConfig;
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

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

    let parse_count = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let parse_hour = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value > 23 {
            return Err(invalid(var, format!("hour {value} is outside 0..=23")));
        }
        Ok(value)
    };

    let targets_path = PathBuf::from(or_default("LISTWATCH_TARGETS_PATH", "./config/targets.yaml"));
    let data_dir = PathBuf::from(or_default("LISTWATCH_DATA_DIR", "./data"));
    let log_level = or_default("LISTWATCH_LOG_LEVEL", "info");
    let user_agent = or_default("LISTWATCH_USER_AGENT", DEFAULT_USER_AGENT);

    let navigation_timeout_secs = parse_u64("LISTWATCH_NAVIGATION_TIMEOUT_SECS", "30")?;
    let settle_timeout_ms = parse_u64("LISTWATCH_SETTLE_TIMEOUT_MS", "15000")?;
    let stability_max_attempts = parse_count("LISTWATCH_STABILITY_MAX_ATTEMPTS", "3")?;
    let consistency_retries = parse_count("LISTWATCH_CONSISTENCY_RETRIES", "3")?;

    let base_interval_secs = parse_u64("LISTWATCH_BASE_INTERVAL_SECS", "300")?;
    let mid_interval_secs = parse_u64("LISTWATCH_MID_INTERVAL_SECS", "900")?;
    let slow_interval_secs = parse_u64("LISTWATCH_SLOW_INTERVAL_SECS", "1800")?;
    let sleep_start_hour = parse_hour("LISTWATCH_SLEEP_START_HOUR", "1")?;
    let sleep_end_hour = parse_hour("LISTWATCH_SLEEP_END_HOUR", "8")?;
    let wake_check_secs = parse_u64("LISTWATCH_WAKE_CHECK_SECS", "60")?;
    let error_cooldown_secs = parse_u64("LISTWATCH_ERROR_COOLDOWN_SECS", "60")?;

    let item_pattern = lookup("LISTWATCH_ITEM_PATTERN")
        .ok()
        .filter(|p| !p.trim().is_empty());
    let chat_token = lookup("LISTWATCH_CHAT_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    let chat_api_base = or_default("LISTWATCH_CHAT_API_BASE", "https://discord.com/api/v10");
    let notify_max_retries = parse_u32("LISTWATCH_NOTIFY_MAX_RETRIES", "3")?;

    Ok(AppConfig {
        targets_path,
        data_dir,
        log_level,
        user_agent,
        navigation_timeout_secs,
        settle_timeout_ms,
        stability_max_attempts,
        consistency_retries,
        base_interval_secs,
        mid_interval_secs,
        slow_interval_secs,
        sleep_start_hour,
        sleep_end_hour,
        wake_check_secs,
        error_cooldown_secs,
        item_pattern,
        chat_token,
        chat_api_base,
        notify_max_retries,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
