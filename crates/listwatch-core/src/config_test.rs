use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.targets_path.to_str(), Some("./config/targets.yaml"));
    assert_eq!(cfg.data_dir.to_str(), Some("./data"));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.navigation_timeout_secs, 30);
    assert_eq!(cfg.settle_timeout_ms, 15_000);
    assert_eq!(cfg.stability_max_attempts, 3);
    assert_eq!(cfg.consistency_retries, 3);
    assert_eq!(cfg.base_interval_secs, 300);
    assert_eq!(cfg.mid_interval_secs, 900);
    assert_eq!(cfg.slow_interval_secs, 1800);
    assert_eq!(cfg.sleep_start_hour, 1);
    assert_eq!(cfg.sleep_end_hour, 8);
    assert_eq!(cfg.wake_check_secs, 60);
    assert_eq!(cfg.error_cooldown_secs, 60);
    assert!(cfg.item_pattern.is_none());
    assert!(cfg.chat_token.is_none());
    assert_eq!(cfg.chat_api_base, "https://discord.com/api/v10");
    assert_eq!(cfg.notify_max_retries, 3);
}

#[test]
fn data_file_paths_live_under_data_dir() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_DATA_DIR", "/var/lib/listwatch");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.snapshots_path().to_str(),
        Some("/var/lib/listwatch/snapshots.json")
    );
    assert_eq!(cfg.stats_path().to_str(), Some("/var/lib/listwatch/stats.json"));
}

#[test]
fn interval_overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_BASE_INTERVAL_SECS", "120");
    map.insert("LISTWATCH_MID_INTERVAL_SECS", "600");
    map.insert("LISTWATCH_SLOW_INTERVAL_SECS", "3600");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.base_interval_secs, 120);
    assert_eq!(cfg.mid_interval_secs, 600);
    assert_eq!(cfg.slow_interval_secs, 3600);
}

#[test]
fn invalid_interval_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_BASE_INTERVAL_SECS", "five minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LISTWATCH_BASE_INTERVAL_SECS"),
        "expected InvalidEnvVar(LISTWATCH_BASE_INTERVAL_SECS), got: {result:?}"
    );
}

#[test]
fn sleep_hour_out_of_range_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_SLEEP_END_HOUR", "24");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LISTWATCH_SLEEP_END_HOUR"),
        "expected InvalidEnvVar(LISTWATCH_SLEEP_END_HOUR), got: {result:?}"
    );
}

#[test]
fn zero_consistency_retries_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_CONSISTENCY_RETRIES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LISTWATCH_CONSISTENCY_RETRIES"),
        "expected InvalidEnvVar(LISTWATCH_CONSISTENCY_RETRIES), got: {result:?}"
    );
}

#[test]
fn zero_stability_attempts_is_rejected() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_STABILITY_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn blank_chat_token_is_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_CHAT_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.chat_token.is_none());
}

#[test]
fn debug_output_redacts_chat_token() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_CHAT_TOKEN", "super-secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret-token"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn item_pattern_override_is_kept() {
    let mut map = HashMap::new();
    map.insert("LISTWATCH_ITEM_PATTERN", r"(?P<name>\w+)=(?P<price>\d+)");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.item_pattern.as_deref(),
        Some(r"(?P<name>\w+)=(?P<price>\d+)")
    );
}
