use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub targets_path: PathBuf,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub user_agent: String,
    pub navigation_timeout_secs: u64,
    pub settle_timeout_ms: u64,
    pub stability_max_attempts: u32,
    pub consistency_retries: u32,
    pub base_interval_secs: u64,
    pub mid_interval_secs: u64,
    pub slow_interval_secs: u64,
    pub sleep_start_hour: u32,
    pub sleep_end_hour: u32,
    pub wake_check_secs: u64,
    pub error_cooldown_secs: u64,
    pub item_pattern: Option<String>,
    pub chat_token: Option<String>,
    pub chat_api_base: String,
    pub notify_max_retries: u32,
}

impl AppConfig {
    #[must_use]
    pub fn snapshots_path(&self) -> PathBuf {
        self.data_dir.join("snapshots.json")
    }

    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join("stats.json")
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("targets_path", &self.targets_path)
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("settle_timeout_ms", &self.settle_timeout_ms)
            .field("stability_max_attempts", &self.stability_max_attempts)
            .field("consistency_retries", &self.consistency_retries)
            .field("base_interval_secs", &self.base_interval_secs)
            .field("mid_interval_secs", &self.mid_interval_secs)
            .field("slow_interval_secs", &self.slow_interval_secs)
            .field("sleep_start_hour", &self.sleep_start_hour)
            .field("sleep_end_hour", &self.sleep_end_hour)
            .field("wake_check_secs", &self.wake_check_secs)
            .field("error_cooldown_secs", &self.error_cooldown_secs)
            .field("item_pattern", &self.item_pattern)
            .field("chat_token", &self.chat_token.as_ref().map(|_| "[redacted]"))
            .field("chat_api_base", &self.chat_api_base)
            .field("notify_max_retries", &self.notify_max_retries)
            .finish()
    }
}
