pub mod app_config;
pub mod config;
pub mod error;
pub mod record;
pub mod targets;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use record::{fingerprint, parse_price, Record, MIN_NAME_CHARS};
pub use targets::{load_targets, Target, TargetsFile};
