use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One monitored listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    pub display_name: String,
    pub category: String,
    /// Chat channel that receives alerts for this target.
    pub channel_id: String,
}

impl Target {
    /// Key under which this target's snapshot is stored: `"{display_name}_{category}"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.display_name, self.category)
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<Target>,
}

/// Load and validate the target list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let targets_file: TargetsFile = serde_yaml::from_str(&content)?;

    validate_targets(&targets_file)?;

    Ok(targets_file)
}

fn validate_targets(targets_file: &TargetsFile) -> Result<(), ConfigError> {
    if targets_file.targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one target must be configured".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();

    for target in &targets_file.targets {
        if target.display_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target display_name must be non-empty".to_string(),
            ));
        }

        if target.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{}' has an empty category",
                target.display_name
            )));
        }

        if target.channel_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{}' has an empty channel_id",
                target.key()
            )));
        }

        if !(target.url.starts_with("http://") || target.url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "target '{}' has non-http url '{}'",
                target.key(),
                target.url
            )));
        }

        let key = target.key();
        if !seen_keys.insert(key.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target key: '{key}'"
            )));
        }
    }

    Ok(())
}
