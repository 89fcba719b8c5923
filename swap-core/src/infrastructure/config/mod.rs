mod loader;
mod types;
pub mod validation;

pub use loader::{load_config, load_config_from_file, load_config_from_file_with_profile, CONFIG_FILE_NAME};
pub(crate) use loader::redact_url;
pub use types::*;

use crate::foundation::SwapError;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SWAP_CONFIG_PATH";
pub const DATA_DIR_ENV: &str = "SWAP_DATA_DIR";

pub fn load_app_config() -> Result<AppConfig, SwapError> {
    let data_dir = resolve_data_dir()?;
    let config_path = resolve_config_path(&data_dir)?;
    load_app_config_from_path(&config_path, None)
}

pub fn load_app_config_from_path(path: &Path, profile: Option<&str>) -> Result<AppConfig, SwapError> {
    let data_dir = resolve_data_dir()?;
    let config = match profile {
        Some(profile) => load_config_from_file_with_profile(path, &data_dir, profile)?,
        None => load_config_from_file(path, &data_dir)?,
    };
    config.validate().map_err(|errors| SwapError::ConfigError(format!("validation failed: {:?}", errors)))?;
    Ok(config)
}

pub fn resolve_config_path(data_dir: &Path) -> Result<PathBuf, SwapError> {
    if let Ok(value) = std::env::var(CONFIG_PATH_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    Ok(data_dir.join(CONFIG_FILE_NAME))
}

pub fn resolve_data_dir() -> Result<PathBuf, SwapError> {
    if let Ok(data_dir) = std::env::var(DATA_DIR_ENV) {
        let trimmed = data_dir.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    let cwd = std::env::current_dir()
        .map_err(|err| SwapError::StorageError { operation: "env::current_dir".to_string(), details: err.to_string() })?;
    Ok(cwd.join(".swap"))
}
