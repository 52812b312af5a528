use crate::types::*;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "tn";
pub const BASE_DIR_NAME: &str = ".tn";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SETUP_FILE_NAME: &str = "setup";

/// Root under which every toolchain gets its single active directory.
pub fn base_dir() -> Result<PathBuf> {
    let path = match std::env::var_os("TN_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?
            .join(BASE_DIR_NAME),
    };
    tracing::debug!("Base directory: {}", path.display());
    Ok(path)
}

pub fn ensure_base_dir(base: &Path) -> Result<()> {
    fs::create_dir_all(base)
        .with_context(|| format!("Could not create base directory {}", base.display()))
}

pub fn settings_file_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE_NAME)
}

pub fn load_settings(base: &Path) -> Result<Settings> {
    let config_path = settings_file_path(base);

    let settings = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
        serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")?
    } else {
        Settings::default()
    };

    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}

pub fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(secs) = lookup("TN_HTTP_TIMEOUT_SECS") {
        match secs.parse::<u64>() {
            Ok(secs) => settings.http_timeout_secs = secs,
            Err(_) => tracing::warn!("Ignoring invalid TN_HTTP_TIMEOUT_SECS '{}'", secs),
        }
    }

    if let Some(origin) = lookup("TN_GO_ORIGIN") {
        settings.go_origin = origin;
    }

    if let Some(url) = lookup("TN_ZIG_INDEX_URL") {
        settings.zig_index_url = url;
    }

    if let Some(channel) = lookup("TN_ZIG_CHANNEL") {
        settings.zig_channel = channel;
    }

    if let Some(tools) = lookup("TN_TOOLS") {
        settings.tools = tools
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
    }

    if let Some(profile) = lookup("TN_SHELL_PROFILE") {
        settings.shell_profile = PathBuf::from(profile);
    }

    settings
}
