mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "mediasort.db";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path in default_config_paths() {
        if path.exists() {
            return load_config(&path);
        }
    }

    Ok(Config::default())
}

/// First existing config file among the default locations.
pub fn find_default_config() -> Option<PathBuf> {
    default_config_paths().into_iter().find(|p| p.exists())
}

fn default_config_paths() -> Vec<PathBuf> {
    [
        "./config.toml",
        "./mediasort.toml",
        "~/.config/mediasort/config.toml",
        "/etc/mediasort/config.toml",
    ]
    .iter()
    .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    .collect()
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn expand_paths(config: &mut Config) {
    if let Some(p) = config.library.input_path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.database.path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.server.static_dir.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.transcode.ffmpeg_path.as_mut() {
        *p = expand(p);
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.publisher.kind == PublisherKind::Webhook {
        match config.publisher.url.as_deref() {
            None | Some("") => anyhow::bail!("Webhook publisher requires publisher.url"),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                anyhow::bail!("Webhook publisher url must be http(s): {}", url)
            }
            _ => {}
        }
    }

    if config.publisher.timeout_secs == 0 {
        anyhow::bail!("publisher.timeout_secs must be greater than 0");
    }

    if config.transcode.crf > 51 {
        anyhow::bail!("transcode.crf must be between 0 and 51");
    }

    if let Some(path) = &config.library.input_path {
        if !path.exists() {
            tracing::warn!("Input path does not exist: {:?}", path);
        }
    }

    Ok(())
}

/// Resolve the pending-media root, failing if it is unset or not a
/// directory.
pub fn require_input_root(config: &Config) -> Result<PathBuf> {
    let path = config
        .library
        .input_path
        .as_ref()
        .context("library.input_path is required")?;

    if !path.is_dir() {
        anyhow::bail!("library.input_path is not a directory: {:?}", path);
    }

    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve input path: {:?}", path))?;
    Ok(absolute)
}

/// Database file location: explicit `database.path`, else next to the
/// config file, else the working directory.
pub fn database_path(config: &Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(path) = &config.database.path {
        return path.clone();
    }

    config_path
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}
