use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigLayer};

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

/// Site file picked up from the working directory.
pub fn site_config_path(dir: &Path) -> PathBuf {
    dir.join("vtec.toml")
}

pub fn load_user_config() -> Result<Option<ConfigLayer>> {
    load_layer(&config_path())
}

/// Reads one layer; a missing file is not an error.
pub fn load_layer(path: &Path) -> Result<Option<ConfigLayer>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| config_error(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| config_error(format!("failed to parse {}: {e}", path.display())))
}

/// Loads defaults, the user file, the site file (explicit path or
/// `vtec.toml` in the working directory), then environment overrides.
pub fn load(site: Option<&Path>) -> Result<Config> {
    let user = load_user_config()?;
    let site = match site {
        Some(path) => {
            if !path.exists() {
                return Err(config_error(format!("{} does not exist", path.display())));
            }
            load_layer(path)?
        }
        None => match std::env::current_dir() {
            Ok(cwd) => load_layer(&site_config_path(&cwd))?,
            Err(_) => None,
        },
    };
    let mut config = merge_layers(user, site);
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| config_error(format!("failed to create {}: {e}", dir.display())))?;
    }
    let contents = toml::to_string_pretty(cfg)
        .map_err(|e| config_error(format!("failed to render config: {e}")))?;
    atomic_write(path, contents.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| config_error("config path missing parent directory".to_string()))?;
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        config_error(format!(
            "failed to create temp file in {}: {e}",
            dir.display()
        ))
    })?;
    fs::write(temp.path(), data)
        .map_err(|e| config_error(format!("failed to write config temp file: {e}")))?;
    temp.persist(path).map_err(|e| {
        config_error(format!(
            "failed to persist config to {}: {e}",
            path.display()
        ))
    })?;
    Ok(())
}

fn config_error(reason: String) -> Error {
    Error::Config { reason }
}
