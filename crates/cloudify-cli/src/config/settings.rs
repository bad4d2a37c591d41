use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cloudify_core::PlatformInfo;

use super::atomic::write_bytes_atomic;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_FILE: &str = "cfy-resolve.toml";

/// Where plugin catalog entries and uploaded blueprints are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogSource {
    /// JSON catalog file; blueprints come from `blueprints_root`.
    File { path: PathBuf },
    /// Manager database holding both plugins and blueprints.
    Postgres {
        url: String,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

/// Fixed platform used instead of detecting the running host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverride {
    pub platform: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub release: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub catalog: CatalogSource,
    pub blueprints_root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_config: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformOverride>,
    pub runs_dir: PathBuf,
    pub log_level: String,
    #[serde(default)]
    pub tracing_enabled: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSource::File {
                path: PathBuf::from("catalog.json"),
            },
            blueprints_root: PathBuf::from("blueprints"),
            security_config: None,
            platform: None,
            runs_dir: PathBuf::from("runs"),
            log_level: "info".to_string(),
            tracing_enabled: false,
        }
    }
}

impl ManagerConfig {
    /// The configured platform override, or the detected host platform.
    pub fn platform_info(&self) -> ConfigResult<PlatformInfo> {
        match &self.platform {
            Some(fixed) => Ok(PlatformInfo::new(
                fixed.platform.clone(),
                fixed.distribution.clone(),
                fixed.release.clone(),
            )),
            None => Ok(PlatformInfo::detect()?),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
        }
        if let CatalogSource::Postgres {
            max_connections, ..
        } = &self.catalog
        {
            if *max_connections == 0 {
                return Err(ConfigError::Invalid(
                    "catalog.max_connections must be at least 1".to_string(),
                ));
            }
        }
        if let Some(fixed) = &self.platform {
            if fixed.platform.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "platform.platform must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    5
}

/// Load the config at `path`, writing the defaults there first if it is missing.
pub fn load_or_create_config(path: &Path) -> ConfigResult<ManagerConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: ManagerConfig = toml::from_str(&content)?;
        config.validate()?;
        return Ok(config);
    }

    let config = ManagerConfig::default();
    save_config(path, &config)?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &ManagerConfig) -> ConfigResult<()> {
    config.validate()?;
    let encoded = toml::to_string_pretty(config)?;
    write_bytes_atomic(path, encoded.as_bytes())
}
