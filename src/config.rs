// Layered runtime configuration: defaults, optional TOML file, ZT_WIPE_* env.

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "ZT_WIPE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipeConfig {
    /// Base URL of the chain-of-custody recording service
    pub chain_endpoint: String,
    pub chain_timeout_secs: u64,
    /// Upper bound for each external tool invocation. `None` waits forever,
    /// since a security erase on large media can legitimately take hours.
    pub command_timeout_secs: Option<u64>,
    pub hdparm_path: String,
    pub nvme_path: String,
}

impl Default for WipeConfig {
    fn default() -> Self {
        Self {
            chain_endpoint: "http://127.0.0.1:8080".to_string(),
            chain_timeout_secs: 30,
            command_timeout_secs: None,
            hdparm_path: "hdparm".to_string(),
            nvme_path: "nvme".to_string(),
        }
    }
}

impl WipeConfig {
    /// Load from the per-user config file (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path().as_deref(), false)
    }

    /// Load from an explicit file, always parsed as TOML whatever its
    /// extension. When `required` is false a missing file is treated as empty.
    pub fn load_from(path: Option<&Path>, required: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// `<config dir>/zt-wipe/config.toml` on this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "zt", "zt-wipe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.chain_timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}
