//! SDK configuration
//!
//! A small TOML file that tells the SDK where its gamedata lives, how loud to
//! log, and what the host's modules are called on this platform:
//!
//! ```toml
//! version = 1
//! gamedata = "gamedata.json"
//! log_filter = "info"
//!
//! [modules]
//! client = "client.dll"
//! engine = "engine.dll"
//! vphysics = "vphysics.dll"
//! ```
//!
//! Missing keys fall back to defaults, and a missing file is created with
//! the defaults on first load.

mod loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{config_path, resolve_in, sdk_base_dir, BASE_DIR_ENV, CONFIG_FILE};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine the base directory
    #[error("Config directory not available - could not resolve the srcsdk base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(target_os = "windows")]
const MODULE_SUFFIX: &str = ".dll";
#[cfg(not(target_os = "windows"))]
const MODULE_SUFFIX: &str = ".so";

fn default_modules() -> BTreeMap<String, String> {
    ["client", "engine", "vphysics"]
        .into_iter()
        .map(|library| (library.to_string(), format!("{}{}", library, MODULE_SUFFIX)))
        .collect()
}

/// SDK configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Gamedata file, relative to the config file's directory
    pub gamedata: PathBuf,

    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set
    pub log_filter: String,

    /// Logical library name -> module file name
    pub modules: BTreeMap<String, String>,

    /// Where this config was loaded from
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gamedata: PathBuf::from("gamedata.json"),
            log_filter: "info".to_string(),
            modules: default_modules(),
            source: None,
        }
    }
}

impl SdkConfig {
    /// Load from `<base>/srcsdk.toml`, creating a default file if missing
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(config_path()?)
    }

    /// Load from `<dir>/srcsdk.toml`, creating a default file if missing
    pub fn load_in(dir: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::load_from(dir.as_ref().join(CONFIG_FILE))
    }

    /// Load from an explicit path, creating a default file if missing
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded sdk config from {:?}", path);
            config
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!("Created default sdk config at {:?}", path);
            default
        };

        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save to the file this config was loaded from, or the default path
    pub fn save(&self) -> ConfigResult<()> {
        match &self.source {
            Some(path) => self.save_to(path),
            None => self.save_to(config_path()?),
        }
    }

    /// Save to an explicit path
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved sdk config to {:?}", path);
        Ok(())
    }

    /// Reload from the file this config was loaded from
    pub fn reload(&mut self) -> ConfigResult<()> {
        let path = match &self.source {
            Some(path) => path.clone(),
            None => config_path()?,
        };

        let content = std::fs::read_to_string(&path)?;
        *self = Self::from_toml_str(&content)?;
        self.source = Some(path.clone());
        tracing::debug!("Reloaded sdk config from {:?}", path);
        Ok(())
    }

    /// File this config was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Module file name for a logical library
    ///
    /// Unknown names pass through unchanged, so a file name can be used
    /// directly.
    pub fn module_file<'a>(&'a self, library: &'a str) -> &'a str {
        self.modules
            .get(library)
            .map(String::as_str)
            .unwrap_or(library)
    }

    /// Absolute gamedata path
    ///
    /// Relative paths resolve against the config file's directory, or the
    /// base directory for a config that was not loaded from disk.
    pub fn gamedata_path(&self) -> ConfigResult<PathBuf> {
        let base = match self.source.as_deref().and_then(Path::parent) {
            Some(dir) => dir.to_path_buf(),
            None => sdk_base_dir()?,
        };
        Ok(resolve_in(&base, &self.gamedata))
    }
}
