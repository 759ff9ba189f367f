//! Config path resolution
//!
//! Everything the SDK reads from disk lives under one base directory:
//!
//! ```text
//! <base>/
//! ├── srcsdk.toml
//! └── gamedata.json
//! ```
//!
//! The base is `$SRCSDK_DIR` when set, otherwise a `srcsdk` directory next to
//! the host executable.

use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "SRCSDK_DIR";

/// File name of the SDK config inside the base directory
pub const CONFIG_FILE: &str = "srcsdk.toml";

/// Returns the srcsdk base directory
pub fn sdk_base_dir() -> ConfigResult<PathBuf> {
    if let Some(dir) = std::env::var_os(BASE_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let exe = std::env::current_exe()?;
    exe.parent()
        .map(|dir| dir.join("srcsdk"))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the default config file path
///
/// Path: `<base>/srcsdk.toml`
pub fn config_path() -> ConfigResult<PathBuf> {
    Ok(sdk_base_dir()?.join(CONFIG_FILE))
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
