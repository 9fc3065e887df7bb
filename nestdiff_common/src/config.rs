use crate::{NestdiffError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "nestdiff.toml";

pub const DEFAULT_MAX_DIFF_BLOCK_LINES: usize = 50;
pub const DEFAULT_MAX_REPORT_SIZE: usize = 2000 * 1024; // 2000 kB

/// Read-only engine configuration.
///
/// Threaded explicitly through the comparison; the engine holds no
/// process-wide mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Report members missing from one side without escalating the
    /// container-level difference
    #[serde(default)]
    pub new_file: bool,

    /// Per-hunk line cap for the unified-diff producer
    #[serde(default = "default_max_diff_block_lines")]
    pub max_diff_block_lines: usize,

    /// Byte cap applied by presenters and raw binary reads
    #[serde(default = "default_max_report_size")]
    pub max_report_size: usize,

    /// Minimum similarity ratio for fuzzy member pairing; 0.0 disables it
    #[serde(default)]
    pub fuzzy_threshold: f32,

    /// Directory under which extraction temp dirs are created.
    /// Defaults to the system temp dir when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_max_diff_block_lines() -> usize {
    DEFAULT_MAX_DIFF_BLOCK_LINES
}

fn default_max_report_size() -> usize {
    DEFAULT_MAX_REPORT_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            new_file: false,
            max_diff_block_lines: DEFAULT_MAX_DIFF_BLOCK_LINES,
            max_report_size: DEFAULT_MAX_REPORT_SIZE,
            fuzzy_threshold: 0.0,
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    pub exists: bool,
}

/// Load the configuration from an explicit path, or from the per-user
/// config directory when none is given. A missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| NestdiffError::Serialization(e.to_string()))?
    } else if explicit.is_some() {
        return Err(NestdiffError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    } else {
        Config::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data =
        toml::to_string_pretty(config).map_err(|e| NestdiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "nestdiff", "nestdiff")
        .ok_or_else(|| NestdiffError::Config("Unable to determine config directory".to_string()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}
