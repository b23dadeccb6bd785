//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\songstore\config.toml
//! - macOS: ~/Library/Application Support/songstore/config.toml
//! - Linux: ~/.config/songstore/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cover::DEFAULT_COVER_CAPACITY;
use crate::library::DEFAULT_POOL_SIZE;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media index location
    pub library: LibraryConfig,

    /// In-memory cover cache
    pub cache: CacheConfig,

    /// Random selection
    pub random: RandomConfig,
}

/// Media index settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database path (None = songstore.db in the working directory)
    pub database: Option<PathBuf>,
}

/// Cover cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of decoded covers kept in memory
    pub cover_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cover_capacity: DEFAULT_COVER_CAPACITY,
        }
    }
}

/// Random selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Tracks fetched per refill of the random pool
    pub pool_size: usize,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl Config {
    /// Reject values the caches cannot be built with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.cover_capacity == 0 {
            return Err(ConfigError::Invalid("cache.cover_capacity must be at least 1"));
        }
        if self.random.pool_size == 0 {
            return Err(ConfigError::Invalid("random.pool_size must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songstore"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    let config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                return Config::default();
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            return Config::default();
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Invalid config file {:?}: {}", path, e);
        tracing::warn!("Using default configuration");
        return Config::default();
    }
    config
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir.join("config.toml"))
}

/// Save configuration to `path`, creating its directory if needed.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::config(e.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[library]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[random]"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[cache]
cover_capacity = 25
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.cache.cover_capacity, 25);
        assert_eq!(config.random.pool_size, DEFAULT_POOL_SIZE);
        assert!(config.library.database.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.cache.cover_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.random.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.library.database = Some(PathBuf::from("/data/library.db"));
        config.random.pool_size = 8;
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.library.database, Some(PathBuf::from("/data/library.db")));
        assert_eq!(loaded.random.pool_size, 8);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\ncover_capacity = 0\n").unwrap();
        assert_eq!(load_from(&path).cache.cover_capacity, DEFAULT_COVER_CAPACITY);

        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(load_from(&path).random.pool_size, DEFAULT_POOL_SIZE);
    }
}
