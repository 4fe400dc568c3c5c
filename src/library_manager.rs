//! # Library Manager Module
//!
//! ## Purpose
//! Keeps the settings of the crate and of the `KiGas` binary in one place: the directories
//! searched for mechanism files, the mechanism loaded by default and the logging setup.
//!
//! ## Architecture
//! - **LibraryConfig**: Serializable configuration structure
//! - **LibraryManager**: Core manager with validation and persistence
//! - **Global Access**: Thread-safe singleton pattern with test isolation
//! - **Configuration File**: JSON-based persistent storage (kigas_config.json)
//!
//! ## Configuration Format
//! ```json
//! {
//!   "data_directories": ["data"],
//!   "default_mechanism": "h2o2_small",
//!   "log_level": "info",
//!   "log_file": null
//! }
//! ```
//!
//! ## Usage Patterns
//!
//! ### Read-only Access
//! ```rust
//! use KiGas::library_manager::with_library_manager;
//!
//! let level = with_library_manager(|manager| manager.log_level_filter());
//! ```
//!
//! ### Mutable Access
//! ```rust,no_run
//! use KiGas::library_manager::with_library_manager_mut;
//!
//! with_library_manager_mut(|manager| manager.add_data_directory("mechanisms")).unwrap();
//! ```

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, OnceLock};

const CONFIG_FILE: &str = "kigas_config.json";
/// extensions tried when a mechanism is looked up by name
const MECHANISM_EXTENSIONS: [&str; 4] = ["", "yaml", "yml", "json"];

/// Persistent settings.
///
/// # Fields
/// * `data_directories` - directories searched for mechanism files, in order
/// * `default_mechanism` - name or path of the mechanism used when none is given
/// * `log_level` - one of off, error, warn, info, debug, trace
/// * `log_file` - optional file receiving a copy of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub data_directories: Vec<String>,
    pub default_mechanism: String,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_directories: vec!["data".to_string()],
            default_mechanism: "h2o2_small".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Core manager responsible for loading, validating and saving the configuration.
///
/// # Fields
/// * `config` - Current configuration
/// * `config_file` - Path to the configuration file for persistence
#[derive(Debug, Clone)]
pub struct LibraryManager {
    config: LibraryConfig,
    config_file: String,
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryManager {
    /// Loads "kigas_config.json" from the current directory, or uses the default configuration
    /// if the file doesn't exist or is invalid.
    pub fn new() -> Self {
        Self::with_config_file(CONFIG_FILE)
    }

    /// Creates a manager with a custom configuration file path.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!("cannot read config '{}' ({}), using defaults", config_file, e);
                LibraryConfig::default()
            }
        };
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<LibraryConfig, Box<dyn std::error::Error>> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: LibraryConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(LibraryConfig::default())
        }
    }

    /// Saves the current configuration to the config file.
    /// During tests, this method does nothing to keep the real config file untouched.
    pub fn save_config(&self) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            info!("configuration saved to '{}'", self.config_file);
            Ok(())
        }
    }

    pub fn get_config(&self) -> &LibraryConfig {
        &self.config
    }
    pub fn config_file(&self) -> &str {
        &self.config_file
    }
    pub fn data_directories(&self) -> &[String] {
        &self.config.data_directories
    }
    pub fn default_mechanism(&self) -> &str {
        &self.config.default_mechanism
    }
    pub fn log_file(&self) -> Option<&str> {
        self.config.log_file.as_deref()
    }

    /// Log level of the configuration; unknown values fall back to Info.
    pub fn log_level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.config.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Resolves a mechanism name to an existing file.
    ///
    /// `name` is tried as given, then in every data directory, each time with no extension and
    /// with ".yaml", ".yml" and ".json".
    ///
    /// # Returns
    /// * `Some(PathBuf)` - first existing file
    /// * `None` - if nothing matches
    pub fn find_mechanism(&self, name: &str) -> Option<PathBuf> {
        let with_extensions = |base: PathBuf| {
            MECHANISM_EXTENSIONS.iter().map(move |ext| {
                if ext.is_empty() {
                    base.clone()
                } else {
                    base.with_extension(ext)
                }
            })
        };
        let mut candidates: Vec<PathBuf> = with_extensions(PathBuf::from(name)).collect();
        for dir in &self.config.data_directories {
            candidates.extend(with_extensions(Path::new(dir).join(name)));
        }
        candidates.into_iter().find(|path| path.is_file())
    }

    /// Resolves the default mechanism
    pub fn default_mechanism_path(&self) -> Option<PathBuf> {
        self.find_mechanism(&self.config.default_mechanism)
    }

    /// Appends a directory to the search list. The directory must exist.
    pub fn add_data_directory(&mut self, dir: &str) -> Result<(), Box<dyn std::error::Error>> {
        if !Path::new(dir).is_dir() {
            return Err(format!("Directory does not exist: {}", dir).into());
        }
        if !self.config.data_directories.iter().any(|d| d == dir) {
            self.config.data_directories.push(dir.to_string());
            self.save_config()?;
        }
        Ok(())
    }

    /// Sets the default mechanism. The name must resolve through `find_mechanism`.
    pub fn set_default_mechanism(&mut self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        if self.find_mechanism(name).is_none() {
            return Err(format!("Mechanism not found: {}", name).into());
        }
        self.config.default_mechanism = name.to_string();
        self.save_config()?;
        Ok(())
    }

    pub fn set_log_level(&mut self, level: &str) -> Result<(), Box<dyn std::error::Error>> {
        LevelFilter::from_str(level).map_err(|_| format!("Unknown log level: {}", level))?;
        self.config.log_level = level.to_lowercase();
        self.save_config()?;
        Ok(())
    }

    pub fn set_log_file(&mut self, path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
        self.config.log_file = path.map(str::to_string);
        self.save_config()?;
        Ok(())
    }

    /// Restores the default configuration and saves it.
    pub fn reset_to_defaults(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.config = LibraryConfig::default();
        self.save_config()?;
        Ok(())
    }
}

/// Global singleton instance of LibraryManager using thread-safe OnceLock pattern
static GLOBAL_LIBRARY_MANAGER: OnceLock<Mutex<LibraryManager>> = OnceLock::new();

/// Test-specific manager instance to isolate tests from global state
#[cfg(test)]
static TEST_MANAGER: Mutex<Option<LibraryManager>> = Mutex::new(None);

/// Sets a test-specific manager instance for test isolation.
#[cfg(test)]
pub fn set_test_manager(manager: LibraryManager) {
    *TEST_MANAGER.lock().unwrap_or_else(|e| e.into_inner()) = Some(manager);
}

/// Clears the test-specific manager instance.
#[cfg(test)]
pub fn clear_test_manager() {
    *TEST_MANAGER.lock().unwrap_or_else(|e| e.into_inner()) = None;
}

/// Returns a mutex guard to the global LibraryManager instance.
/// During tests the test-specific manager, if set, replaces the global one.
/// A poisoned mutex still hands out the manager: it holds only settings.
pub fn get_library_manager() -> MutexGuard<'static, LibraryManager> {
    let global = GLOBAL_LIBRARY_MANAGER.get_or_init(|| Mutex::new(LibraryManager::new()));
    #[allow(unused_mut)]
    let mut guard = global.lock().unwrap_or_else(|e| e.into_inner());
    #[cfg(test)]
    {
        if let Some(manager) = TEST_MANAGER.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            *guard = manager.clone();
        }
    }
    guard
}

/// Executes a closure with read-only access to the LibraryManager.
pub fn with_library_manager<F, R>(f: F) -> R
where
    F: FnOnce(&LibraryManager) -> R,
{
    let manager = get_library_manager();
    f(&manager)
}

/// Executes a closure with mutable access to the LibraryManager.
pub fn with_library_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut LibraryManager) -> R,
{
    let mut manager = get_library_manager();
    f(&mut manager)
}
