//! Configuration file handling.
//!
//! This module provides loading and saving of fremen defaults from a TOML
//! file. Command-line flags always win over these values.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/fremen/config.toml`
//! - macOS: `~/Library/Application Support/fremen/config.toml`
//! - Windows: `%APPDATA%\fremen\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! database = "/opt/fremen/database.txt"
//! recursive = true
//! include_git = false
//! include_node_modules = false
//! exclude = "fixtures|vendor"
//! full_report = false
//! format = "text"
//! color = true
//! emoji = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Application configuration.
///
/// This struct represents every default that can be set for a scan.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use fremen::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Recursive: {}", config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vulnerability database to use when `--database` is not given.
    ///
    /// Default: `database.txt` next to the executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Scan directories recursively.
    ///
    /// Default: false
    pub recursive: bool,

    /// Descend into `.git` directories.
    ///
    /// Default: false
    pub include_git: bool,

    /// Descend into `node_modules` directories.
    ///
    /// Default: false
    pub include_node_modules: bool,

    /// Regular expression; matching paths are not scanned.
    ///
    /// Default: none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Also report projects that are not infected.
    ///
    /// Default: false
    pub full_report: bool,

    /// Output format when `--json` is not given.
    ///
    /// Valid values: "text", "json"
    /// Default: "text"
    pub format: String,

    /// Use ANSI colors in the text report.
    ///
    /// Default: true
    pub color: bool,

    /// Use emoji icons in the text report.
    ///
    /// Default: true
    pub emoji: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            recursive: false,
            include_git: false,
            include_node_modules: false,
            exclude: None,
            full_report: false,
            format: "text".to_string(),
            color: true,
            emoji: true,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::from_toml(
            &fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?,
        )
        .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parses configuration from TOML text. Missing keys take default values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.output_format()?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use fremen::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("fremen/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fremen")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// The configured default output format.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse().map_err(|e: String| anyhow::anyhow!(e))
    }
}
