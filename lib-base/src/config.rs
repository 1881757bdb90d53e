// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Configuration management for HID++ tools
//!
//! Configuration files are searched in the following order:
//! 1. Current directory (hidpp.yaml)
//! 2. User's config directory:
//!    - macOS: ~/Library/Application Support/hidpp/hidpp.yaml
//!    - Linux: ~/.config/hidpp/hidpp.yaml
//!    - Windows: %APPDATA%\hidpp\hidpp.yaml
//!
//! If no configuration file is found, a default one is created in the user's config directory.

use anyhow::{Context, Result};
use hidpp::{ConnectionOptions, DeviceKind, LOGITECH_VENDOR_ID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "hidpp.yaml";
const CONFIG_DIR_NAME: &str = "hidpp";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub version: u32,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    /// Only devices of this type are kept after discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceKind>,
    #[serde(default)]
    pub connection: ConnectionOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            vendor_id: default_vendor_id(),
            device_type: None,
            connection: ConnectionOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_vendor_id() -> u16 {
    LOGITECH_VENDOR_ID
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Per module levels, e.g. `hidpp::connected_device: debug`
    #[serde(default)]
    pub submodules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            submodules: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse YAML config")?;
        Ok(config)
    }

    /// Write the configuration as YAML, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }
        let yaml = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config to: {:?}", path))?;
        Ok(())
    }

    /// Find and load the configuration, writing a default one when none exists
    pub fn load() -> Result<Self> {
        Self::load_with_name(CONFIG_FILE_NAME)
    }

    /// Find and load configuration file with a specific filename
    pub fn load_with_name(filename: &str) -> Result<Self> {
        let user_dir = Self::get_user_config_dir()?;
        Self::load_from_dirs(filename, &[PathBuf::new(), user_dir.clone()], &user_dir)
    }

    /// Load `filename` from the first of `search_dirs` containing it.
    ///
    /// When no directory has it, the default configuration is written to
    /// `default_dir` and returned.
    pub fn load_from_dirs(
        filename: &str,
        search_dirs: &[PathBuf],
        default_dir: &Path,
    ) -> Result<Self> {
        for dir in search_dirs {
            let path = dir.join(filename);
            if path.exists() {
                return Self::from_file(path);
            }
        }

        let default_config = Self::default();
        default_config.save(default_dir.join(filename))?;
        Ok(default_config)
    }

    fn get_user_config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join(CONFIG_DIR_NAME))
    }
}
