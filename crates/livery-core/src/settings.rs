// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Folder holding installed liveries (`<root>/<airplane>/<livery>/`)
    #[serde(default)]
    pub liveries_root: Option<PathBuf>,
    /// Cached copy of the remote file listing
    #[serde(default)]
    pub listing_path: Option<PathBuf>,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Skip the confirmation prompt for bulk uninstall
    #[serde(default)]
    pub assume_yes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            liveries_root: None,
            listing_path: None,
            locale: default_locale(),
            assume_yes: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsManager {
    config_path: PathBuf,
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsManager {
    pub fn new() -> Self {
        Self::at(crate::get_config_root().join("settings.json"))
    }

    pub fn at<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read settings.json")?;

        serde_json::from_str(&content).context("Failed to parse settings.json")
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        fs::write(&self.config_path, content).context("Failed to write settings.json")
    }
}
