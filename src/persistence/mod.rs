//! # Persistence Module
//!
//! Launcher settings: where each emulator is installed, how controllers
//! should be addressed, where user mapping overrides live and how the
//! emulator process is supervised.
//!
//! Settings are a single TOML file under the user config directory
//! (`~/.config/padlauncher/launcher.toml` on Linux). Every section has
//! defaults, so a partial or missing file still yields a usable
//! configuration; [`ensure_default_config`] writes the defaults on first run.
//!
//! Errors use `color_eyre` like the rest of the binary-facing code.

use crate::launcher::SupervisorSettings;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CONFIG_DIR: &str = "padlauncher";
pub const CONFIG_FILE: &str = "launcher.toml";
pub const MAPPING_DIR: &str = "mappings";

/// Where one emulator is installed
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmulatorInstall {
    /// Install directory; configuration paths are relative to it
    pub directory: PathBuf,
    /// Executable file name, when it differs from the usual ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Controller handling switches
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct InputSettings {
    /// Address pads through the emulator's non-XInput numbering
    pub disable_xinput: bool,
    /// Apply the Nintendo face button swap where an emulator needs it
    pub swap_nintendo_buttons: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            disable_xinput: false,
            swap_nintendo_buttons: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory with `<emulator>.toml` mapping overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_dir: Option<PathBuf>,
    /// Installs keyed by emulator id
    pub emulators: BTreeMap<String, EmulatorInstall>,
    pub input: InputSettings,
    pub supervisor: SupervisorSettings,
}

impl LauncherConfig {
    pub fn install(&self, emulator: &str) -> Option<&EmulatorInstall> {
        self.emulators
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(emulator))
            .map(|(_, install)| install)
    }

    /// Override directory, defaulting to `mappings/` next to the settings file
    pub fn mapping_dir_or(&self, config_dir: &Path) -> PathBuf {
        self.mapping_dir
            .clone()
            .unwrap_or_else(|| config_dir.join(MAPPING_DIR))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if {} exists: {}", path.display(), e))?
        {
            warn!("{} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read launcher config {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse launcher config {}: {}", path.display(), e))?;

        debug!(
            "Loaded launcher config with {} emulator installs",
            config.emulators.len()
        );
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize launcher config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write launcher config {}: {}", path.display(), e))?;

        info!("Launcher config saved to {}", path.display());
        Ok(())
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        })
        .join(CONFIG_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Writes the default settings to `path` unless a file is already there
pub async fn ensure_default_config(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check if {} exists: {}", path.display(), e))?
    {
        return Ok(());
    }

    info!("Creating default launcher configuration");
    LauncherConfig::default().save(path).await
}

/// Loads the settings, first writing the defaults when `create_missing` is set
pub async fn load_or_init(path: &Path, create_missing: bool) -> Result<LauncherConfig> {
    if create_missing {
        ensure_default_config(path).await?;
    }
    LauncherConfig::load(path).await
}
