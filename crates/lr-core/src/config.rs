//! Persisted emulator configuration
//!
//! The session writes this through to the host save directory whenever a
//! game is loaded, so the emulator side always boots from a file that
//! mirrors the options the frontend selected.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subdirectory of the host system/save directories owned by this core
pub const CORE_DIR: &str = "pcsx2";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmuConfig {
    /// Selected BIOS image
    pub bios: PathBuf,
    /// Skip the BIOS boot animation by injecting BOOT2 directly
    pub use_boot2_injection: bool,
    pub cdvd_source: CdvdSource,
    /// Disc image inserted when `cdvd_source` is `Iso`
    pub current_iso: Option<PathBuf>,
    /// Executable booted directly instead of a disc
    pub elf_override: Option<PathBuf>,
    /// IRX module injected at boot (empty by default)
    pub current_irx: Option<PathBuf>,
    pub enable_ipc: bool,
    pub gs: GsConfig,
}

/// Disc source presented to the emulated CDVD drive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum CdvdSource {
    Iso,
    #[default]
    NoDisc,
}

/// Vertical sync mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum VsyncMode {
    #[default]
    Off,
    On,
    Adaptive,
}

/// GS pacing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GsConfig {
    pub vsync: VsyncMode,
    pub frame_limit_enable: bool,
    pub frames_to_draw: u32,
    pub frame_skip_enable: bool,
    pub frames_to_skip: u32,
}

impl Default for GsConfig {
    fn default() -> Self {
        Self {
            vsync: VsyncMode::Off,
            frame_limit_enable: true,
            frames_to_draw: 1,
            frame_skip_enable: false,
            frames_to_skip: 1,
        }
    }
}

impl Default for EmuConfig {
    fn default() -> Self {
        Self {
            bios: PathBuf::new(),
            use_boot2_injection: false,
            cdvd_source: CdvdSource::default(),
            current_iso: None,
            elf_override: None,
            current_irx: None,
            enable_ipc: false,
            gs: GsConfig::default(),
        }
    }
}

impl EmuConfig {
    /// Load configuration from `path`, or the defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Location of the persisted config below a host save directory.
    /// Falls back to the user data directory when the host has none.
    pub fn config_path(save_dir: Option<&Path>) -> PathBuf {
        let base = match save_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")),
        };
        base.join(CORE_DIR).join("inis").join("core.toml")
    }
}
