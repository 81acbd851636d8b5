// Global configuration management

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::engine::{EngineFamily, EngineId, EngineSettings, ExecutableRole};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engines: EnginesConfig,

    #[serde(default)]
    pub executables: ExecutablesConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginesConfig {
    /// Engine identifiers in order of preference; unlisted engines go last
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,

    /// Engines the user has switched off
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Preferred executable role per engine identifier
    #[serde(default)]
    pub roles: BTreeMap<String, ExecutableRole>,
}

/// Executable paths of one tool, by role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutablesConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: ToolPaths,

    #[serde(default = "default_mencoder")]
    pub mencoder: ToolPaths,

    #[serde(default = "default_vlc")]
    pub vlc: ToolPaths,

    #[serde(default = "default_tsmuxer")]
    pub tsmuxer: ToolPaths,

    #[serde(default = "default_dcraw")]
    pub dcraw: ToolPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound for a single probe process, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_priority() -> Vec<String> {
    [
        "FFmpegVideo",
        "MEncoderVideo",
        "tsMuxeRVideo",
        "FFmpegAudio",
        "tsMuxeRAudio",
        "FFmpegWebVideo",
        "VLCWebVideo",
        "VLCVideo",
        "MEncoderWebVideo",
        "VLCAudioStreaming",
        "VLCVideoStreaming",
        "DCRaw",
        "AviSynthFFmpeg",
        "AviSynthMEncoder",
        "FFmpegDVRMSRemux",
    ]
    .iter()
    .map(|id| id.to_string())
    .collect()
}

fn installed(name: &str) -> ToolPaths {
    ToolPaths {
        installed: Some(PathBuf::from(name)),
        ..ToolPaths::default()
    }
}

fn default_ffmpeg() -> ToolPaths {
    installed("ffmpeg")
}

fn default_mencoder() -> ToolPaths {
    installed("mencoder")
}

fn default_vlc() -> ToolPaths {
    installed("vlc")
}

fn default_tsmuxer() -> ToolPaths {
    installed("tsMuxeR")
}

fn default_dcraw() -> ToolPaths {
    installed("dcraw")
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            disabled: Vec::new(),
            roles: BTreeMap::new(),
        }
    }
}

impl Default for ExecutablesConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            mencoder: default_mencoder(),
            vlc: default_vlc(),
            tsmuxer: default_tsmuxer(),
            dcraw: default_dcraw(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolPaths {
    pub fn get(&self, role: ExecutableRole) -> Option<&Path> {
        match role {
            ExecutableRole::Bundled => self.bundled.as_deref(),
            ExecutableRole::Installed => self.installed.as_deref(),
            ExecutableRole::Custom => self.custom.as_deref(),
        }
    }
}

impl ExecutablesConfig {
    /// Paths of the tool backing an engine family
    pub fn paths(&self, family: EngineFamily) -> &ToolPaths {
        match family {
            EngineFamily::FFmpeg => &self.ffmpeg,
            EngineFamily::MEncoder => &self.mencoder,
            EngineFamily::Vlc => &self.vlc,
            EngineFamily::TsMuxeR => &self.tsmuxer,
            EngineFamily::DCRaw => &self.dcraw,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("engine-registry");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, or write and return the defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            Ok(config)
        } else {
            let config = Config::default();

            // A read-only config directory is not fatal
            if let Err(e) = config.save_to(path) {
                warn!("Could not create default config file: {:#}", e);
                warn!("Using built-in defaults. Run 'engine-registry init-config' to create a config file.");
            }

            Ok(config)
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Write the default config to `path`, first moving any existing file
    /// aside to a timestamped `.bak` sibling. Returns the backup location.
    pub fn reset_to_default(path: &Path) -> Result<Option<PathBuf>> {
        let backup = if path.exists() {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "config.toml".to_string());
            let stamp = Local::now().format("%Y%m%d%H%M%S");
            let backup = path.with_file_name(format!("{}.{}.bak", file_name, stamp));

            fs::rename(path, &backup).with_context(|| {
                format!(
                    "Failed to back up config file {} to {}",
                    path.display(),
                    backup.display()
                )
            })?;
            Some(backup)
        } else {
            None
        };

        Self::default().save_to(path)?;
        Ok(backup)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }
}

impl EngineSettings for Config {
    fn is_engine_enabled(&self, id: &EngineId) -> bool {
        !self.engines.disabled.iter().any(|entry| id.matches(entry))
    }

    fn priority_rank(&self, id: &EngineId) -> Option<usize> {
        self.engines.priority.iter().position(|entry| id.matches(entry))
    }

    fn executable_role(&self, id: &EngineId) -> Option<ExecutableRole> {
        self.engines
            .roles
            .iter()
            .find(|(entry, _)| id.matches(entry))
            .map(|(_, role)| *role)
    }
}
