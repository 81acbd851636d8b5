//! Host platform facts consulted while resolving engine executables.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Windows,
    Linux,
    MacOs,
    Other,
}

/// Platform description injected into the registry.
///
/// `Platform::current()` detects the host; tests construct arbitrary
/// platforms to exercise Windows-only rules anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os: Os,
    pub is_64bit: bool,
    pub avisynth_installed: bool,
}

impl Platform {
    pub fn current() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else {
            Os::Other
        };

        Self {
            os,
            is_64bit: cfg!(target_pointer_width = "64"),
            avisynth_installed: os == Os::Windows && detect_avisynth(),
        }
    }

    pub fn new(os: Os, is_64bit: bool) -> Self {
        Self {
            os,
            is_64bit,
            avisynth_installed: false,
        }
    }

    #[must_use]
    pub fn with_avisynth(mut self, installed: bool) -> Self {
        self.avisynth_installed = installed;
        self
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }
}

/// AviSynth installs its runtime DLL into the Windows system directory
fn detect_avisynth() -> bool {
    let Some(root) = std::env::var_os("SystemRoot") else {
        return false;
    };
    let root = PathBuf::from(root);

    ["System32", "SysWOW64"]
        .iter()
        .any(|dir| root.join(dir).join("avisynth.dll").is_file())
}
