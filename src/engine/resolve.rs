//! Executable resolution and presence/permission checks for engine roles.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::error::Unavailability;
use super::platform::Platform;
use super::types::{Engine, ExecutableRole};

/// Extensions Windows recognises as directly executable
pub const WINDOWS_EXTENSIONS: &[&str] = &["exe", "com", "bat"];

const DEFAULT_WINDOWS_EXTENSION: &str = "exe";

/// Concrete executable computed from a configured path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedExecutable {
    /// Plain file name, looked up through the search path at execution time
    Bare(PathBuf),
    /// Absolute path, subject to presence and permission checks
    Absolute(PathBuf),
}

impl ResolvedExecutable {
    pub fn path(&self) -> &Path {
        match self {
            Self::Bare(path) | Self::Absolute(path) => path,
        }
    }
}

/// Resolve the executable of `role` for `engine` on `platform`
pub fn resolve_executable(
    engine: &Engine,
    role: ExecutableRole,
    platform: &Platform,
) -> Result<ResolvedExecutable, Unavailability> {
    let configured = engine
        .configured_path(role)
        .filter(|path| !path.as_os_str().is_empty());

    let Some(configured) = configured else {
        warn!("{} executable of transcoding engine {} is undefined", role, engine);
        return Err(Unavailability::NotDefined {
            engine: engine.name().to_string(),
        });
    };

    if engine.requires_avisynth() && !platform.is_windows() {
        debug!(
            "Skipping transcoding engine {} ({}) as it's not compatible with this platform",
            engine, role
        );
        return Err(Unavailability::PlatformIncompatible {
            engine: engine.name().to_string(),
        });
    }

    let executable = if platform.is_windows() && !has_windows_extension(configured) {
        with_default_extension(configured)
    } else {
        configured.to_path_buf()
    };

    if is_bare(&executable) {
        return Ok(ResolvedExecutable::Bare(executable));
    }

    match std::path::absolute(&executable) {
        Ok(absolute) => Ok(ResolvedExecutable::Absolute(absolute)),
        Err(e) => {
            warn!(
                "Could not make \"{}\" of transcoding engine {} ({}) absolute: {}",
                executable.display(),
                engine,
                role,
                e
            );
            Err(Unavailability::NotFound {
                path: executable,
                engine: engine.name().to_string(),
            })
        }
    }
}

fn has_windows_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            WINDOWS_EXTENSIONS
                .iter()
                .any(|valid| valid.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn with_default_extension(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(DEFAULT_WINDOWS_EXTENSION);
    PathBuf::from(name)
}

/// A path consisting of nothing but a file name
fn is_bare(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("File not found")]
    NotFound,

    #[error("File is not executable")]
    NotExecutable,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Check that `path` exists and may be executed by the current user
pub fn check_executable(path: &Path) -> Result<(), AccessError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(AccessError::NotFound),
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(AccessError::NotExecutable);
    }
    may_execute(path)
}

/// Ask the kernel whether the calling user may execute `path`
#[cfg(unix)]
fn may_execute(path: &Path) -> Result<(), AccessError> {
    use nix::errno::Errno;
    use nix::unistd::{AccessFlags, access};

    match access(path, AccessFlags::X_OK) {
        Ok(()) => Ok(()),
        Err(Errno::EACCES | Errno::EPERM) => Err(AccessError::NotExecutable),
        Err(Errno::ENOENT) => Err(AccessError::NotFound),
        Err(errno) => Err(io::Error::from(errno).into()),
    }
}

#[cfg(not(unix))]
fn may_execute(_path: &Path) -> Result<(), AccessError> {
    Ok(())
}

/// Run the presence/permission check and translate failures into a reason
pub fn verify_access(
    engine: &Engine,
    role: ExecutableRole,
    path: &Path,
) -> Result<(), Unavailability> {
    match check_executable(path) {
        Ok(()) => Ok(()),
        Err(AccessError::NotFound) => {
            warn!(
                "{} executable \"{}\" of transcoding engine {} not found",
                role,
                path.display(),
                engine
            );
            Err(Unavailability::NotFound {
                path: path.to_path_buf(),
                engine: engine.name().to_string(),
            })
        }
        Err(e) => {
            warn!(
                "Insufficient permission to execute \"{}\" for transcoding engine {} ({}): {}",
                path.display(),
                engine,
                role,
                e
            );
            Err(Unavailability::NoExecutePermission {
                path: path.to_path_buf(),
                engine: engine.name().to_string(),
            })
        }
    }
}
