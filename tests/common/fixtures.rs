#![allow(dead_code)]

use engine_registry::engine::{
    Engine, EngineFamily, EnginePurpose, EngineRegistry, ExecutableRole, Os, Platform,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::stubs::{StubRunner, StubSettings};

pub const FFMPEG_BANNER: &str = "ffmpeg version 4.2.1 Copyright (c) 2000-2019 the FFmpeg developers";

pub fn linux64() -> Platform {
    Platform::new(Os::Linux, true)
}

pub fn windows() -> Platform {
    Platform::new(Os::Windows, true)
}

/// Registry wired to stubs, returning the runner for call inspection
pub fn registry_with(
    settings: StubSettings,
    platform: Platform,
    runner: StubRunner,
) -> (EngineRegistry, Arc<StubRunner>) {
    let runner = Arc::new(runner);
    let registry = EngineRegistry::new(Arc::new(settings), platform, runner.clone());
    (registry, runner)
}

/// Engine with a single installed executable
pub fn engine(
    id: &str,
    family: EngineFamily,
    purpose: EnginePurpose,
    path: Option<&Path>,
) -> Engine {
    Engine::new(id, id, family, purpose)
        .with_executable(ExecutableRole::Installed, path.map(Path::to_path_buf))
}

pub fn ffmpeg_engine(id: &str, path: Option<&Path>) -> Engine {
    engine(id, EngineFamily::FFmpeg, EnginePurpose::VideoFile, path)
}

/// Write a file with the given permission bits
#[cfg(unix)]
pub fn script(dir: &Path, name: &str, mode: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).expect("chmod script");
    path
}

#[cfg(unix)]
pub fn executable(dir: &Path, name: &str) -> PathBuf {
    script(dir, name, 0o755)
}

pub fn ids(engines: &[Engine]) -> Vec<String> {
    engines.iter().map(|e| e.id().to_string()).collect()
}
