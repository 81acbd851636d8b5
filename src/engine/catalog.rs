// Built-in transcoding engines known to the media server

use tracing::debug;

use super::error::RegistryError;
use super::platform::Platform;
use super::registry::EngineRegistry;
use super::types::{Engine, EngineFamily, EnginePurpose, ExecutableRole};
use crate::config::ExecutablesConfig;

struct Builtin {
    id: &'static str,
    name: &'static str,
    family: EngineFamily,
    purpose: EnginePurpose,
    avisynth: bool,
}

const fn builtin(
    id: &'static str,
    name: &'static str,
    family: EngineFamily,
    purpose: EnginePurpose,
) -> Builtin {
    Builtin {
        id,
        name,
        family,
        purpose,
        avisynth: false,
    }
}

const WINDOWS_ONLY: &[Builtin] = &[
    Builtin {
        avisynth: true,
        ..builtin("AviSynthFFmpeg", "AviSynth/FFmpeg", EngineFamily::FFmpeg, EnginePurpose::VideoFile)
    },
    Builtin {
        avisynth: true,
        ..builtin("AviSynthMEncoder", "AviSynth/MEncoder", EngineFamily::MEncoder, EnginePurpose::VideoFile)
    },
    builtin("FFmpegDVRMSRemux", "FFmpeg DVR-MS Remux", EngineFamily::FFmpeg, EnginePurpose::Misc),
];

const PORTABLE: &[Builtin] = &[
    builtin("FFmpegAudio", "FFmpeg Audio", EngineFamily::FFmpeg, EnginePurpose::AudioFile),
    builtin("MEncoderVideo", "MEncoder", EngineFamily::MEncoder, EnginePurpose::VideoFile),
    builtin("FFmpegVideo", "FFmpeg", EngineFamily::FFmpeg, EnginePurpose::VideoFile),
    builtin("VLCVideo", "VLC", EngineFamily::Vlc, EnginePurpose::VideoFile),
    builtin("FFmpegWebVideo", "FFmpeg Web Video", EngineFamily::FFmpeg, EnginePurpose::VideoStream),
    builtin("MEncoderWebVideo", "MEncoder Web", EngineFamily::MEncoder, EnginePurpose::VideoStream),
    builtin("VLCWebVideo", "VLC Web Video", EngineFamily::Vlc, EnginePurpose::VideoStream),
    builtin("tsMuxeRVideo", "tsMuxeR", EngineFamily::TsMuxeR, EnginePurpose::VideoFile),
    builtin("tsMuxeRAudio", "tsMuxeR Audio", EngineFamily::TsMuxeR, EnginePurpose::AudioFile),
    builtin("VLCAudioStreaming", "VLC Web Audio (Legacy)", EngineFamily::Vlc, EnginePurpose::AudioStream),
    builtin("VLCVideoStreaming", "VLC Web Video (Legacy)", EngineFamily::Vlc, EnginePurpose::VideoStream),
    builtin("DCRaw", "DCRaw", EngineFamily::DCRaw, EnginePurpose::Misc),
];

fn default_role(platform: &Platform) -> ExecutableRole {
    if platform.is_windows() {
        ExecutableRole::Bundled
    } else {
        ExecutableRole::Installed
    }
}

fn build(spec: &Builtin, executables: &ExecutablesConfig, platform: &Platform) -> Engine {
    let paths = executables.paths(spec.family);
    let mut engine = ExecutableRole::ALL.iter().fold(
        Engine::new(spec.id, spec.name, spec.family, spec.purpose),
        |engine, role| engine.with_executable(*role, paths.get(*role).map(Into::into)),
    );
    engine = engine.with_default_role(default_role(platform));
    if spec.avisynth {
        engine = engine.with_avisynth();
    }
    engine
}

/// The built-in engines for `platform`, in registration order
pub fn builtin_engines(executables: &ExecutablesConfig, platform: &Platform) -> Vec<Engine> {
    let windows_only: &[Builtin] = if platform.is_windows() { WINDOWS_ONLY } else { &[] };

    windows_only
        .iter()
        .chain(PORTABLE)
        .map(|spec| build(spec, executables, platform))
        .collect()
}

/// Register every built-in engine, stopping at the first interrupted probe
pub fn register_builtin(
    registry: &EngineRegistry,
    executables: &ExecutablesConfig,
) -> Result<(), RegistryError> {
    let engines = builtin_engines(executables, registry.platform());
    debug!("Registering {} built-in transcoding engines", engines.len());

    for engine in engines {
        registry.register(engine)?;
    }
    Ok(())
}
