// Registration, listing, lookup and dispatch through the public registry API

use engine_registry::engine::{
    EngineFamily, EnginePurpose, ExecutableRole, MediaResource, RegistryError, Unavailability,
};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

use crate::common::fixtures::*;
use crate::common::stubs::*;

#[cfg(unix)]
#[test]
fn test_configured_engine_available_and_unconfigured_one_not() {
    let dir = TempDir::new().unwrap();
    let alpha_path = executable(dir.path(), "alpha");
    let runner = StubRunner::new().reply(&alpha_path, Reply::lines(0, &[FFMPEG_BANNER]));
    let (registry, runner) = registry_with(StubSettings::ranked(&["Alpha"]), linux64(), runner);

    registry.register(ffmpeg_engine("Alpha", Some(&alpha_path))).unwrap();
    registry.register(ffmpeg_engine("Beta", None)).unwrap();

    assert_eq!(ids(&registry.all_engines()), vec!["Alpha", "Beta"]);
    assert_eq!(ids(&registry.active_engines()), vec!["Alpha"]);

    let alpha = registry.lookup("Alpha").unwrap();
    assert_eq!(alpha.version(), Some("4.2.1"));
    assert_eq!(registry.executable_for("alpha"), Some(alpha_path.clone()));

    let beta = registry.lookup("Beta").unwrap();
    assert!(!beta.is_available());
    assert_eq!(
        beta.availability(ExecutableRole::Installed).reason(),
        Some(&Unavailability::NotDefined {
            engine: "Beta".to_string()
        })
    );

    assert_eq!(runner.calls(), vec![(alpha_path, vec!["-version".to_string()])]);
}

#[cfg(unix)]
#[test]
fn test_failed_probe_reports_trailing_lines() {
    let dir = TempDir::new().unwrap();
    let alpha_path = executable(dir.path(), "alpha");
    let runner = StubRunner::new().reply(
        &alpha_path,
        Reply::lines(1, &["Unrecognized option", "Error splitting the argument list", "Option not found"]),
    );
    let (registry, _) = registry_with(StubSettings::default(), linux64(), runner);

    registry.register(ffmpeg_engine("Alpha", Some(&alpha_path))).unwrap();

    let alpha = registry.lookup("Alpha").unwrap();
    assert!(!alpha.is_available());
    let reason = alpha.availability(ExecutableRole::Installed).reason().unwrap();
    assert_eq!(
        reason.to_string(),
        "An error occurred while testing transcoding engine Alpha \nError splitting the argument list Option not found"
    );
    assert!(!registry.is_active("Alpha").unwrap());
}

#[test]
fn test_launch_failure_is_absorbed() {
    let (registry, _) = registry_with(StubSettings::default(), linux64(), StubRunner::new());

    registry.register(ffmpeg_engine("FFmpegVideo", Some("ffmpeg".as_ref()))).unwrap();

    let engine = registry.lookup("FFmpegVideo").unwrap();
    let reason = engine.availability(ExecutableRole::Installed).reason().unwrap();
    assert!(matches!(reason, Unavailability::LaunchFailed { .. }));
    assert!(reason.to_string().starts_with("An error occurred while testing transcoding engine FFmpegVideo \n"));
}

#[test]
fn test_duplicate_ids_are_registered_once() {
    let runner = StubRunner::new().otherwise(Reply::lines(0, &[FFMPEG_BANNER]));
    let (registry, runner) = registry_with(StubSettings::default(), linux64(), runner);

    registry.register(ffmpeg_engine("FFmpegVideo", Some("ffmpeg".as_ref()))).unwrap();
    registry.register(ffmpeg_engine("ffmpegVIDEO", Some("other-ffmpeg".as_ref()))).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn test_is_active_edge_cases() {
    let runner = StubRunner::new().otherwise(Reply::lines(0, &[FFMPEG_BANNER]));
    let (registry, _) = registry_with(StubSettings::default().disable("Off"), linux64(), runner);
    registry.register(ffmpeg_engine("On", Some("ffmpeg".as_ref()))).unwrap();
    registry.register(ffmpeg_engine("Off", Some("ffmpeg".as_ref()))).unwrap();

    assert!(matches!(registry.is_active(""), Err(RegistryError::BlankEngineId)));
    assert!(matches!(registry.is_active(" \t"), Err(RegistryError::BlankEngineId)));
    assert!(!registry.is_active("Unknown").unwrap());
    assert!(registry.is_active("on").unwrap());
    assert!(!registry.is_active("Off").unwrap());
    assert_eq!(registry.engines(false, true).len(), 2);
    assert_eq!(registry.engines(true, false).len(), 1);
}

#[test]
fn test_engine_for_is_head_of_engines_for() {
    let runner = StubRunner::new().otherwise(Reply::lines(0, &[FFMPEG_BANNER]));
    let settings = StubSettings::ranked(&["FFmpegVideo", "VLCVideo", "FFmpegAudio"]).disable("MEncoderVideo");
    let (registry, _) = registry_with(settings, linux64(), runner);

    for (id, family, purpose) in [
        ("FFmpegAudio", EngineFamily::FFmpeg, EnginePurpose::AudioFile),
        ("MEncoderVideo", EngineFamily::MEncoder, EnginePurpose::VideoFile),
        ("VLCVideo", EngineFamily::Vlc, EnginePurpose::VideoFile),
        ("FFmpegVideo", EngineFamily::FFmpeg, EnginePurpose::VideoFile),
    ] {
        registry.register(engine(id, family, purpose, Some("tool".as_ref()))).unwrap();
    }

    let video = MediaResource::new("/media/movie.mkv");
    let all = registry.engines_for(&video);
    assert_eq!(ids(&all), vec!["FFmpegVideo", "VLCVideo"]);
    assert_eq!(registry.engine_for(&video).unwrap().id(), all[0].id());

    let audio = StubResource::new("track", EnginePurpose::AudioFile);
    assert_eq!(registry.engine_for(&audio).unwrap().id().as_str(), "FFmpegAudio");

    let stream = StubResource::new("live", EnginePurpose::AudioStream);
    assert!(registry.engine_for(&stream).is_none());
    assert!(registry.engines_for(&stream).is_empty());
}

#[test]
fn test_configured_role_wins_when_available() {
    let runner = StubRunner::new()
        .reply("ffmpeg", Reply::lines(0, &[FFMPEG_BANNER]))
        .reply("ffmpeg-git", Reply::lines(0, &["ffmpeg version N-112000-g1234 Copyright (c) 2000-2023"]));
    let settings = StubSettings::default().prefer("FFmpegVideo", ExecutableRole::Custom);
    let (registry, runner) = registry_with(settings, linux64(), runner);

    let engine = ffmpeg_engine("FFmpegVideo", Some("ffmpeg".as_ref()))
        .with_executable(ExecutableRole::Custom, Some("ffmpeg-git".into()));
    registry.register(engine).unwrap();

    let engine = registry.lookup("FFmpegVideo").unwrap();
    assert_eq!(engine.current_role(), ExecutableRole::Custom);
    assert_eq!(engine.version(), Some("N-112000-g1234"));
    assert_eq!(runner.call_count(), 2);

    registry.select_role("FFmpegVideo", ExecutableRole::Installed).unwrap();
    assert_eq!(registry.lookup("FFmpegVideo").unwrap().version(), Some("4.2.1"));
}

#[test]
fn test_falls_back_to_working_role() {
    let runner = StubRunner::new().reply("ffmpeg", Reply::lines(0, &[FFMPEG_BANNER]));
    let settings = StubSettings::default().prefer("FFmpegVideo", ExecutableRole::Custom);
    let (registry, _) = registry_with(settings, linux64(), runner);

    let engine = ffmpeg_engine("FFmpegVideo", Some("ffmpeg".as_ref()))
        .with_executable(ExecutableRole::Custom, None);
    registry.register(engine).unwrap();

    let engine = registry.lookup("FFmpegVideo").unwrap();
    assert_eq!(engine.current_role(), ExecutableRole::Installed);
    assert!(engine.is_active());
}

#[test]
fn test_interrupted_registration() {
    let runner = StubRunner::new().reply("ffmpeg", Reply::Interrupted);
    let (registry, runner) = registry_with(StubSettings::default(), linux64(), runner);

    let err = registry.register(ffmpeg_engine("FFmpegVideo", Some("ffmpeg".as_ref()))).unwrap_err();
    assert!(matches!(err, RegistryError::Interrupted { .. }));

    // The engine stays registered but is not usable
    let engine = registry.lookup("FFmpegVideo").unwrap();
    assert!(!engine.is_available());
    assert!(registry.probe_records().is_empty());

    // Nothing was cached, so a fresh engine on the same path probes again
    let _ = registry.register(ffmpeg_engine("FFmpegAudio", Some("ffmpeg".as_ref())));
    assert_eq!(runner.calls_for("ffmpeg".as_ref()), 2);
}

#[test]
fn test_set_enabled_and_resort() {
    let runner = StubRunner::new().otherwise(Reply::lines(0, &[FFMPEG_BANNER]));
    let (registry, _) = registry_with(StubSettings::ranked(&["A", "B"]), linux64(), runner);
    registry.register(ffmpeg_engine("B", Some("ffmpeg".as_ref()))).unwrap();
    registry.register(ffmpeg_engine("A", Some("ffmpeg".as_ref()))).unwrap();
    assert_eq!(ids(&registry.all_engines()), vec!["A", "B"]);

    registry.set_enabled("A", false).unwrap();
    assert_eq!(ids(&registry.active_engines()), vec!["B"]);
    assert!(matches!(registry.set_enabled("", true), Err(RegistryError::BlankEngineId)));
    assert!(matches!(registry.set_enabled("C", true), Err(RegistryError::UnknownEngine(_))));

    registry.update_settings(Arc::new(StubSettings::ranked(&["B"])));
    assert_eq!(ids(&registry.all_engines()), vec!["B", "A"]);
}

#[test]
fn test_concurrent_readers_see_consistent_snapshots() {
    let runner = StubRunner::new().otherwise(Reply::lines(0, &[FFMPEG_BANNER]));
    let (registry, _) = registry_with(StubSettings::default(), linux64(), runner);
    let video = MediaResource::new("clip.mp4");

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..50 {
                let id = format!("Engine{}", i);
                registry.register(ffmpeg_engine(&id, Some("ffmpeg".as_ref()))).unwrap();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let all = registry.engines_for(&video);
                    if let Some(first) = registry.engine_for(&video) {
                        assert!(first.is_active());
                    }
                    assert!(all.iter().all(|e| e.is_active()));
                }
            });
        }
    });

    assert_eq!(registry.len(), 50);
    assert_eq!(registry.probe_records().len(), 1);
}
