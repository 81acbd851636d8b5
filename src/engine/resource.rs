//! Media resources as seen by the engine dispatcher.
//!
//! The server's resource tree implements [`Resource`]; the registry never
//! looks past `name` and `is_compatible`. [`MediaResource`] is a small
//! concrete resource classified from a file path or URL.

use std::path::Path;

use super::types::{Engine, EnginePurpose};

/// A playable item the dispatcher is asked to find an engine for
pub trait Resource {
    /// Display name used in diagnostics
    fn name(&self) -> &str;

    /// Whether `engine` can handle this resource
    fn is_compatible(&self, engine: &Engine) -> bool;
}

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "mov", "avi", "flv", "m4v", "wmv", "mpg", "mpeg", "ts", "m2ts", "vob",
    "dvr-ms",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "wav", "m4a", "aac", "ac3", "dts", "mlp", "wma", "ape", "opus",
];

/// Camera raw formats decoded by the thumbnailer
const RAW_IMAGE_EXTENSIONS: &[&str] = &[
    "arw", "cr2", "cr3", "crw", "dng", "erf", "kdc", "mrw", "nef", "nrw", "orf", "pef", "raf",
    "rw2", "sr2", "srf", "x3f",
];

const STREAM_SCHEMES: &[&str] = &["http", "https", "rtsp", "rtmp", "mms", "mmsh", "udp", "rtp"];

/// A file or URL classified by scheme and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResource {
    location: String,
    purpose: Option<EnginePurpose>,
}

impl MediaResource {
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let purpose = classify(&location);
        Self { location, purpose }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Engine purpose this resource needs, `None` for unknown media
    pub fn purpose(&self) -> Option<EnginePurpose> {
        self.purpose
    }
}

impl Resource for MediaResource {
    fn name(&self) -> &str {
        &self.location
    }

    fn is_compatible(&self, engine: &Engine) -> bool {
        self.purpose == Some(engine.purpose())
    }
}

fn classify(location: &str) -> Option<EnginePurpose> {
    let (is_stream, path) = match location.split_once("://") {
        Some((scheme, rest)) if STREAM_SCHEMES.contains(&scheme.to_lowercase().as_str()) => {
            let path = rest.split(['?', '#']).next().unwrap_or(rest);
            (true, path)
        }
        _ => (false, location),
    };

    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    let extension = extension.as_deref();
    let is_audio = extension.is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext));

    if is_stream {
        return Some(if is_audio {
            EnginePurpose::AudioStream
        } else {
            EnginePurpose::VideoStream
        });
    }

    let ext = extension?;
    if VIDEO_EXTENSIONS.contains(&ext) {
        Some(EnginePurpose::VideoFile)
    } else if is_audio {
        Some(EnginePurpose::AudioFile)
    } else if RAW_IMAGE_EXTENSIONS.contains(&ext) {
        Some(EnginePurpose::Misc)
    } else {
        None
    }
}
