//! Functional probing of engine executables.
//!
//! Each tool family is described by a [`ProbeSpec`]: the arguments to run
//! the tool with, the shape of a successful answer, the version pattern and
//! how a diagnostic is pulled out of a failed run. Families without a usable
//! stdout signal (VLC) have no descriptor and are never run.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use super::cache::{ProbeCache, ProbeRecord, ProbeVerdict};
use super::error::{Interrupted, Unavailability};
use super::platform::Platform;
use super::process::{ProcessOutput, ProcessRunner, RunError};
use super::types::{Engine, EngineFamily, ExecutableRole};

static FFMPEG_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ffmpeg version\s+(.*?)\s+Copyright").expect("ffmpeg version pattern")
});

static MENCODER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^MEncoder\s+(.*?)\s+\(C\)").expect("mencoder version pattern")
});

static TSMUXER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tsMuxeR\.\s+Version\s(\S+)\s+").expect("tsmuxer version pattern")
});

static DCRAW_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)decoder\s"dcraw"\s(\S+)"#).expect("dcraw version pattern")
});

const NO_DIAGNOSTIC: &str = ": no further details are available";

const TSMUXER_LINUX64_HINT: &str =
    "tsMuxeR is a 32-bit program, make sure the 32-bit system libraries are installed";

/// What a successful run looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessShape {
    /// Exit code 0, version on the first line
    ExitZero,
    /// Exit code ignored, blank first line, version on the second line
    BlankBanner,
}

/// Where the diagnostic of a failed run comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDetail {
    /// Last two lines, or the last line when only two were printed
    TrailingLines,
    /// Third-from-last line when followed by a blank line and one more line
    BeforeBlankSeparator,
    /// Numeric exit code, plus a hint on 64-bit Linux
    ExitCode { linux64_hint: Option<&'static str> },
    /// First output line
    FirstLine,
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeSpec {
    pub args: &'static [&'static str],
    pub success: SuccessShape,
    pub version: &'static LazyLock<Regex>,
    pub failure: FailureDetail,
}

/// Probe descriptor for a family, if the family can be probed at all
pub fn probe_spec(family: EngineFamily) -> Option<ProbeSpec> {
    match family {
        EngineFamily::FFmpeg => Some(ProbeSpec {
            args: &["-version"],
            success: SuccessShape::ExitZero,
            version: &FFMPEG_VERSION,
            failure: FailureDetail::TrailingLines,
        }),
        EngineFamily::MEncoder => Some(ProbeSpec {
            args: &["-info:help"],
            success: SuccessShape::ExitZero,
            version: &MENCODER_VERSION,
            failure: FailureDetail::BeforeBlankSeparator,
        }),
        EngineFamily::TsMuxeR => Some(ProbeSpec {
            args: &["-v"],
            success: SuccessShape::ExitZero,
            version: &TSMUXER_VERSION,
            failure: FailureDetail::ExitCode {
                linux64_hint: Some(TSMUXER_LINUX64_HINT),
            },
        }),
        EngineFamily::DCRaw => Some(ProbeSpec {
            args: &[],
            success: SuccessShape::BlankBanner,
            version: &DCRAW_VERSION,
            failure: FailureDetail::FirstLine,
        }),
        // No way to get feedback from VLC on stdout
        EngineFamily::Vlc => None,
    }
}

/// Generic error headline for diagnostics
pub fn engine_error(engine: &str) -> String {
    format!("An error occurred while testing transcoding engine {}", engine)
}

/// Interpret the captured output of a probe run
pub fn evaluate(
    spec: &ProbeSpec,
    engine: &str,
    output: &ProcessOutput,
    platform: &Platform,
) -> ProbeVerdict {
    let lines = &output.lines;

    let version_line = match spec.success {
        SuccessShape::ExitZero if output.exit_code == 0 => Some(lines.first()),
        SuccessShape::BlankBanner if lines.first().is_some_and(|l| l.trim().is_empty()) => {
            Some(lines.get(1))
        }
        _ => None,
    };

    match version_line {
        // Unrecognised output from a responsive tool still counts as success
        Some(line) => Ok(line.and_then(|l| extract_version(spec.version, l))),
        None => Err(Unavailability::Rejected {
            diagnostic: failure_diagnostic(spec.failure, engine, output, platform),
        }),
    }
}

fn extract_version(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn has_value(line: &str) -> bool {
    !line.trim().is_empty()
}

fn failure_diagnostic(
    detail: FailureDetail,
    engine: &str,
    output: &ProcessOutput,
    platform: &Platform,
) -> String {
    let lines = &output.lines;
    let n = lines.len();
    let error = engine_error(engine);

    match detail {
        FailureDetail::TrailingLines if n > 2 => {
            format!("{} \n{} {}", error, lines[n - 2], lines[n - 1])
        }
        FailureDetail::TrailingLines if n > 1 => format!("{} \n{}", error, lines[n - 1]),
        FailureDetail::BeforeBlankSeparator
            if n > 3
                && has_value(&lines[n - 1])
                && !has_value(&lines[n - 2])
                && has_value(&lines[n - 3]) =>
        {
            format!("{} \n{}", error, lines[n - 3])
        }
        FailureDetail::ExitCode { linux64_hint } => {
            let mut diagnostic = format!(
                "Transcoding engine {} exited with code {}",
                engine, output.exit_code
            );
            if let Some(hint) = linux64_hint {
                if platform.is_linux() && platform.is_64bit {
                    diagnostic.push_str(". \n");
                    diagnostic.push_str(hint);
                }
            }
            diagnostic
        }
        FailureDetail::FirstLine if n > 0 => format!("{} \n{}", error, lines[0]),
        _ => format!("{}{}", error, NO_DIAGNOSTIC),
    }
}

/// Runs family probes, consulting and filling the probe cache
pub struct Prober<'a> {
    runner: &'a dyn ProcessRunner,
    platform: &'a Platform,
}

impl<'a> Prober<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, platform: &'a Platform) -> Self {
        Self { runner, platform }
    }

    /// Probe `executable` on behalf of `engine`.
    ///
    /// Returns `Ok(None)` when nothing is cached for the path and the
    /// engine's family has no probe; the caller decides availability then.
    pub fn probe(
        &self,
        cache: &mut ProbeCache,
        engine: &Engine,
        role: ExecutableRole,
        executable: &Path,
    ) -> Result<Option<ProbeVerdict>, Interrupted> {
        if let Some(record) = cache.get(executable) {
            debug!(
                "Reusing probe result of \"{}\" for transcoding engine {} ({})",
                executable.display(),
                engine,
                role
            );
            return Ok(Some(record.verdict.clone()));
        }

        let Some(spec) = probe_spec(engine.family()) else {
            return Ok(None);
        };

        let verdict = match self.runner.run(executable, spec.args) {
            Ok(output) => evaluate(&spec, engine.name(), &output, self.platform),
            Err(RunError::Interrupted) => return Err(Interrupted),
            Err(e) => {
                debug!(
                    "\"{} {}\" ({}) failed with error: {}",
                    executable.display(),
                    spec.args.join(" "),
                    role,
                    e
                );
                Err(Unavailability::LaunchFailed {
                    diagnostic: format!("{} \n{}", engine_error(engine.name()), e),
                })
            }
        };

        cache.insert(ProbeRecord::new(executable.to_path_buf(), verdict.clone()));
        Ok(Some(verdict))
    }
}
