use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::Unavailability;

/// Stable identifier of a transcoding engine.
///
/// Identifiers compare case-insensitively, so `ffmpegvideo` and `FFmpegVideo`
/// name the same engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(String);

impl EngineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a raw identifier string names this engine
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for EngineId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for EngineId {}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EngineId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Variant of an engine's backing binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableRole {
    Bundled,   // Shipped alongside the server
    Installed, // Found on the host, usually through PATH
    Custom,    // Explicitly configured by the user
}

impl ExecutableRole {
    pub const ALL: [ExecutableRole; 3] = [Self::Bundled, Self::Installed, Self::Custom];
}

impl fmt::Display for ExecutableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bundled => "bundled",
            Self::Installed => "installed",
            Self::Custom => "custom",
        })
    }
}

/// Tool family backing an engine. Selects the functional probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFamily {
    FFmpeg,
    MEncoder,
    TsMuxeR,
    DCRaw,
    Vlc,
}

impl fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FFmpeg => "ffmpeg",
            Self::MEncoder => "mencoder",
            Self::TsMuxeR => "tsmuxer",
            Self::DCRaw => "dcraw",
            Self::Vlc => "vlc",
        })
    }
}

/// Kind of media an engine produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePurpose {
    VideoFile,
    AudioFile,
    VideoStream,
    AudioStream,
    Misc,
}

/// Availability of one executable role
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Availability {
    #[default]
    Unknown,
    Available {
        version: Option<String>,
    },
    Unavailable {
        reason: Unavailability,
    },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Available { version } => version.as_deref(),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&Unavailability> {
        match self {
            Self::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }

    /// Short state label for listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Available { .. } => "available",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

/// Configured and verified state of a single executable role
#[derive(Debug, Clone, Default)]
struct RoleState {
    configured: Option<PathBuf>,
    resolved: Option<PathBuf>,
    availability: Availability,
}

static UNKNOWN: Availability = Availability::Unknown;

/// A registered unit of transcoding capability
#[derive(Debug, Clone)]
pub struct Engine {
    id: EngineId,
    name: String,
    family: EngineFamily,
    purpose: EnginePurpose,
    requires_avisynth: bool,
    roles: BTreeMap<ExecutableRole, RoleState>,
    default_role: ExecutableRole,
    current_role: ExecutableRole,
    enabled: bool,
}

impl Engine {
    pub fn new(
        id: impl Into<EngineId>,
        name: impl Into<String>,
        family: EngineFamily,
        purpose: EnginePurpose,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            family,
            purpose,
            requires_avisynth: false,
            roles: BTreeMap::new(),
            default_role: ExecutableRole::Installed,
            current_role: ExecutableRole::Installed,
            enabled: true,
        }
    }

    /// Declare a supported executable role and its configured path (if any)
    #[must_use]
    pub fn with_executable(mut self, role: ExecutableRole, path: Option<PathBuf>) -> Self {
        self.roles.insert(
            role,
            RoleState {
                configured: path,
                ..RoleState::default()
            },
        );
        self
    }

    #[must_use]
    pub fn with_default_role(mut self, role: ExecutableRole) -> Self {
        self.default_role = role;
        self.current_role = role;
        self
    }

    /// Mark the engine as depending on the AviSynth scripting runtime
    #[must_use]
    pub fn with_avisynth(mut self) -> Self {
        self.requires_avisynth = true;
        self
    }

    pub fn id(&self) -> &EngineId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> EngineFamily {
        self.family
    }

    pub fn purpose(&self) -> EnginePurpose {
        self.purpose
    }

    pub fn requires_avisynth(&self) -> bool {
        self.requires_avisynth
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_role(&self) -> ExecutableRole {
        self.default_role
    }

    pub fn current_role(&self) -> ExecutableRole {
        self.current_role
    }

    /// Supported roles in declaration order
    pub fn roles(&self) -> impl Iterator<Item = ExecutableRole> + '_ {
        self.roles.keys().copied()
    }

    pub fn configured_path(&self, role: ExecutableRole) -> Option<&Path> {
        self.roles.get(&role)?.configured.as_deref()
    }

    pub fn resolved_path(&self, role: ExecutableRole) -> Option<&Path> {
        self.roles.get(&role)?.resolved.as_deref()
    }

    pub fn availability(&self, role: ExecutableRole) -> &Availability {
        self.roles
            .get(&role)
            .map(|state| &state.availability)
            .unwrap_or(&UNKNOWN)
    }

    pub fn is_available_for(&self, role: ExecutableRole) -> bool {
        self.availability(role).is_available()
    }

    /// The engine is available iff its current role is
    pub fn is_available(&self) -> bool {
        self.is_available_for(self.current_role)
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.is_available()
    }

    /// Version string reported by the current role's probe
    pub fn version(&self) -> Option<&str> {
        self.availability(self.current_role).version()
    }

    /// Executable of the current role, once resolved
    pub fn executable(&self) -> Option<&Path> {
        self.resolved_path(self.current_role)
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_current_role(&mut self, role: ExecutableRole) {
        self.current_role = role;
    }

    pub(crate) fn set_resolved(&mut self, role: ExecutableRole, path: PathBuf) {
        if let Some(state) = self.roles.get_mut(&role) {
            state.resolved = Some(path);
        }
    }

    pub(crate) fn set_available(&mut self, role: ExecutableRole, version: Option<String>) {
        self.set_availability(role, Availability::Available { version });
    }

    pub(crate) fn set_unavailable(&mut self, role: ExecutableRole, reason: Unavailability) {
        self.set_availability(role, Availability::Unavailable { reason });
    }

    pub(crate) fn apply_verdict(
        &mut self,
        role: ExecutableRole,
        verdict: Result<Option<String>, Unavailability>,
    ) {
        match verdict {
            Ok(version) => self.set_available(role, version),
            Err(reason) => self.set_unavailable(role, reason),
        }
    }

    fn set_availability(&mut self, role: ExecutableRole, availability: Availability) {
        if let Some(state) = self.roles.get_mut(&role) {
            state.availability = availability;
        }
    }

    /// Restart the per-role state machine before a verification cycle
    pub(crate) fn reset_availability(&mut self) {
        for state in self.roles.values_mut() {
            state.resolved = None;
            state.availability = Availability::Unknown;
        }
    }

    /// Pick the current role after probing: the preferred role if it works,
    /// then the default role, then the first working role. Falls back to the
    /// preferred role when nothing works.
    pub(crate) fn select_current_role(&mut self, preferred: Option<ExecutableRole>) {
        let preferred = preferred.unwrap_or(self.default_role);
        let role = if self.is_available_for(preferred) {
            preferred
        } else if self.is_available_for(self.default_role) {
            self.default_role
        } else {
            self.roles()
                .find(|role| self.is_available_for(*role))
                .unwrap_or(preferred)
        };
        self.current_role = role;
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
