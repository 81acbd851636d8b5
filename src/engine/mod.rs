// Transcoding engine registry - independent of the CLI

pub mod cache;
pub mod catalog;
pub mod error;
pub mod matcher;
pub mod platform;
pub mod priority;
pub mod probe;
pub mod process;
pub mod registry;
pub mod resolve;
pub mod resource;
pub mod settings;
pub mod types;

pub use cache::{ProbeCache, ProbeRecord, ProbeVerdict};
pub use catalog::{builtin_engines, register_builtin};
pub use error::{Interrupted, RegistryError, Unavailability};
pub use platform::{Os, Platform};
pub use priority::{UNRANKED, sort_by_priority};
pub use process::{InterruptHandle, ProcessOutput, ProcessRunner, RunError, SystemRunner};
pub use registry::EngineRegistry;
pub use resolve::{AccessError, ResolvedExecutable, check_executable, resolve_executable};
pub use resource::{MediaResource, Resource};
pub use settings::EngineSettings;
pub use types::{Availability, Engine, EngineFamily, EngineId, EnginePurpose, ExecutableRole};
