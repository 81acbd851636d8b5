// Configuration provider consumed by the registry

use super::types::{EngineId, ExecutableRole};

/// Engine-related configuration the registry reads at registration and
/// sort time. Implemented by [`crate::config::Config`].
pub trait EngineSettings: Send + Sync {
    fn is_engine_enabled(&self, id: &EngineId) -> bool;

    /// Position in the priority table, `None` when the engine is not listed
    fn priority_rank(&self, id: &EngineId) -> Option<usize>;

    /// Preferred executable role, if one is configured
    fn executable_role(&self, _id: &EngineId) -> Option<ExecutableRole> {
        None
    }
}
