// Ordering of engines by the configured priority table

use super::settings::EngineSettings;
use super::types::Engine;

/// Rank given to engines missing from the priority table
pub const UNRANKED: usize = usize::MAX;

pub fn rank_of(engine: &Engine, settings: &dyn EngineSettings) -> usize {
    settings.priority_rank(engine.id()).unwrap_or(UNRANKED)
}

/// Stable sort by ascending rank; equal ranks keep their relative order
pub fn sort_by_priority(engines: &mut [Engine], settings: &dyn EngineSettings) {
    engines.sort_by_cached_key(|engine| rank_of(engine, settings));
}
