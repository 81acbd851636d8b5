//! The engine registry: the single store of known transcoding engines.
//!
//! One readers-writer lock guards the engine list together with the probe
//! cache and the settings provider. Registration, sorting and state changes take the write lock (so all
//! probing is serialized); listing, lookup and matching take the read lock
//! and hand out copies that are safe to use after the lock is released.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::{ProbeCache, ProbeRecord};
use super::error::{Interrupted, RegistryError, Unavailability};
use super::matcher;
use super::platform::Platform;
use super::priority::sort_by_priority;
use super::probe::Prober;
use super::process::ProcessRunner;
use super::resolve::{ResolvedExecutable, resolve_executable, verify_access};
use super::resource::Resource;
use super::settings::EngineSettings;
use super::types::{Availability, Engine, ExecutableRole};

struct RegistryState {
    engines: Vec<Engine>,
    probes: ProbeCache,
    settings: Arc<dyn EngineSettings>,
}

pub struct EngineRegistry {
    state: RwLock<RegistryState>,
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
}

impl EngineRegistry {
    pub fn new(
        settings: Arc<dyn EngineSettings>,
        platform: Platform,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                engines: Vec::new(),
                probes: ProbeCache::default(),
                settings,
            }),
            platform,
            runner,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Add an engine, verify each of its executable roles and re-sort.
    ///
    /// An engine whose identifier is already registered is skipped. Any
    /// verification failure ends up in the engine's availability records;
    /// only an interrupted probe is reported as an error, in which case the
    /// engine stays registered, unavailable, with its current role set to the
    /// interrupted one.
    pub fn register(&self, mut engine: Engine) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let settings = state.settings.clone();

        if state.engines.iter().any(|e| e.id() == engine.id()) {
            info!(
                "Transcoding engine {} already exists, skipping registration...",
                engine
            );
            return Ok(());
        }

        info!("Checking transcoding engine: {}", engine);
        let name = engine.name().to_string();
        engine.reset_availability();
        engine.set_enabled(settings.is_engine_enabled(engine.id()));

        let RegistryState { engines, probes, .. } = &mut *state;
        let outcome = self.verify(&mut engine, probes);
        engine.select_current_role(settings.executable_role(engine.id()));
        if outcome.is_err() {
            let interrupted = engine
                .roles()
                .find(|role| *engine.availability(*role) == Availability::Unknown);
            if let Some(role) = interrupted {
                engine.set_current_role(role);
            }
        }

        match (&outcome, engine.is_available()) {
            (Err(_), _) => warn!("Registration of transcoding engine \"{}\" was interrupted", name),
            (Ok(()), true) => info!("Transcoding engine \"{}\" is available", name),
            (Ok(()), false) => warn!("Transcoding engine \"{}\" is not available", name),
        }

        engines.push(engine);
        sort_by_priority(engines, settings.as_ref());

        outcome.map_err(|Interrupted| RegistryError::Interrupted { engine: name })
    }

    /// Resolve, check and probe every role of `engine`
    fn verify(&self, engine: &mut Engine, probes: &mut ProbeCache) -> Result<(), Interrupted> {
        let prober = Prober::new(self.runner.as_ref(), &self.platform);
        let roles: Vec<ExecutableRole> = engine.roles().collect();

        for role in roles {
            let resolved = match resolve_executable(engine, role, &self.platform) {
                Ok(resolved) => resolved,
                Err(reason) => {
                    engine.set_unavailable(role, reason);
                    continue;
                }
            };

            if let ResolvedExecutable::Absolute(path) = &resolved {
                if let Err(reason) = verify_access(engine, role, path) {
                    engine.set_unavailable(role, reason);
                    continue;
                }
            }

            let executable = resolved.path().to_path_buf();
            engine.set_resolved(role, executable.clone());

            if self.platform.is_windows()
                && engine.requires_avisynth()
                && !self.platform.avisynth_installed
            {
                debug!(
                    "Transcoding engine {} ({}) is unavailable since AviSynth couldn't be found",
                    engine, role
                );
                let reason = Unavailability::AviSynthNotFound {
                    engine: engine.name().to_string(),
                };
                engine.set_unavailable(role, reason);
                continue;
            }

            match prober.probe(probes, engine, role, &executable)? {
                Some(verdict) => engine.apply_verdict(role, verdict),
                // No probe for this family: absence of a failure means available
                None => engine.set_available(role, None),
            }
        }

        Ok(())
    }

    /// Re-sort the engine list by the current priority table
    pub fn sort(&self) {
        let mut state = self.state.write();
        let RegistryState { engines, settings, .. } = &mut *state;
        sort_by_priority(engines, settings.as_ref());
    }

    /// Swap the configuration provider and re-sort
    pub fn update_settings(&self, settings: Arc<dyn EngineSettings>) {
        let mut state = self.state.write();
        let RegistryState { engines, settings: current, .. } = &mut *state;
        *current = settings;
        sort_by_priority(engines, current.as_ref());
    }

    /// Copy of every registered engine, whatever its state
    pub fn all_engines(&self) -> Vec<Engine> {
        self.state.read().engines.clone()
    }

    /// Engines passing the given filters, in priority order
    pub fn engines(&self, only_enabled: bool, only_available: bool) -> Vec<Engine> {
        self.state
            .read()
            .engines
            .iter()
            .filter(|e| (!only_enabled || e.is_enabled()) && (!only_available || e.is_available()))
            .cloned()
            .collect()
    }

    /// Enabled and available engines in priority order
    pub fn active_engines(&self) -> Vec<Engine> {
        self.engines(true, true)
    }

    pub fn len(&self) -> usize {
        self.state.read().engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().engines.is_empty()
    }

    /// Whether the engine exists and is both enabled and available.
    ///
    /// A blank identifier is a caller bug and is rejected.
    pub fn is_active(&self, id: &str) -> Result<bool, RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::BlankEngineId);
        }

        let state = self.state.read();
        Ok(state
            .engines
            .iter()
            .find(|e| e.id().matches(id))
            .is_some_and(Engine::is_active))
    }

    pub fn lookup(&self, id: &str) -> Option<Engine> {
        let state = self.state.read();
        state.engines.iter().find(|e| e.id().matches(id)).cloned()
    }

    /// Executable of the engine's current role
    pub fn executable_for(&self, id: &str) -> Option<PathBuf> {
        let state = self.state.read();
        state
            .engines
            .iter()
            .find(|e| e.id().matches(id))
            .and_then(|e| e.executable().map(PathBuf::from))
    }

    /// Highest-priority enabled, available engine compatible with `resource`
    pub fn engine_for(&self, resource: &dyn Resource) -> Option<Engine> {
        let state = self.state.read();
        matcher::first_compatible(&state.engines, resource).cloned()
    }

    /// All enabled, available engines compatible with `resource`
    pub fn engines_for(&self, resource: &dyn Resource) -> Vec<Engine> {
        let state = self.state.read();
        matcher::all_compatible(&state.engines, resource)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RegistryError> {
        self.with_engine_mut(id, |engine| engine.set_enabled(enabled))
    }

    /// Switch the engine to another of its declared roles
    pub fn select_role(&self, id: &str, role: ExecutableRole) -> Result<(), RegistryError> {
        self.with_engine_mut(id, |engine| {
            if engine.roles().any(|r| r == role) {
                engine.set_current_role(role);
            } else {
                warn!("Transcoding engine {} has no {} executable", engine, role);
            }
        })
    }

    fn with_engine_mut(
        &self,
        id: &str,
        f: impl FnOnce(&mut Engine),
    ) -> Result<(), RegistryError> {
        if id.trim().is_empty() {
            return Err(RegistryError::BlankEngineId);
        }

        let mut state = self.state.write();
        let engine = state
            .engines
            .iter_mut()
            .find(|e| e.id().matches(id))
            .ok_or_else(|| RegistryError::UnknownEngine(id.to_string()))?;
        f(engine);
        Ok(())
    }

    /// Snapshot of the probe cache
    pub fn probe_records(&self) -> Vec<ProbeRecord> {
        self.state.read().probes.records()
    }
}
