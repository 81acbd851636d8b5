// Compatibility matching over a priority-ordered engine list

use tracing::trace;

use super::resource::Resource;
use super::types::Engine;

/// Whether an engine may take part in dispatch at all
fn is_candidate(engine: &Engine) -> bool {
    let (enabled, available) = (engine.is_enabled(), engine.is_available());
    match (enabled, available) {
        (true, true) => true,
        (false, true) => {
            trace!("Engine \"{}\" is disabled", engine.name());
            false
        }
        (true, false) => {
            trace!("Engine \"{}\" isn't available", engine.name());
            false
        }
        (false, false) => {
            trace!("Engine \"{}\" is neither available nor enabled", engine.name());
            false
        }
    }
}

fn accepts(engine: &Engine, resource: &dyn Resource) -> bool {
    if resource.is_compatible(engine) {
        trace!(
            "Engine \"{}\" is compatible with resource \"{}\"",
            engine.name(),
            resource.name()
        );
        true
    } else {
        trace!("Engine \"{}\" is incompatible", engine.name());
        false
    }
}

/// First enabled, available engine that accepts `resource`
pub fn first_compatible<'a>(engines: &'a [Engine], resource: &dyn Resource) -> Option<&'a Engine> {
    trace!("Getting engine for resource \"{}\"", resource.name());

    let found = engines
        .iter()
        .find(|engine| is_candidate(engine) && accepts(engine, resource));

    if found.is_none() {
        trace!("No engine found for {}", resource.name());
    }
    found
}

/// Every enabled, available engine that accepts `resource`, in list order
pub fn all_compatible<'a>(engines: &'a [Engine], resource: &dyn Resource) -> Vec<&'a Engine> {
    engines
        .iter()
        .filter(|engine| is_candidate(engine) && accepts(engine, resource))
        .collect()
}
