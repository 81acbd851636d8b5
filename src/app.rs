use crate::cli::{Cli, Commands};
use anyhow::Result;
use engine_registry::config::Config;
use engine_registry::engine::{
    self, Engine, EngineRegistry, ExecutableRole, MediaResource, Platform, ProbeRecord,
    SystemRunner,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

pub fn run(cli: Cli) {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::List { all, json } => handle_list(config_path, all, json),
        Commands::Check { id } => handle_check(config_path, &id),
        Commands::Match { resource, all } => handle_match(config_path, &resource, all),
        Commands::Cache => handle_cache(config_path),
        Commands::InitConfig => handle_init_config(config_path),
    }
}

/// Engine summary used for listings
#[derive(Serialize)]
struct EngineView {
    id: String,
    name: String,
    family: engine::EngineFamily,
    purpose: engine::EnginePurpose,
    enabled: bool,
    available: bool,
    role: ExecutableRole,
    executable: Option<PathBuf>,
    version: Option<String>,
    reason: Option<String>,
}

impl From<&Engine> for EngineView {
    fn from(engine: &Engine) -> Self {
        Self {
            id: engine.id().to_string(),
            name: engine.name().to_string(),
            family: engine.family(),
            purpose: engine.purpose(),
            enabled: engine.is_enabled(),
            available: engine.is_available(),
            role: engine.current_role(),
            executable: engine.executable().map(Path::to_path_buf),
            version: engine.version().map(str::to_string),
            reason: engine
                .availability(engine.current_role())
                .reason()
                .map(|r| r.to_string()),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn build_registry(config: &Config) -> Result<EngineRegistry> {
    let runner = SystemRunner::new(config.probe_timeout());
    let registry = EngineRegistry::new(
        Arc::new(config.clone()),
        Platform::current(),
        Arc::new(runner),
    );
    engine::register_builtin(&registry, &config.executables)?;
    Ok(registry)
}

fn load_registry(config_path: Option<&Path>) -> EngineRegistry {
    let result = load_config(config_path).and_then(|config| build_registry(&config));
    match result {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn status(engine: &Engine) -> &'static str {
    match (engine.is_enabled(), engine.is_available()) {
        (true, true) => "active",
        (false, true) => "disabled",
        (_, false) => "unavailable",
    }
}

fn print_engine_line(rank: usize, engine: &Engine) {
    println!(
        "{:>3}. {:<20} {:<24} {:<12} {}",
        rank,
        engine.id(),
        engine.name(),
        status(engine),
        engine.version().unwrap_or("-")
    );
}

fn handle_list(config_path: Option<&Path>, all: bool, json: bool) {
    let registry = load_registry(config_path);
    let engines = if all {
        registry.all_engines()
    } else {
        registry.active_engines()
    };

    if json {
        let views: Vec<EngineView> = engines.iter().map(EngineView::from).collect();
        match serde_json::to_string_pretty(&views) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if engines.is_empty() {
        println!("No transcoding engines available");
        return;
    }

    for (i, engine) in engines.iter().enumerate() {
        print_engine_line(i + 1, engine);
    }
}

fn handle_check(config_path: Option<&Path>, id: &str) {
    let registry = load_registry(config_path);
    let Some(engine) = registry.lookup(id) else {
        eprintln!("Unknown transcoding engine: {}", id);
        process::exit(1);
    };

    println!("{} ({})", engine.name(), engine.id());
    println!("   Family:  {}", engine.family());
    println!("   Enabled: {}", if engine.is_enabled() { "yes" } else { "no" });
    println!("   Current executable: {}", engine.current_role());

    for role in engine.roles() {
        let availability = engine.availability(role);
        println!();
        println!("   [{}] {}", role, availability.label());
        match engine.configured_path(role) {
            Some(path) => println!("      Configured: {}", path.display()),
            None => println!("      Configured: -"),
        }
        if let Some(path) = engine.resolved_path(role) {
            println!("      Resolved:   {}", path.display());
        }
        if let Some(version) = availability.version() {
            println!("      Version:    {}", version);
        }
        if let Some(reason) = availability.reason() {
            println!("      Reason:     {}", reason);
        }
    }

    if !engine.is_active() {
        process::exit(1);
    }
}

fn handle_match(config_path: Option<&Path>, location: &str, all: bool) {
    let registry = load_registry(config_path);
    let resource = MediaResource::new(location);

    match resource.purpose() {
        Some(purpose) => println!("Resource: {} ({:?})", resource.location(), purpose),
        None => println!("Resource: {} (unrecognised media)", resource.location()),
    }

    let engines = if all {
        registry.engines_for(&resource)
    } else {
        registry.engine_for(&resource).into_iter().collect()
    };

    if engines.is_empty() {
        println!("No engine can handle this resource");
        process::exit(1);
    }

    for (i, engine) in engines.iter().enumerate() {
        print_engine_line(i + 1, engine);
    }
}

fn print_record(record: &ProbeRecord) {
    println!(
        "{}  {:<4} {}",
        record.probed_at.format("%Y-%m-%d %H:%M:%S"),
        if record.pass() { "ok" } else { "fail" },
        record.executable.display()
    );
    if let Some(diagnostic) = record.diagnostic() {
        for line in diagnostic.lines() {
            println!("                          {}", line.trim_end());
        }
    }
}

fn handle_cache(config_path: Option<&Path>) {
    let registry = load_registry(config_path);
    let records = registry.probe_records();

    if records.is_empty() {
        println!("No executables were probed");
        return;
    }

    for record in &records {
        print_record(record);
    }
}

fn handle_init_config(config_path: Option<&Path>) {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => match Config::config_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        },
    };

    match Config::load_from(&path) {
        Ok(cfg) => {
            println!("Config loaded successfully from {}", path.display());
            println!("{:#?}", cfg);
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            match Config::reset_to_default(&path) {
                Ok(Some(backup)) => println!("Previous config kept as {}", backup.display()),
                Ok(None) => {}
                Err(err) => {
                    eprintln!("Failed to save default config: {:#}", err);
                    process::exit(1);
                }
            }
            println!("Default config saved to {}", path.display());
        }
    }
}
