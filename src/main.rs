//! hotpage - hot-reloading page template registry.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use hotpage::{AppConfig, TemplateRegistry, TemplateWatcher, funcs::Collaborators, log};
use serde_json::Value;
use std::{
    fs,
    io::{Write, stdout},
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let collaborators = Collaborators::from_config(&config.repository);
    let registry = TemplateRegistry::load(config.templates.clone(), collaborators)
        .context("failed to compile templates")?;

    match &cli.command {
        Commands::Check => check(&registry),
        Commands::Render { name, data, output } => {
            render(&registry, name, data.as_deref(), output.as_deref())
        }
        Commands::Watch => watch(registry, &config),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        AppConfig::from_path(&config_path)?
    } else {
        log!("config"; "{} not found, using defaults", config_path.display());
        AppConfig::default()
    };
    if let Some(templates) = &cli.templates {
        config.templates.root = templates.clone();
    }

    config.resolve_paths(root);
    config.validate()?;
    Ok(config)
}

fn check(registry: &TemplateRegistry) -> Result<()> {
    let set = registry.snapshot();
    for name in set.names() {
        log!("compile"; "ok {name}");
    }
    Ok(())
}

fn render(
    registry: &TemplateRegistry,
    name: &str,
    data: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let data: Value = match data {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        }
        None => Value::Object(Default::default()),
    };

    let html = registry.render(name, &data)?;
    match output {
        Some(path) => {
            fs::write(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log!("render"; "{name} -> {}", path.display());
        }
        None => {
            let mut stdout = stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn watch(registry: TemplateRegistry, config: &AppConfig) -> Result<()> {
    if !config.watch.enable {
        bail!("watching is disabled by [watch] enable = false");
    }

    let dirs: Vec<PathBuf> = config.templates.watch_dirs();
    let registry = Arc::new(registry);
    let watcher = TemplateWatcher::start(registry, dirs, config.watch.on_error)?;
    if let Some(errors) = watcher.registration_errors() {
        log!("error"; "{errors}");
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;

    log!("watch"; "press Ctrl-C to stop");
    rx.recv().ok();
    drop(watcher);
    log!("watch"; "stopped");
    Ok(())
}
