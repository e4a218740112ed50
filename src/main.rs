#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use rdgmerge::{
    app_config::AppConfig,
    cli::{Cli, Commands, ImportArgs, InspectArgs},
    import::{run_import, ImportOptions, DEFAULT_DESTINATION_FILE},
    logging::TracingSink,
    selection::PathSelection,
    source::load_source,
};
use std::path::PathBuf;
use tracing::{debug, error, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.debug, cli.trace);

    let app_config = load_and_log_config()?;

    match cli.command {
        Commands::Import(args) => run_import_command(args, app_config.as_ref()),
        Commands::Inspect(args) => run_inspect(&args),
    }
}

/// Initialize tracing with the specified debug/trace flags
fn initialize_tracing(debug: bool, trace: bool) {
    let log_level = if trace {
        Level::TRACE
    } else if debug {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy())
        .init();
}

/// Load application configuration and log its status
fn load_and_log_config() -> Result<Option<AppConfig>> {
    let app_config = AppConfig::load().context("Failed to load app configuration")?;

    if app_config.is_some() {
        debug!("Loaded app configuration from: {}", AppConfig::config_path()?.display());
    } else {
        debug!("No app configuration file found at: {}", AppConfig::config_path()?.display());
    }

    Ok(app_config)
}

/// Command-line flags win over the config file, which wins over built-in defaults.
fn build_import_options(args: &ImportArgs, app_config: Option<&AppConfig>) -> ImportOptions {
    let destination_file = args
        .destination_file
        .clone()
        .or_else(|| app_config.and_then(AppConfig::destination_file).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DESTINATION_FILE.to_string());

    let matching = args
        .collision_match
        .or_else(|| app_config.and_then(AppConfig::collision_match))
        .unwrap_or_default();

    ImportOptions { destination_file, matching, dry_run: args.dry_run }
}

fn resolve_destination_dir(args: &ImportArgs, app_config: Option<&AppConfig>) -> Result<PathBuf> {
    if let Some(dir) = args.destination_dir.clone() {
        return Ok(dir);
    }
    if let Some(dir) = app_config.and_then(AppConfig::destination_dir) {
        return Ok(dir.clone());
    }
    std::env::current_dir().context("Failed to get current directory")
}

fn run_import_command(args: ImportArgs, app_config: Option<&AppConfig>) -> Result<()> {
    let options = build_import_options(&args, app_config);
    let destination_dir = resolve_destination_dir(&args, app_config)?;
    debug!("Destination: {}", destination_dir.join(&options.destination_file).display());

    let mut selection = PathSelection::new(args.sources, destination_dir);
    let mut sink = TracingSink;

    match run_import(&mut selection, &options, &mut sink) {
        Ok(summary) => {
            if let Some(preview) = summary.preview {
                print!("{preview}");
                return Ok(());
            }

            println!(
                "Imported {} group(s) into {}",
                summary.imported.len(),
                summary.destination.display()
            );
            for name in &summary.imported {
                println!("  - {name}");
            }
            if !summary.collisions.is_empty() {
                println!("Skipped (name already present): {}", summary.collisions.join(", "));
            }
            if !summary.rejected.is_empty() {
                println!("Skipped (invalid): {} file(s)", summary.rejected.len());
            }
            if let Some(backup) = summary.backup {
                println!("Backup: {}", backup.display());
            }
            Ok(())
        },
        Err(e) => {
            debug!("Import failed: {e:?}");
            std::process::exit(1);
        },
    }
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    match load_source(&args.source) {
        Ok(tree) => {
            print!("{tree}");
            let (groups, hosts) = tree.root_group.counts();
            println!("{groups} group(s), {hosts} host(s)");
            Ok(())
        },
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        },
    }
}
