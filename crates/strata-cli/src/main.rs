//! `strata`: browse the material library from the command line.
//!
//! Run with: `cargo run -p strata-cli -- show stainless.s316L`

mod commands;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_materials::{Library, Registry};
use tracing::{info, warn};

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Hierarchical material property library")]
struct Cli {
    #[command(flatten)]
    global: CliArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = cli.global.config.clone().or_else(|| default_config_dir().ok());
    let mut config = load_config(config_dir.as_deref());
    config.apply_cli_overrides(&cli.global);

    strata_log::init_logging(&config.logging);
    if let Some(dir) = &config_dir {
        info!(dir = %dir.display(), "using config directory");
    }

    let registry = Registry::global();
    let mut library = Library::new(registry).unknown_keys(config.build.unknown_keys);
    if let Some(dir) = &config.library.data_dir {
        library = library.with_data_dir(dir);
    }
    preload(&library, &config);

    match cli.command.run(&library) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(config_dir: Option<&Path>) -> Config {
    let Some(dir) = config_dir else {
        return Config::default();
    };
    Config::load_or_create(dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    })
}

/// Loads configured categories and extra files; failures are logged, not fatal.
fn preload(library: &Library<'_>, config: &Config) {
    for category in &config.library.preload {
        if let Err(e) = library.ensure_loaded(category) {
            warn!(category = %category, "preload failed: {e}");
        }
    }
    for file in &config.library.extra_files {
        match library.load_file(file) {
            Ok(roots) => info!(file = %file.display(), materials = roots.len(), "loaded extra materials"),
            Err(e) => warn!(file = %file.display(), "failed to load extra materials: {e}"),
        }
    }
}
