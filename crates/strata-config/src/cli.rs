//! Command-line overrides for [`Config`].

use std::path::PathBuf;

use clap::Args;
use strata_properties::UnknownKeyPolicy;

use crate::Config;

/// Global flags shared by every strata command.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of `<category>.toml` files replacing the bundled data.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Reject unknown property keys instead of storing them under `custom`.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log filter (error, warn, info, debug, trace, or a full directive).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write a JSON log file into this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.data_dir {
            self.library.data_dir = Some(dir.clone());
        }
        if args.strict {
            self.build.unknown_keys = UnknownKeyPolicy::Reject;
        }
        if let Some(ref level) = args.log_level {
            self.logging.log_level = level.clone();
        }
        if let Some(ref dir) = args.log_dir {
            self.logging.log_dir = Some(dir.clone());
        }
    }
}
