//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Shared command-line overrides.
///
/// CLI values override settings loaded from `config.ron`. Binaries embed
/// this with `#[command(flatten)]`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Tile server endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Resolution tier of the initial load (lower = sharper).
    #[arg(long)]
    pub initial_tier: Option<u8>,

    /// Maximum simultaneous tile requests (0 = unlimited).
    #[arg(long)]
    pub max_concurrent_fetches: Option<usize>,

    /// Merge the top and bottom caps into the mesh.
    #[arg(long)]
    pub polar_faces: bool,

    /// Keep the initial resolution instead of upgrading visible faces.
    #[arg(long)]
    pub no_dynamic_loading: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref endpoint) = args.endpoint {
            self.viewer.endpoint = endpoint.clone();
        }
        if let Some(tier) = args.initial_tier {
            self.tiles.initial_tier = tier;
        }
        if let Some(max) = args.max_concurrent_fetches {
            self.tiles.max_concurrent_fetches = max;
        }
        if args.polar_faces {
            self.mesh.polar_faces_enabled = true;
        }
        if args.no_dynamic_loading {
            self.refresh.dynamic_loading = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
