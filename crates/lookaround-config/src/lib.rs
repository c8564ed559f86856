//! Configuration for the Look Around panorama core.
//!
//! Settings persist to disk as a RON file, accept CLI overrides via clap,
//! and stay forward/backward compatible: every section falls back to its
//! defaults when missing.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, MeshConfig, RefreshConfig, TileConfig, ViewerConfig, CONFIG_FILE_NAME,
};
pub use error::ConfigError;
