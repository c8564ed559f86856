//! Structured logging for the Look Around panorama core.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds for post-mortem analysis of tile traffic.
//! Runtime log level comes from `RUST_LOG` or the config's `debug.log_level`.

use std::fs::File;
use std::path::Path;

use lookaround_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config specify one.
///
/// The HTTP stack is very chatty at `info`, so it is held at `warn`.
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper_util=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "lookaround.log";

/// Install the global subscriber: a console layer always, plus a JSON file
/// layer under `log_dir` when `debug_build` is set and the file can be opened.
///
/// `RUST_LOG` takes precedence over `debug.log_level`.
///
/// ```no_run
/// let config = lookaround_config::Config::default();
/// lookaround_log::init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_string(config)));

    // Single event loop, so thread ids carry no information.
    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_timer(fmt::time::uptime());

    let json_file = log_dir
        .filter(|_| debug_build)
        .and_then(open_log_file)
        .map(|file| {
            fmt::layer()
                .json()
                .with_writer(file)
                .with_ansi(false)
                .with_timer(fmt::time::uptime())
        });

    // An `Option` layer is a no-op when `None`.
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json_file)
        .init();
}

/// Truncate and open `log_dir/lookaround.log`, creating the directory.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Resolve the filter string from the config, falling back to [`DEFAULT_FILTER`].
///
/// A bare level such as `"debug"` keeps the HTTP stack quiet.
pub fn filter_string(config: Option<&Config>) -> String {
    match config.map(|c| c.debug.log_level.trim()) {
        Some(level) if !level.is_empty() && !level.contains('=') => {
            format!("{level},reqwest=warn,hyper_util=warn")
        }
        Some(level) if !level.is_empty() => level.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_http() {
        let filter = default_env_filter().to_string();
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("hyper_util=warn"));
    }

    #[test]
    fn test_filter_without_config() {
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_bare_level_keeps_http_quiet() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        let filter = filter_string(Some(&config));
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("hyper_util=warn"));
    }

    #[test]
    fn test_directive_list_passed_through() {
        let mut config = Config::default();
        config.debug.log_level = "warn,lookaround_adapter=trace".to_string();
        assert_eq!(filter_string(Some(&config)), "warn,lookaround_adapter=trace");
    }

    #[test]
    fn test_empty_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_resolved_filters_parse() {
        for level in ["trace", "warn,lookaround_tiles=trace", "lookaround_adapter=debug"] {
            let mut config = Config::default();
            config.debug.log_level = level.to_string();
            let filter = filter_string(Some(&config));
            assert!(EnvFilter::try_new(&filter).is_ok(), "bad filter {filter}");
        }
    }

    #[test]
    fn test_log_file_created_in_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("logs");
        assert!(open_log_file(&nested).is_some());
        assert!(nested.join(LOG_FILE_NAME).exists());
    }
}
