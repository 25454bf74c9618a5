mod parser;
mod schema;
mod validator;

pub use parser::{parse_yaml_file, parse_yaml_str};
pub use schema::{Collector, Config, Enrichment, Forwarding, General, Performance};
pub use validator::validate_config;

use crate::cli::Opts;
use crate::error::Result;

/// Loads the config file and applies CLI overrides, validating the result.
pub fn load(opts: &Opts) -> Result<Config> {
    let mut config = parser::parse_yaml_file(&opts.config)?;
    if let Some(port) = opts.listen_port {
        config.general.listen_port = port;
    }
    if let Some(port) = opts.stats_port {
        config.general.stats_port = port;
    }
    if let Some(level) = opts.log_level {
        config.general.log_level = level.to_string();
    }
    validator::validate_config(&config)?;
    Ok(config)
}

/// Determines the log level to install the logger with, before the config
/// file has been fully parsed and validated -- so that even a startup
/// failure reading or validating the config file is logged at a sane
/// level. The CLI flag shadows the file's `general.log_level` the same way
/// it does once the config is loaded; on any failure to read or parse the
/// file here, `load` above will surface the real error once the logger is
/// up, so this falls back to `INFO` rather than failing twice.
pub fn peek_log_level(opts: &Opts) -> log::LevelFilter {
    if let Some(level) = opts.log_level {
        return level;
    }
    parser::parse_yaml_file(&opts.config)
        .ok()
        .and_then(|config| parse_log_level(&config.general.log_level))
        .unwrap_or(log::LevelFilter::Info)
}

fn parse_log_level(raw: &str) -> Option<log::LevelFilter> {
    let normalized = if raw.eq_ignore_ascii_case("WARNING") {
        "WARN"
    } else {
        raw
    };
    normalized.parse().ok()
}
