use std::fs;
use std::path::Path;

use crate::error::Result;

use super::schema::Config;

/// Reads and deserializes a YAML configuration file.
pub fn parse_yaml_file(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)?;
    parse_yaml_str(&raw)
}

pub fn parse_yaml_str(raw: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(raw)?;
    Ok(config)
}
