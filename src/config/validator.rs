use crate::error::{RelayError, Result};

use super::schema::Config;

/// Checks the config for values that parse fine as YAML but are nonsensical
/// at runtime (no collectors, a worker count of zero, a port collision).
pub fn validate_config(config: &Config) -> Result<()> {
    validate_general(config)?;
    validate_forwarding(config)?;
    validate_performance(config)?;
    Ok(())
}

fn validate_general(config: &Config) -> Result<()> {
    let g = &config.general;
    if g.listen_port == g.output_port {
        return Err(RelayError::Validation(format!(
            "general.listen_port and general.output_port must differ (both {})",
            g.listen_port
        )));
    }
    if g.listen_port == g.stats_port || g.output_port == g.stats_port {
        return Err(RelayError::Validation(format!(
            "general.stats_port ({}) collides with listen_port/output_port",
            g.stats_port
        )));
    }
    if g.buffer_size == 0 {
        return Err(RelayError::Validation(
            "general.buffer_size must be greater than zero".to_string(),
        ));
    }
    if !["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR"]
        .contains(&g.log_level.to_uppercase().as_str())
    {
        return Err(RelayError::Validation(format!(
            "general.log_level {:?} is not a recognized level",
            g.log_level
        )));
    }
    Ok(())
}

fn validate_forwarding(config: &Config) -> Result<()> {
    if config.forwarding.collectors.is_empty() {
        return Err(RelayError::Validation(
            "forwarding.collectors must name at least one collector".to_string(),
        ));
    }
    for collector in &config.forwarding.collectors {
        if collector.host.trim().is_empty() {
            return Err(RelayError::Validation(
                "forwarding.collectors entries must set a non-empty host".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_performance(config: &Config) -> Result<()> {
    let p = &config.performance;
    if p.workers == 0 {
        return Err(RelayError::Validation(
            "performance.workers must be at least 1".to_string(),
        ));
    }
    if p.queue_size == 0 {
        return Err(RelayError::Validation(
            "performance.queue_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_yaml_str;

    fn valid_yaml() -> &'static str {
        r#"
general:
  listen_port: 2055
  output_port: 2056
  stats_port: 9999
forwarding:
  collectors:
    - host: "10.0.0.1"
      port: 2055
performance:
  workers: 4
"#
    }

    #[test]
    fn accepts_a_well_formed_config() {
        let config = parse_yaml_str(valid_yaml()).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_empty_collectors() {
        let config = parse_yaml_str("forwarding:\n  collectors: []\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_port_collisions() {
        let config = parse_yaml_str(
            "general:\n  listen_port: 2055\n  output_port: 2055\nforwarding:\n  collectors:\n    - host: \"10.0.0.1\"\n",
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_workers() {
        let config = parse_yaml_str(
            "forwarding:\n  collectors:\n    - host: \"10.0.0.1\"\nperformance:\n  workers: 0\n",
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }
}
