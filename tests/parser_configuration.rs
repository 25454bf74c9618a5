use std::io::Write;

use flowrelay::config::{self, parse_yaml_file, parse_yaml_str};

#[test]
fn defaults_apply_when_a_section_is_missing_entirely() {
    let config = parse_yaml_str("forwarding:\n  collectors:\n    - host: \"10.0.0.1\"\n").unwrap();
    assert_eq!(config.general.listen_port, 2055);
    assert_eq!(config.general.output_port, 2056);
    assert_eq!(config.general.stats_port, 9999);
    assert_eq!(config.general.buffer_size, 65535);
    assert_eq!(config.enrichment.as_extraction, true);
    assert_eq!(config.enrichment.enrich_in_place, false);
    assert_eq!(config.performance.workers, 4);
    assert_eq!(config.performance.queue_size, 10_000);
    assert_eq!(config.performance.template_idle_timeout_secs, 1800);
}

#[test]
fn an_explicit_value_overrides_its_default() {
    let config = parse_yaml_str(
        "general:\n  listen_port: 3000\nforwarding:\n  collectors:\n    - host: \"10.0.0.1\"\n",
    )
    .unwrap();
    assert_eq!(config.general.listen_port, 3000);
    assert_eq!(config.general.output_port, 2056);
}

#[test]
fn a_config_file_on_disk_parses_and_validates() {
    let path = write_temp_config(
        "general:\n  listen_port: 2055\n  output_port: 2056\nforwarding:\n  collectors:\n    - host: \"10.0.0.1\"\n      port: 2056\nperformance:\n  workers: 2\n",
    );
    let config = parse_yaml_file(&path).unwrap();
    assert!(config::validate_config(&config).is_ok());
    assert_eq!(config.forwarding.collectors.len(), 1);
    assert_eq!(config.performance.workers, 2);
    let _ = std::fs::remove_file(&path);
}

/// Multiple collectors, each with its own optional port override, parse
/// into distinct entries.
#[test]
fn multiple_collectors_with_independent_ports_parse_correctly() {
    let config = parse_yaml_str(
        "forwarding:\n  collectors:\n    - host: \"10.0.0.1\"\n      port: 9001\n    - host: \"10.0.0.2\"\n",
    )
    .unwrap();
    assert_eq!(config.forwarding.collectors.len(), 2);
    assert_eq!(config.forwarding.collectors[0].port, Some(9001));
    assert_eq!(config.forwarding.collectors[1].port, None);
}

/// A minimal temp-file helper so this test doesn't need the `tempfile`
/// crate just to exercise `parse_yaml_file`'s disk-reading path. Unique per
/// test invocation (pid + a monotonically increasing counter) so parallel
/// test threads never collide on the same path.
fn write_temp_config(contents: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut path = std::env::temp_dir();
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!(
        "flowrelay-test-config-{}-{}.yaml",
        std::process::id(),
        unique
    ));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}
