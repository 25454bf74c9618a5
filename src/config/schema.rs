use serde::{Deserialize, Serialize};

/// Root configuration document, parsed from the YAML file named on the
/// command line (see `config::parser::parse_yaml_file`).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: General,

    #[serde(default)]
    pub enrichment: Enrichment,

    #[serde(default)]
    pub forwarding: Forwarding,

    #[serde(default)]
    pub performance: Performance,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct General {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    #[serde(default = "default_output_port")]
    pub output_port: u16,

    #[serde(default = "default_stats_port")]
    pub stats_port: u16,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for General {
    fn default() -> Self {
        General {
            listen_port: default_listen_port(),
            output_port: default_output_port(),
            stats_port: default_stats_port(),
            buffer_size: default_buffer_size(),
            log_level: default_log_level(),
        }
    }
}

fn default_listen_port() -> u16 {
    2055
}

fn default_output_port() -> u16 {
    2056
}

fn default_stats_port() -> u16 {
    9999
}

fn default_buffer_size() -> usize {
    65535
}

fn default_log_level() -> String {
    "INFO".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Enrichment {
    #[serde(default = "default_true")]
    pub as_extraction: bool,

    #[serde(default)]
    pub enrich_in_place: bool,

    #[serde(default)]
    pub geoip_enabled: bool,

    #[serde(default)]
    pub reverse_dns: bool,
}

impl Default for Enrichment {
    fn default() -> Self {
        Enrichment {
            as_extraction: true,
            enrich_in_place: false,
            geoip_enabled: false,
            reverse_dns: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Forwarding {
    #[serde(default)]
    pub collectors: Vec<Collector>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Collector {
    pub host: String,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Performance {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,

    #[serde(default = "default_template_idle_timeout")]
    pub template_idle_timeout_secs: u64,
}

impl Default for Performance {
    fn default() -> Self {
        Performance {
            workers: default_workers(),
            queue_size: default_queue_size(),
            stats_interval: default_stats_interval(),
            template_idle_timeout_secs: default_template_idle_timeout(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_queue_size() -> usize {
    10_000
}

fn default_stats_interval() -> u64 {
    60
}

fn default_template_idle_timeout() -> u64 {
    30 * 60
}
