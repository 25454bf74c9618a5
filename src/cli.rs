use std::path::PathBuf;
use structopt::StructOpt;

/// Transparent UDP relay for NetFlow v9 / IPFIX flow-export telemetry.
#[derive(Debug, StructOpt)]
#[structopt(name = "flowrelay")]
pub struct Opts {
    /// Path to the YAML configuration file
    #[structopt(short = "-c", long = "--config", parse(from_os_str))]
    pub config: PathBuf,

    /// Log level to use (DEBUG, INFO, WARNING, ERROR); overrides
    /// `general.log_level` from the config file when given
    #[structopt(long = "--log")]
    pub log_level: Option<log::LevelFilter>,

    /// Override the UDP ingress port from the config file
    #[structopt(short = "-l", long = "--listen-port")]
    pub listen_port: Option<u16>,

    /// Override the TCP stats port from the config file
    #[structopt(short = "-s", long = "--stats-port")]
    pub stats_port: Option<u16>,
}
