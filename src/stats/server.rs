use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::Config;
use crate::extractor::AsFrequency;
use crate::protocol::template_cache::TemplateCache;

use super::counters::{Counters, RateTracker};
use super::errors::ErrorLog;

const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_LINE_BYTES: usize = 256;

pub struct StatsContext {
    pub counters: Arc<Counters>,
    pub errors: Arc<ErrorLog>,
    pub template_cache: Arc<TemplateCache>,
    pub frequency: Arc<std::sync::Mutex<AsFrequency>>,
    pub rate: Arc<RateTracker>,
    pub config: Config,
}

/// Line-oriented TCP stats server (§4.6), bound to loopback only: a plain
/// `TcpListener` accept loop feeding a small per-line command dispatcher,
/// with a 60s idle timeout per connection.
pub fn run(port: u16, ctx: Arc<StatsContext>, shutdown: Arc<AtomicBool>) -> std::io::Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))?;
    listener.set_nonblocking(true)?;
    info!("stats server listening on 127.0.0.1:{}", port);

    while !shutdown.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let ctx = Arc::clone(&ctx);
                let shutdown = Arc::clone(&shutdown);
                std::thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &ctx, &shutdown) {
                        warn!("stats connection from {} ended with error: {}", peer, e);
                    }
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn handle_connection(
    stream: TcpStream,
    ctx: &StatsContext,
    shutdown: &AtomicBool,
) -> std::io::Result<()> {
    stream.set_read_timeout(Some(IDLE_TIMEOUT))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    loop {
        if shutdown.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut line = String::new();
        let bytes_read = match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if bytes_read > MAX_LINE_BYTES {
            writer.write_all(b"ERR line too long\n")?;
            continue;
        }

        let command = line.trim().to_ascii_lowercase();
        if command.is_empty() {
            continue;
        }

        match command.as_str() {
            "quit" => {
                return Ok(());
            }
            "stats" => write!(writer, "{}", render_stats(ctx))?,
            "as_stats" => write!(writer, "{}", render_as_stats(ctx))?,
            "templates" => write!(writer, "{}", render_templates(ctx))?,
            "errors" => write!(writer, "{}", render_errors(ctx))?,
            "config" => write!(writer, "{}", render_config(ctx))?,
            "help" => write!(writer, "{}", render_help())?,
            _ => writer.write_all(b"ERR unknown command\n")?,
        }
    }
}

fn render_stats(ctx: &StatsContext) -> String {
    let mut snap = ctx.counters.snapshot();
    snap.templates_current = ctx.template_cache.len() as u64;
    let rate = ctx.rate.sample(snap.pkts_in);
    format!(
        "uptime_s {}\npkts_in {}\nbytes_in {}\npkts_out {}\nbytes_out {}\n\
         pkts_dropped_queue {}\npkts_dropped_decode {}\npkts_dropped_orphan_template {}\n\
         pkts_dropped_forward {}\ntemplates_seen {}\ntemplates_current {}\n\
         records_decoded {}\nrecords_with_as {}\nrate_pps {:.2}\n\n",
        ctx.rate.uptime_secs(),
        snap.pkts_in,
        snap.bytes_in,
        snap.pkts_out,
        snap.bytes_out,
        snap.pkts_dropped_queue,
        snap.pkts_dropped_decode,
        snap.pkts_dropped_orphan_template,
        snap.pkts_dropped_forward,
        snap.templates_seen,
        snap.templates_current,
        snap.records_decoded,
        snap.records_with_as,
        rate,
    )
}

fn render_as_stats(ctx: &StatsContext) -> String {
    let freq = ctx.frequency.lock().unwrap();
    let mut out = String::new();
    for (direction, as_number, count) in freq.top(256) {
        out.push_str(&format!("{:?} AS{} {}\n", direction, as_number, count));
    }
    out.push('\n');
    out
}

fn render_templates(ctx: &StatsContext) -> String {
    let mut out = String::new();
    for (key, field_count, age, version) in ctx.template_cache.entries() {
        out.push_str(&format!(
            "{} {} {} fields={} age_s={} version={}\n",
            key.exporter,
            key.domain_id,
            key.template_id,
            field_count,
            age.as_secs(),
            version,
        ));
    }
    out.push('\n');
    out
}

fn render_errors(ctx: &StatsContext) -> String {
    let mut out = String::new();
    for event in ctx.errors.recent() {
        out.push_str(&format!("{} {}\n", event.unix_secs, event.message));
    }
    out.push('\n');
    out
}

fn render_config(ctx: &StatsContext) -> String {
    let c = &ctx.config;
    format!(
        "general.listen_port {}\ngeneral.output_port {}\ngeneral.stats_port {}\n\
         general.buffer_size {}\ngeneral.log_level {}\nenrichment.as_extraction {}\n\
         enrichment.enrich_in_place {}\nenrichment.geoip_enabled {}\nenrichment.reverse_dns {}\n\
         performance.workers {}\nperformance.queue_size {}\nperformance.stats_interval {}\n\
         forwarding.collectors {}\n\n",
        c.general.listen_port,
        c.general.output_port,
        c.general.stats_port,
        c.general.buffer_size,
        c.general.log_level,
        c.enrichment.as_extraction,
        c.enrichment.enrich_in_place,
        c.enrichment.geoip_enabled,
        c.enrichment.reverse_dns,
        c.performance.workers,
        c.performance.queue_size,
        c.performance.stats_interval,
        c.forwarding.collectors.len(),
    )
}

fn render_help() -> String {
    "stats\nas_stats\ntemplates\nerrors\nconfig\nhelp\nquit\n\n".to_string()
}
