use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flowrelay::config::{Config, Enrichment, Forwarding, General, Performance};
use flowrelay::extractor::AsFrequency;
use flowrelay::protocol::template_cache::TemplateCache;
use flowrelay::stats::counters::{Counters, RateTracker};
use flowrelay::stats::errors::ErrorLog;
use flowrelay::stats::server::{self, StatsContext};

fn spawn_test_server(port: u16) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let ctx = Arc::new(StatsContext {
        counters: Arc::new(Counters::new()),
        errors: Arc::new(ErrorLog::new()),
        template_cache: Arc::new(TemplateCache::new(2, 16)),
        frequency: Arc::new(std::sync::Mutex::new(AsFrequency::new())),
        rate: Arc::new(RateTracker::new(10)),
        config: Config {
            general: General::default(),
            enrichment: Enrichment::default(),
            forwarding: Forwarding::default(),
            performance: Performance::default(),
        },
    });
    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = {
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            server::run(port, ctx, shutdown).unwrap();
        })
    };
    // give the listener a moment to bind before the test connects.
    thread::sleep(Duration::from_millis(100));
    (shutdown, handle)
}

fn read_until_blank_line(reader: &mut BufReader<TcpStream>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).unwrap();
        if n == 0 {
            break;
        }
        if line.trim().is_empty() {
            break;
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// S6: the `stats` command returns a multi-line response terminated by a
/// blank line, and `quit` closes the connection.
#[test]
fn stats_command_returns_a_block_ending_in_a_blank_line_then_quit_closes() {
    let (shutdown, handle) = spawn_test_server(19998);

    let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, 19998)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    writer.write_all(b"stats\n").unwrap();
    let lines = read_until_blank_line(&mut reader);
    assert!(lines.iter().any(|l| l.starts_with("pkts_in")));
    assert!(lines.iter().any(|l| l.starts_with("uptime_s")));

    writer.write_all(b"quit\n").unwrap();
    let mut buf = [0u8; 8];
    let n = reader.get_mut().read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "connection should be closed after quit");

    shutdown.store(true, Ordering::SeqCst);
    handle.join().unwrap();
}

/// An unrecognized command gets the documented error line, not a silent
/// disconnect.
#[test]
fn an_unknown_command_gets_an_error_line() {
    let (shutdown, handle) = spawn_test_server(19997);

    let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, 19997)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    writer.write_all(b"bogus\n").unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "ERR unknown command");

    drop(reader);
    shutdown.store(true, Ordering::SeqCst);
    handle.join().unwrap();
}
