use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::config::Collector;
use crate::stats::counters::Counters;

use super::datagram::Datagram;
use super::queue::BoundedQueue;

/// Resolves each configured collector once at startup. Re-resolving on
/// every send would turn a DNS hiccup into a hot-path stall; a collector
/// whose name stops resolving simply starts failing sends like an
/// unreachable host would.
pub fn resolve_collectors(
    collectors: &[Collector],
    default_port: u16,
) -> Result<Vec<SocketAddr>, String> {
    let mut resolved = Vec::with_capacity(collectors.len());
    for collector in collectors {
        let port = collector.port.unwrap_or(default_port);
        let addr = (collector.host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| format!("resolving collector {}:{}: {}", collector.host, port, e))?
            .next()
            .ok_or_else(|| format!("no address found for collector {}:{}", collector.host, port))?;
        resolved.push(addr);
    }
    Ok(resolved)
}

/// Takes datagrams off the egress queue and sends each to every configured
/// collector in order. A send failure against one collector is counted and
/// does not stop delivery to the rest -- UDP has no retry semantics worth
/// emulating here.
pub fn run(
    in_queue: Arc<BoundedQueue<Datagram>>,
    collectors: Vec<SocketAddr>,
    counters: Arc<Counters>,
    shutdown: Arc<AtomicBool>,
) {
    let socket = match UdpSocket::bind("0.0.0.0:0") {
        Ok(s) => s,
        Err(e) => {
            warn!("forwarder failed to bind egress socket: {}", e);
            return;
        }
    };

    let mut shutdown_deadline: Option<std::time::Instant> = None;

    loop {
        if shutdown.load(Ordering::Acquire) {
            let deadline = *shutdown_deadline
                .get_or_insert_with(|| std::time::Instant::now() + super::SHUTDOWN_GRACE);
            if std::time::Instant::now() >= deadline {
                let remaining = in_queue.len();
                if remaining > 0 {
                    counters
                        .pkts_dropped_queue
                        .fetch_add(remaining as u64, Ordering::Relaxed);
                }
                break;
            }
        }

        let datagram = match in_queue.pop_timeout(Duration::from_millis(200)) {
            Some(d) => d,
            None => {
                if shutdown.load(Ordering::Acquire) && in_queue.is_empty() {
                    break;
                }
                continue;
            }
        };

        let mut any_sent = false;
        for collector in &collectors {
            match socket.send_to(&datagram.bytes, collector) {
                Ok(_) => any_sent = true,
                Err(e) => {
                    counters
                        .pkts_dropped_forward
                        .fetch_add(1, Ordering::Relaxed);
                    warn!("forward to {} failed: {}", collector, e);
                }
            }
        }
        if any_sent {
            counters.add_egress(datagram.bytes.len());
        }
    }
}
