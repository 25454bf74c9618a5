use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::stats::counters::Counters;

use super::datagram::Datagram;
use super::queue::BoundedQueue;

/// Binds the ingress UDP socket and pumps datagrams into the shard queues
/// until `shutdown` is flipped: a bare `loop { socket.recv_from(...) }` plus
/// the bounded drop-on-full behavior the ingress queue requires.
///
/// `shard_queues[i]` receives every datagram whose exporter address hashes
/// to shard `i`, the same hash used by the template cache, so a given
/// exporter's datagrams always land on the same worker.
pub fn run(
    socket: UdpSocket,
    shard_queues: Arc<Vec<Arc<BoundedQueue<Datagram>>>>,
    counters: Arc<Counters>,
    shutdown: Arc<AtomicBool>,
) {
    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .expect("setting a read timeout on the ingress socket should never fail");

    let mut buf = vec![0u8; 65536];

    while !shutdown.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, exporter)) => {
                counters.add_ingress(len);
                let datagram = Datagram::new(buf[..len].to_vec(), exporter, Instant::now());
                let shard = crate::protocol::template_cache::TemplateCache::shard_index_for(
                    exporter.ip(),
                    shard_queues.len(),
                );
                if shard_queues[shard].push(datagram) {
                    counters
                        .pkts_dropped_queue
                        .fetch_add(1, Ordering::Relaxed);
                    debug!("ingress queue {} full, dropping datagram from {}", shard, exporter);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("ingress recv_from failed: {}", e);
            }
        }
    }

    for queue in shard_queues.iter() {
        queue.close();
    }
}
