use std::net::SocketAddr;
use std::time::Instant;

/// One received or outbound UDP datagram. Owned bytes rather than a pooled
/// buffer: at this relay's scale the bound on memory growth comes from the
/// bounded channels (`performance.queue_size × MTU`), not from buffer reuse.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub exporter: SocketAddr,
    pub received_at: Instant,
}

impl Datagram {
    pub fn new(bytes: Vec<u8>, exporter: SocketAddr, received_at: Instant) -> Self {
        Datagram {
            bytes,
            exporter,
            received_at,
        }
    }
}
