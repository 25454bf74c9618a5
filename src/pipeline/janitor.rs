use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::protocol::template_cache::TemplateCache;

/// Sweeps the template cache for idle exporters every 60 seconds (§4.2,
/// §5). A dedicated thread rather than folding the sweep into ingress or a
/// worker keeps the sweep's lock acquisition (it visits every shard) off
/// the hot path entirely.
pub fn run(cache: Arc<TemplateCache>, idle_timeout: Duration, shutdown: Arc<AtomicBool>) {
    const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
    const POLL_INTERVAL: Duration = Duration::from_millis(500);

    let mut elapsed = Duration::ZERO;
    while !shutdown.load(Ordering::Acquire) {
        std::thread::sleep(POLL_INTERVAL);
        elapsed += POLL_INTERVAL;
        if elapsed >= SWEEP_INTERVAL {
            elapsed = Duration::ZERO;
            let evicted = cache.sweep(idle_timeout);
            if evicted > 0 {
                info!("janitor: evicted {} idle template(s)", evicted);
            }
        }
    }
}
