use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Process-wide atomic counters (§4.6/§7). Write-mostly from the pipeline
/// threads, read-mostly from the stats server; `Ordering::Relaxed` is
/// sufficient everywhere since these are independent tallies, not used to
/// synchronize access to anything else.
#[derive(Default)]
pub struct Counters {
    pub pkts_in: AtomicU64,
    pub bytes_in: AtomicU64,
    pub pkts_out: AtomicU64,
    pub bytes_out: AtomicU64,
    pub pkts_dropped_queue: AtomicU64,
    pub pkts_dropped_decode: AtomicU64,
    pub pkts_dropped_orphan_template: AtomicU64,
    pub pkts_dropped_forward: AtomicU64,
    pub templates_seen: AtomicU64,
    pub records_decoded: AtomicU64,
    pub records_with_as: AtomicU64,
}

/// `templates_current` (§3) is a live gauge on the template cache, not an
/// accumulating tally any pipeline thread writes to, so it has no field on
/// `Counters` itself -- callers fill it into the snapshot from
/// `TemplateCache::len()` after taking one.

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            pkts_in: self.pkts_in.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            pkts_out: self.pkts_out.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            pkts_dropped_queue: self.pkts_dropped_queue.load(Ordering::Relaxed),
            pkts_dropped_decode: self.pkts_dropped_decode.load(Ordering::Relaxed),
            pkts_dropped_orphan_template: self
                .pkts_dropped_orphan_template
                .load(Ordering::Relaxed),
            pkts_dropped_forward: self.pkts_dropped_forward.load(Ordering::Relaxed),
            templates_seen: self.templates_seen.load(Ordering::Relaxed),
            templates_current: 0,
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            records_with_as: self.records_with_as.load(Ordering::Relaxed),
        }
    }

    pub fn add_ingress(&self, bytes: usize) {
        self.pkts_in.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn add_egress(&self, bytes: usize) {
        self.pkts_out.fetch_add(1, Ordering::Relaxed);
        self.bytes_out.fetch_add(bytes as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountersSnapshot {
    pub pkts_in: u64,
    pub bytes_in: u64,
    pub pkts_out: u64,
    pub bytes_out: u64,
    pub pkts_dropped_queue: u64,
    pub pkts_dropped_decode: u64,
    pub pkts_dropped_orphan_template: u64,
    pub pkts_dropped_forward: u64,
    pub templates_seen: u64,
    pub templates_current: u64,
    pub records_decoded: u64,
    pub records_with_as: u64,
}

impl CountersSnapshot {
    pub fn total_dropped(&self) -> u64 {
        self.pkts_dropped_queue
            + self.pkts_dropped_decode
            + self.pkts_dropped_orphan_template
            + self.pkts_dropped_forward
    }
}

/// Tracks an exponentially-weighted moving average of `pkts_in` over the
/// configured `stats_interval` window, sampled by the stats server on
/// demand rather than on a background timer.
pub struct RateTracker {
    started: Instant,
    last_sample: std::sync::Mutex<(Instant, u64, f64)>,
    window_secs: f64,
}

impl RateTracker {
    pub fn new(window_secs: u64) -> Self {
        RateTracker {
            started: Instant::now(),
            last_sample: std::sync::Mutex::new((Instant::now(), 0, 0.0)),
            window_secs: window_secs.max(1) as f64,
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Feeds the current `pkts_in` total and returns the updated EWMA rate
    /// in packets/second.
    pub fn sample(&self, pkts_in_total: u64) -> f64 {
        let mut guard = self.last_sample.lock().unwrap();
        let (last_time, last_total, last_rate) = *guard;
        let elapsed = last_time.elapsed().as_secs_f64().max(1e-3);
        let delta = pkts_in_total.saturating_sub(last_total) as f64;
        let instantaneous = delta / elapsed;
        let alpha = (1.0 - (-elapsed / self.window_secs).exp()).clamp(0.0, 1.0);
        let rate = last_rate + alpha * (instantaneous - last_rate);
        *guard = (Instant::now(), pkts_in_total, rate);
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_reflects_ingress_and_egress() {
        let counters = Counters::new();
        counters.add_ingress(100);
        counters.add_ingress(200);
        counters.add_egress(150);
        let snap = counters.snapshot();
        assert_eq!(snap.pkts_in, 2);
        assert_eq!(snap.bytes_in, 300);
        assert_eq!(snap.pkts_out, 1);
        assert_eq!(snap.bytes_out, 150);
    }

    #[test]
    fn total_dropped_sums_all_drop_reasons() {
        let counters = Counters::new();
        counters.pkts_dropped_queue.fetch_add(1, Ordering::Relaxed);
        counters.pkts_dropped_decode.fetch_add(2, Ordering::Relaxed);
        let snap = counters.snapshot();
        assert_eq!(snap.total_dropped(), 3);
    }
}
