use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::Enrichment;
use crate::extractor::{self, ASLookup, AsFrequency, Direction};
use crate::protocol::template_cache::TemplateCache;
use crate::stats::counters::Counters;
use crate::stats::errors::ErrorLog;

use super::datagram::Datagram;
use super::queue::BoundedQueue;

const ORPHAN_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Decodes, extracts, and (optionally) enriches every datagram on this
/// worker's shard queue, then forwards it to the egress queue. One worker
/// owns exactly the exporters that hash to its shard (§5 ordering
/// guarantee), so the per-exporter orphan-template rate limiter below needs
/// no locking -- this thread is the only writer.
#[allow(clippy::too_many_arguments)]
pub fn run(
    shard_index: usize,
    in_queue: Arc<BoundedQueue<Datagram>>,
    out_queue: Arc<BoundedQueue<Datagram>>,
    template_cache: Arc<TemplateCache>,
    counters: Arc<Counters>,
    errors: Arc<ErrorLog>,
    lookup: Arc<dyn ASLookup>,
    frequency: Arc<std::sync::Mutex<AsFrequency>>,
    enrichment: Enrichment,
    shutdown: Arc<AtomicBool>,
) {
    let mut last_orphan_log: HashMap<IpAddr, Instant> = HashMap::new();
    let mut shutdown_deadline: Option<Instant> = None;

    loop {
        if shutdown.load(Ordering::Acquire) {
            let deadline = *shutdown_deadline.get_or_insert_with(|| Instant::now() + super::SHUTDOWN_GRACE);
            if Instant::now() >= deadline {
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

        process_one(
            datagram,
            shard_index,
            &out_queue,
            &template_cache,
            &counters,
            &errors,
            lookup.as_ref(),
            &frequency,
            &enrichment,
            &mut last_orphan_log,
        );
    }

    out_queue.close();
}

#[allow(clippy::too_many_arguments)]
fn process_one(
    mut datagram: Datagram,
    shard_index: usize,
    out_queue: &BoundedQueue<Datagram>,
    template_cache: &TemplateCache,
    counters: &Counters,
    errors: &ErrorLog,
    lookup: &dyn ASLookup,
    frequency: &std::sync::Mutex<AsFrequency>,
    enrichment: &Enrichment,
    last_orphan_log: &mut HashMap<IpAddr, Instant>,
) {
    let exporter_ip = datagram.exporter.ip();

    let outcome = match crate::protocol::decode_datagram(&datagram.bytes, exporter_ip, template_cache)
    {
        Ok(outcome) => outcome,
        Err(e) => {
            counters.pkts_dropped_decode.fetch_add(1, Ordering::Relaxed);
            debug!("worker {} decode error from {}: {}", shard_index, datagram.exporter, e);
            errors.push(format!("decode error from {}: {}", datagram.exporter, e));
            if out_queue.push(datagram) {
                counters.pkts_dropped_queue.fetch_add(1, Ordering::Relaxed);
            }
            return;
        }
    };

    counters
        .templates_seen
        .fetch_add(outcome.templates_learned as u64, Ordering::Relaxed);

    if outcome.orphan_data_sets > 0 {
        counters
            .pkts_dropped_orphan_template
            .fetch_add(outcome.orphan_data_sets as u64, Ordering::Relaxed);
        let should_log = match last_orphan_log.get(&exporter_ip) {
            Some(last) => last.elapsed() >= ORPHAN_LOG_INTERVAL,
            None => true,
        };
        if should_log {
            last_orphan_log.insert(exporter_ip, Instant::now());
            debug!(
                "worker {}: {} orphan data set(s) from {} (unknown template)",
                shard_index, outcome.orphan_data_sets, datagram.exporter
            );
        }
    }

    counters
        .records_decoded
        .fetch_add(outcome.records.len() as u64, Ordering::Relaxed);

    if enrichment.as_extraction {
        for record in &outcome.records {
            let pair = extractor::extract(record, &datagram.bytes, lookup, enrichment.as_extraction);
            if pair.is_present() {
                counters.records_with_as.fetch_add(1, Ordering::Relaxed);
                let mut freq = frequency.lock().unwrap();
                if let Some(as_number) = pair.src_as.filter(|v| *v != 0) {
                    freq.record((Direction::Source, as_number));
                }
                if let Some(as_number) = pair.dst_as.filter(|v| *v != 0) {
                    freq.record((Direction::Destination, as_number));
                }
                drop(freq);

                if enrichment.enrich_in_place {
                    extractor::rewrite_in_place(record, &mut datagram.bytes, pair);
                }
            }
        }
    }

    if out_queue.push(datagram) {
        counters.pkts_dropped_queue.fetch_add(1, Ordering::Relaxed);
    }
}
