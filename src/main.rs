use std::net::{SocketAddr, UdpSocket};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info};
use structopt::StructOpt;

use flowrelay::cli::Opts;
use flowrelay::config;
use flowrelay::error::{self, RelayError};
use flowrelay::extractor::{self, AsFrequency, NullASLookup};
use flowrelay::pipeline::{self, datagram::Datagram, queue::{BoundedQueue, DropPolicy}};
use flowrelay::protocol::template_cache::TemplateCache;
use flowrelay::stats::{
    self,
    counters::{Counters, RateTracker},
    errors::ErrorLog,
    server::StatsContext,
};

const TEMPLATE_SHARD_COUNT: usize = 16;
const TEMPLATE_CAPACITY_PER_SHARD: usize = 65536 / TEMPLATE_SHARD_COUNT;

fn main() -> ExitCode {
    let opts = Opts::from_args();

    let log_level = config::peek_log_level(&opts);
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter(None, log_level)
        .init();

    info!("starting flowrelay");

    match std::panic::catch_unwind(|| run(opts)) {
        Ok(Ok(())) => {
            info!("closing flowrelay");
            ExitCode::from(0)
        }
        Ok(Err(e)) => {
            error!("{}", e);
            let code = match e {
                RelayError::Config(_) | RelayError::Validation(_) | RelayError::Io(_) => 1,
                RelayError::Bind { .. } => 2,
            };
            ExitCode::from(code)
        }
        Err(_) => {
            error!("flowrelay aborted on an internal panic");
            ExitCode::from(3)
        }
    }
}

fn run(opts: Opts) -> error::Result<()> {
    let config = config::load(&opts)?;

    let listen_addr: SocketAddr = format!("0.0.0.0:{}", config.general.listen_port)
        .parse()
        .expect("a port number always produces a valid socket address");
    let ingress_socket = UdpSocket::bind(listen_addr).map_err(|source| RelayError::Bind {
        addr: listen_addr.to_string(),
        source,
    })?;
    let _ = ingress_socket.set_recv_buffer_size(config.general.buffer_size);

    let collectors = pipeline::forwarder::resolve_collectors(
        &config.forwarding.collectors,
        config.general.output_port,
    )
    .map_err(RelayError::Validation)?;

    let workers = config.performance.workers;
    let queue_size = config.performance.queue_size;

    let template_cache = Arc::new(TemplateCache::new(
        TEMPLATE_SHARD_COUNT,
        TEMPLATE_CAPACITY_PER_SHARD,
    ));
    let counters = Arc::new(Counters::new());
    let error_log = Arc::new(ErrorLog::new());
    let frequency = Arc::new(std::sync::Mutex::new(AsFrequency::new()));
    let rate = Arc::new(RateTracker::new(config.performance.stats_interval));
    let lookup: Arc<dyn extractor::ASLookup> = Arc::new(NullASLookup);
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        })
        .expect("installing the Ctrl-C handler should only fail if called twice");
    }

    let shard_queues: Arc<Vec<Arc<BoundedQueue<Datagram>>>> = Arc::new(
        (0..workers)
            .map(|_| Arc::new(BoundedQueue::new(queue_size, DropPolicy::DropNewest)))
            .collect(),
    );
    let egress_queue = Arc::new(BoundedQueue::new(queue_size, DropPolicy::DropOldest));

    let mut threads = Vec::new();

    {
        let shard_queues = Arc::clone(&shard_queues);
        let counters = Arc::clone(&counters);
        let shutdown = Arc::clone(&shutdown);
        threads.push(
            thread::Builder::new()
                .name("ingress".to_string())
                .spawn(move || pipeline::ingress::run(ingress_socket, shard_queues, counters, shutdown))
                .unwrap(),
        );
    }

    for (index, shard_queue) in shard_queues.iter().enumerate() {
        let in_queue = Arc::clone(shard_queue);
        let out_queue = Arc::clone(&egress_queue);
        let template_cache = Arc::clone(&template_cache);
        let counters = Arc::clone(&counters);
        let error_log = Arc::clone(&error_log);
        let lookup = Arc::clone(&lookup);
        let frequency = Arc::clone(&frequency);
        let enrichment = config.enrichment.clone();
        let shutdown = Arc::clone(&shutdown);
        threads.push(
            thread::Builder::new()
                .name(format!("worker-{}", index))
                .spawn(move || {
                    pipeline::worker::run(
                        index,
                        in_queue,
                        out_queue,
                        template_cache,
                        counters,
                        error_log,
                        lookup,
                        frequency,
                        enrichment,
                        shutdown,
                    )
                })
                .unwrap(),
        );
    }

    {
        let in_queue = Arc::clone(&egress_queue);
        let counters = Arc::clone(&counters);
        let shutdown = Arc::clone(&shutdown);
        threads.push(
            thread::Builder::new()
                .name("forwarder".to_string())
                .spawn(move || pipeline::forwarder::run(in_queue, collectors, counters, shutdown))
                .unwrap(),
        );
    }

    {
        let template_cache = Arc::clone(&template_cache);
        let idle_timeout = Duration::from_secs(config.performance.template_idle_timeout_secs);
        let shutdown = Arc::clone(&shutdown);
        threads.push(
            thread::Builder::new()
                .name("janitor".to_string())
                .spawn(move || pipeline::janitor::run(template_cache, idle_timeout, shutdown))
                .unwrap(),
        );
    }

    {
        let stats_ctx = Arc::new(StatsContext {
            counters: Arc::clone(&counters),
            errors: Arc::clone(&error_log),
            template_cache: Arc::clone(&template_cache),
            frequency: Arc::clone(&frequency),
            rate: Arc::clone(&rate),
            config: config.clone(),
        });
        let stats_port = config.general.stats_port;
        let shutdown = Arc::clone(&shutdown);
        threads.push(
            thread::Builder::new()
                .name("stats".to_string())
                .spawn(move || {
                    if let Err(e) = stats::server::run(stats_port, stats_ctx, shutdown) {
                        error!("stats server exited: {}", e);
                    }
                })
                .unwrap(),
        );
    }

    for handle in threads {
        let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
        if let Err(e) = handle.join() {
            error!("thread {} panicked: {:?}", name, e);
        }
    }

    Ok(())
}
