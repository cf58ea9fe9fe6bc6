//! tbtail - CSV metrics to TensorBoard relay.
//!
//! Exports simulation metrics CSV files into TensorBoard event files, either
//! as a one-shot pass or by following the files as they grow.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use tbtail::relay::{self, Follower, MetricsPaths};
use tbtail::sink::{ScalarSink, TensorboardSink};

/// CSV metrics to TensorBoard relay.
#[derive(Parser)]
#[command(name = "tbtail", about = "Relay CSV metrics into TensorBoard event files", version)]
struct Args {
    /// Directory containing the metrics CSV files.
    #[arg(long, value_name = "DIR")]
    metrics_dir: String,

    /// Output directory for TensorBoard event files.
    #[arg(long, default_value = "tb_logs", value_name = "DIR")]
    logdir: String,

    /// Stream updates until interrupted instead of exiting after one pass.
    #[arg(long)]
    follow: bool,

    /// Polling interval in seconds.
    #[arg(long, default_value_t = 1.0)]
    poll: f64,

    /// When following, start from the current end of each file.
    #[arg(long)]
    tail: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("tbtail={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Polling interval, floored to avoid a tight spin loop.
fn poll_interval(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds.max(0.1))
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("tbtail {} starting", env!("CARGO_PKG_VERSION"));

    let paths = relay::resolve_metrics_paths(Path::new(&args.metrics_dir));
    info!("Health metrics: {}", paths.health.display());
    info!("Generation metrics: {}", paths.generation.display());

    let mut sink = match TensorboardSink::create(&args.logdir) {
        Ok(sink) => sink,
        Err(e) => {
            error!("No usable TensorBoard writer: {}", e);
            std::process::exit(1);
        }
    };
    info!("Writing TensorBoard events to {}", args.logdir);

    if !args.follow {
        if let Err(e) = relay::export_once(&mut sink, &paths) {
            error!("Export failed: {}", e);
            std::process::exit(1);
        }
        sink.flush();
        sink.close();
        info!("Export complete");
        return;
    }

    follow(&mut sink, &paths, args.tail, poll_interval(args.poll));
}

/// Follow loop: poll both files until interrupted, then flush and close.
fn follow(sink: &mut dyn ScalarSink, paths: &MetricsPaths, start_at_end: bool, interval: Duration) {
    let mut follower = Follower::new(paths, start_at_end);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!(
        "Following (poll interval {:.1}s, starting at {})",
        interval.as_secs_f64(),
        if start_at_end { "end" } else { "beginning" }
    );

    while running.load(Ordering::SeqCst) {
        match follower.poll(sink) {
            Ok(true) => sink.flush(),
            Ok(false) => debug!("No new rows"),
            Err(e) => {
                error!("Relay failed: {}", e);
                std::process::exit(1);
            }
        }

        // Sleep with periodic checks for shutdown signal
        let slice = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(slice);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutting down...");
    sink.flush();
    sink.close();
    info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::poll_interval;
    use std::time::Duration;

    #[test]
    fn poll_interval_floors_tiny_values() {
        assert_eq!(poll_interval(0.01), Duration::from_millis(100));
        assert_eq!(poll_interval(0.0), Duration::from_millis(100));
    }

    #[test]
    fn poll_interval_passes_normal_values() {
        assert_eq!(poll_interval(2.5), Duration::from_secs_f64(2.5));
    }
}
