//! corridor: one simulated day on a congested commuter corridor.
//!
//! Car commuters cross a one-lane bridge into town in the morning peak and
//! drive back in the evening; some suburbanites take the bus instead, and
//! downtown residents walk to lunch.  Events, tick summaries and link
//! snapshots are written to `output/corridor` (or the directory given as
//! the first argument).
//!
//! ```text
//! RUST_LOG=info cargo run -p corridor --release
//! ```

mod scenario;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;

use qs_core::{SimConfig, TransportMode};
use qs_events::EventCounter;
use qs_network::DijkstraRouter;
use qs_output::{CsvWriter, SimOutputObserver};
use qs_sim::SimBuilder;

use scenario::{build_network, build_population, build_schedule};

// ── Constants ─────────────────────────────────────────────────────────────────

const DRIVERS:               usize = 1_200;
const BUS_RIDERS:            usize = 300;
const WALKERS:               usize = 150;
const SEED:                  u64   = 42;
const OUTPUT_INTERVAL_TICKS: u64   = 900; // 15 min at 1 s ticks

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_dir = std::env::args().nth(1).map_or_else(|| PathBuf::from("output/corridor"), PathBuf::from);

    // 1. Scenario.
    let (network, corridor) = build_network()?;
    let (schedule, trip) = build_schedule(&corridor)?;
    let population = build_population(&corridor, &trip, [DRIVERS, BUS_RIDERS, WALKERS], SEED);
    log::info!(
        "network: {} nodes, {} links; {} persons; {} bus departures",
        network.node_count(),
        network.link_count(),
        population.len(),
        schedule.departures.len(),
    );

    // 2. Config.
    let config = SimConfig {
        stuck_threshold_secs:  Some(300),
        output_interval_ticks: OUTPUT_INTERVAL_TICKS,
        ..SimConfig::default()
    };

    // 3. Output and sim.
    let mut obs = SimOutputObserver::new(CsvWriter::new(&out_dir)?, &config);
    let counter = Arc::new(Mutex::new(EventCounter::new()));
    let mut sim = SimBuilder::new(config.clone(), network, population)
        .schedule(schedule)
        .router(TransportMode::Car, DijkstraRouter)
        .event_handler(obs.event_handler(&config))
        .event_handler(Arc::clone(&counter))
        .build()?;

    // 4. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.take_error() {
        log::error!("output error: {e}");
    }

    // 5. Summary.
    let counter = counter.lock().map_err(|_| anyhow::anyhow!("event counter poisoned"))?;
    println!("Simulated until {} in {:.3} s", sim.clock, elapsed.as_secs_f64());
    println!("Output written to {}", out_dir.display());
    println!();
    println!("{:<28} {:>10}", "Event", "Count");
    println!("{}", "-".repeat(39));
    for (name, count) in &counter.counts {
        println!("{name:<28} {count:>10}");
    }
    println!("{}", "-".repeat(39));
    println!("{:<28} {:>10}", "total", counter.total());

    let stuck = counter.count("stuckAndAbort");
    if stuck > 0 {
        log::warn!("{stuck} agents did not finish their plans");
    }
    Ok(())
}
