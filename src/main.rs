use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use traffic_light::simulation::{
    LightConfig, OverflowPolicy, ReceiveOrder, SimThreads, TrafficLight,
};

#[derive(Parser)]
#[command(name = "traffic_light")]
#[command(about = "Traffic light simulation with vehicles waiting for green")]
struct Cli {
    /// Wall-clock seconds to run the simulation
    #[arg(long, default_value = "15")]
    duration: u64,

    /// Number of vehicle threads waiting on the light
    #[arg(long, default_value = "3")]
    vehicles: usize,

    /// Shortest phase length in milliseconds
    #[arg(long, default_value = "4000")]
    min_cycle_ms: u64,

    /// Longest phase length in milliseconds
    #[arg(long, default_value = "6000")]
    max_cycle_ms: u64,

    /// Sleep between light loop iterations in milliseconds
    #[arg(long, default_value = "1")]
    tick_ms: u64,

    /// Order in which vehicles receive published phases
    #[arg(long, value_enum, default_value_t = ReceiveOrder::Lifo)]
    order: ReceiveOrder,

    /// Bound the phase queue to this many entries
    #[arg(long)]
    capacity: Option<usize>,

    /// What a full bounded queue does with a new phase
    #[arg(long, value_enum, default_value_t = OverflowPolicy::DropOldest)]
    overflow: OverflowPolicy,

    /// Seed for reproducible phase lengths
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn light_config(&self) -> LightConfig {
        let mut config = LightConfig::default()
            .cycle_range(
                Duration::from_millis(self.min_cycle_ms),
                Duration::from_millis(self.max_cycle_ms),
            )
            .tick_interval(Duration::from_millis(self.tick_ms))
            .receive_order(self.order);
        if let Some(capacity) = self.capacity {
            config = config.queue_capacity(capacity, self.overflow);
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_simulation(&cli)
}

/// Run one light and its vehicles for the requested wall-clock time
fn run_simulation(cli: &Cli) -> Result<()> {
    let light =
        TrafficLight::with_config(cli.light_config()).context("Invalid traffic light settings")?;
    let crossings = Arc::new(AtomicUsize::new(0));
    let mut threads = SimThreads::new();

    info!(
        "Running traffic light for {}s with {} vehicles ({:?} order)",
        cli.duration, cli.vehicles, cli.order
    );

    light.simulate(&mut threads)?;
    for vehicle_id in 0..cli.vehicles {
        let light = light.clone();
        let crossings = Arc::clone(&crossings);
        threads.spawn(format!("vehicle-{vehicle_id}"), move || {
            drive_vehicle(vehicle_id, &light, &crossings)
        })?;
    }

    let run_for = Duration::from_secs(cli.duration);
    let started = Instant::now();
    while started.elapsed() < run_for {
        let remaining = run_for.saturating_sub(started.elapsed());
        std::thread::sleep(remaining.min(Duration::from_secs(1)));
        info!(
            "--- {:.1}s: light {} | flips {} | crossings {} | queued {} ---",
            started.elapsed().as_secs_f32(),
            light.current_phase(),
            light.flip_count(),
            crossings.load(Ordering::Acquire),
            light.queue().len()
        );
    }

    light.stop();
    threads.join_all()?;

    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", started.elapsed().as_secs_f32());
    info!("Total flips: {}", light.flip_count());
    info!("Total crossings: {}", crossings.load(Ordering::Acquire));
    info!("Final phase: {}", light.current_phase());
    info!("Values left in queue: {}", light.queue().len());
    Ok(())
}

/// Cross whenever the light turns green, until it is stopped
fn drive_vehicle(vehicle_id: usize, light: &TrafficLight, crossings: &AtomicUsize) {
    while light.wait_for_green().is_ok() {
        let total = crossings.fetch_add(1, Ordering::AcqRel) + 1;
        info!("Vehicle {} crossed on green (crossing #{})", vehicle_id, total);

        // Time spent driving through the intersection
        let crossing_ms = rand::rng().random_range(100..400);
        std::thread::sleep(Duration::from_millis(crossing_ms));
    }
}
