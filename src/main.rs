//! Rally - Headless driver for the infinite-world streaming engine
//!
//! Drives a tank along a scripted route, streaming terrain tiles and scenery
//! around it, and saves the world on exit.

mod save;
mod scene;
mod settings;
mod tank;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rally_core::{GameTime, PeriodicTimer, TimeConfig};
use rally_world::{RallyWorld, SpacedSpawn, StreamingConfig, WorldSettings};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::save::{default_save_path, JsonFileStore};
use crate::scene::HeadlessScene;
use crate::settings::{RallySettings, DEFAULT_CONFIG_PATH};
use crate::tank::{Route, Tank};

/// Seconds between progress reports
const REPORT_PERIOD: f32 = 10.0;

#[derive(Parser, Debug)]
#[command(name = "rally", version, about = "Drive a tank through an endless streamed world")]
struct Cli {
    /// Config file (JSON, or TOML by extension)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Save file; defaults to the user data directory
    #[arg(long)]
    save: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 3600)]
    ticks: usize,

    /// Seed for scenery placement; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Input route replayed in a loop: F, B, L, R or `.` per tick, with
    /// optional repeat counts such as `120F45R`
    #[arg(long, default_value = "300F90R300F90L")]
    route: String,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let cli = Cli::parse();
    info!("Starting Rally...");

    let settings = RallySettings::load(&cli.config);
    let route: Route = cli
        .route
        .parse()
        .with_context(|| format!("Invalid route '{}'", cli.route))?;

    let save_path = cli.save.unwrap_or_else(default_save_path);
    let mut store = JsonFileStore::open(&save_path)?;
    let mut scene = HeadlessScene::new(settings.camera);

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let world_settings = WorldSettings {
        streaming: StreamingConfig::default(),
        obstacles: settings.obstacles.clone(),
        table: settings.table.clone(),
    };
    let (mut world, pose) = RallyWorld::start(world_settings, &store, &mut scene, rng)
        .context("Failed to restore saved obstacle placements")?;
    info!("World ready: {}", scene.summary());

    let mut tank = Tank::new(settings.tank, pose);
    let mut time = GameTime::new(TimeConfig::default());
    let mut report = PeriodicTimer::new(REPORT_PERIOD);
    let mut spaced = 0;
    let mut declined = 0;

    for tick in 0..cli.ticks {
        time.update(cli.dt);
        let pose = tank.update(route.step(tick));
        let result = world.tick(&mut scene, pose, time.delta_time);

        if let Some(crossing) = result.tile_crossing {
            debug!("Tick {}: tile crossing {:?}", tick, crossing);
        }
        match result.obstacles.spaced {
            SpacedSpawn::Spawned { .. } => spaced += 1,
            SpacedSpawn::Declined { .. } => declined += 1,
            SpacedSpawn::NotDue => {}
        }

        if report.tick(time.delta_time) {
            info!(
                "t={:.1}s at ({:.1}, {:.1}) heading {:.0}: {}",
                time.total_time,
                pose.position.x,
                pose.position.y,
                pose.heading,
                scene.summary()
            );
        }
    }

    let end = tank.pose();
    info!(
        "Drove {:.1} units in {} ticks, ending heading {:.0}; {} spaced spawns, {} declined",
        tank.odometer(),
        cli.ticks,
        end.heading,
        spaced,
        declined
    );

    let saved = world
        .teardown(&mut scene, &mut store)
        .context("Failed to save obstacle placements")?;
    if store.is_dirty() {
        store.flush()?;
    }
    let released = scene.total_props();
    info!(
        "Saved anchor at ({:.2}, {:.2}) and {} obstacles to {:?} ({} props still live)",
        saved.anchor.position.x,
        saved.anchor.position.y,
        saved.records,
        store.path(),
        released.live
    );

    Ok(())
}
