mod app;
mod headless;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use radar_layout::interaction::InteractionConfig;
use radar_layout::simulation::SimulationConfig;
use radar_layout::timeline::TimelineConfig;
use radar_layout::treemap::TreemapConfig;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dashboard JSON with `graph`, `peaks` and `timeline` sections.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "info")]
    log_level: Level,
    #[arg(long, default_value_t = 30.0)]
    link_distance: f32,
    #[arg(long, default_value_t = -30.0, allow_hyphen_values = true)]
    charge: f32,
    #[arg(long, default_value_t = 300.0)]
    distance_max: f32,
    /// Print the computed layout as JSON instead of opening a window.
    #[arg(long)]
    headless: bool,
    /// Tick cap for the headless simulation.
    #[arg(long, default_value_t = 1000)]
    ticks: usize,
    #[arg(long, default_value_t = 960.0)]
    width: f32,
    #[arg(long, default_value_t = 600.0)]
    height: f32,
}

/// Layout parameters shared by the viewer and the headless export.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub(crate) simulation: SimulationConfig,
    pub(crate) interaction: InteractionConfig,
    pub(crate) treemap: TreemapConfig,
    pub(crate) timeline: TimelineConfig,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Settings {
    fn from_args(args: &Args) -> Self {
        Self {
            simulation: SimulationConfig {
                link_distance: args.link_distance.max(0.0),
                charge_strength: args.charge,
                distance_max: args.distance_max.max(0.0),
                ..SimulationConfig::default()
            },
            interaction: InteractionConfig::default(),
            treemap: TreemapConfig {
                padding_inner: 1.0,
                round: true,
                ..TreemapConfig::default()
            },
            timeline: TimelineConfig {
                width: args.width,
                ..TimelineConfig::default()
            },
            width: args.width.max(1.0),
            height: args.height.max(1.0),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_args(&args);
    if args.headless {
        return headless::run(&args.input, &settings, args.ticks);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let input = args.input;
    eframe::run_native(
        "radar-layout",
        options,
        Box::new(move |cc| Ok(Box::new(app::RadarApp::new(cc, input, settings)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
