use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::vec2;
use radar_layout::dashboard::{Dashboard, load_dashboard};
use radar_layout::simulation::{EdgeKind, NodePosition, Simulation};
use radar_layout::timeline::{self, TimelineLayout};
use radar_layout::treemap::{TileRect, TreemapEngine, TreemapLayout};
use serde::Serialize;
use tracing::info;

use crate::Settings;

#[derive(Serialize)]
struct Export<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<GraphExport<'a>>,
    peaks: Vec<PeakExport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline: Option<TimelineLayout>,
}

#[derive(Serialize)]
struct GraphExport<'a> {
    ticks: usize,
    alpha: f32,
    settled: bool,
    nodes: Vec<NodePosition<'a>>,
    edges: Vec<EdgeExport<'a>>,
}

#[derive(Serialize)]
struct EdgeExport<'a> {
    source: &'a str,
    target: &'a str,
    kind: EdgeKind,
}

#[derive(Serialize)]
struct PeakExport<'a> {
    keyword: &'a str,
    #[serde(flatten)]
    layout: TreemapLayout,
}

pub(crate) fn run(input: &Path, settings: &Settings, max_ticks: usize) -> Result<()> {
    let dashboard = load_dashboard(input)?;

    let center = vec2(settings.width / 2.0, settings.height / 2.0);
    let mut simulation = dashboard
        .graph
        .as_ref()
        .map(|data| Simulation::new(data, settings.simulation, center));
    let ticks = simulation
        .as_mut()
        .map_or(0, |simulation| simulation.run_to_quiescence(max_ticks));

    let mut engine = TreemapEngine::new(settings.treemap);
    let container = TileRect::from_size(f64::from(settings.width), f64::from(settings.height));

    let export = Export {
        graph: simulation.as_ref().map(|simulation| graph_export(simulation, ticks)),
        peaks: peak_exports(&dashboard, &mut engine, container),
        timeline: dashboard.timeline.as_ref().map(|data| {
            timeline::layout(&data.clusters(), data.axis(), &settings.timeline)
        }),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &export).context("failed to write layout JSON")?;
    writeln!(out).context("failed to write layout JSON")?;

    info!(ticks, peaks = export.peaks.len(), "layout exported");
    Ok(())
}

fn graph_export(simulation: &Simulation, ticks: usize) -> GraphExport<'_> {
    let nodes = simulation.nodes();
    GraphExport {
        ticks,
        alpha: simulation.state().alpha,
        settled: !simulation.is_running(),
        nodes: simulation.positions().collect(),
        edges: simulation
            .edges()
            .iter()
            .map(|edge| EdgeExport {
                source: nodes[edge.source].id.as_str(),
                target: nodes[edge.target].id.as_str(),
                kind: edge.kind,
            })
            .collect(),
    }
}

fn peak_exports<'a>(
    dashboard: &'a Dashboard,
    engine: &mut TreemapEngine,
    container: TileRect,
) -> Vec<PeakExport<'a>> {
    dashboard
        .peaks
        .iter()
        .map(|peak| PeakExport {
            keyword: peak.keyword.as_str(),
            layout: engine.layout(&peak.treemap, container),
        })
        .collect()
}
