mod parse;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::simulation::GraphData;
use crate::timeline::TimelineData;
use crate::treemap::HierarchyNode;

#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    pub graph: Option<GraphData>,
    pub peaks: Vec<Peak>,
    pub timeline: Option<TimelineData>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Peak {
    pub keyword: String,
    pub treemap: HierarchyNode,
}

impl Dashboard {
    pub fn from_json(raw: &str) -> Result<Self> {
        parse::parse_dashboard(raw)
    }
}

pub fn load_dashboard(path: &Path) -> Result<Dashboard> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dashboard {}", path.display()))?;
    let dashboard = Dashboard::from_json(&raw)
        .with_context(|| format!("failed to parse dashboard {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = dashboard.graph.as_ref().map_or(0, |graph| graph.nodes.len()),
        edges = dashboard.graph.as_ref().map_or(0, |graph| graph.edges.len()),
        peaks = dashboard.peaks.len(),
        timeline = dashboard.timeline.is_some(),
        "dashboard loaded"
    );
    Ok(dashboard)
}
