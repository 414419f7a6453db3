use eframe::egui::{self, RichText, Ui};
use radar_layout::util::format_timestamp;

use super::super::{GraphView, Tab, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        match self.tab {
            Tab::Graph => {
                if let Some(graph) = &self.graph {
                    graph_details(graph, ui);
                }
            }
            Tab::Treemap => {
                let Some(leaf) = self.peaks.selected_leaf() else {
                    ui.label("Click a word to see its summary.");
                    return;
                };
                ui.label(RichText::new(leaf.name.as_str()).strong());
                ui.small(leaf.key.as_str());
                ui.label(format!("weight: {}", leaf.value));
                ui.separator();
                match &leaf.summary {
                    Some(summary) => {
                        egui::ScrollArea::vertical().show(ui, |ui| ui.label(summary.as_str()));
                    }
                    None => {
                        ui.label("No summary for this word.");
                    }
                }
            }
            Tab::Timeline => {
                let Some(cluster) = self
                    .timeline
                    .as_ref()
                    .and_then(|timeline| timeline.selected_cluster())
                else {
                    ui.label("Click a cluster to see its summary.");
                    return;
                };
                ui.label(RichText::new(cluster.id.as_str()).strong());
                ui.label(format!("story: {}", cluster.series));
                ui.label(format!("lane: {}", cluster.lane));
                if cluster.point {
                    ui.label(format!("at: {}", format_timestamp(cluster.start)));
                } else {
                    ui.label(format!("from: {}", format_timestamp(cluster.start)));
                    ui.label(format!("to: {}", format_timestamp(cluster.end)));
                }
                ui.separator();
                if let Some(summary) = &cluster.summary {
                    egui::ScrollArea::vertical().show(ui, |ui| ui.label(summary.as_str()));
                }
            }
        }
    }
}

fn graph_details(graph: &GraphView, ui: &mut Ui) {
    let simulation = &graph.session.simulation;
    let focus = graph
        .session
        .controller
        .dragged_node()
        .or(graph.hovered);
    let Some((index, node)) = focus.and_then(|index| simulation.nodes().get(index).map(|node| (index, node)))
    else {
        ui.label("Hover a user to inspect it, drag to pin it while held.");
        return;
    };

    ui.label(RichText::new(format!("@{}", node.id)).strong());
    ui.label(format!(
        "position: ({:.1}, {:.1})",
        node.position.x, node.position.y
    ));
    if node.is_pinned() {
        ui.label("pinned while dragged");
    }

    ui.separator();
    ui.label(RichText::new("Interactions").strong());
    let mut any = false;
    for edge in simulation.edges() {
        let (direction, other) = if edge.source == index {
            ("to", edge.target)
        } else if edge.target == index {
            ("from", edge.source)
        } else {
            continue;
        };
        let Some(other) = simulation.nodes().get(other) else {
            continue;
        };
        any = true;
        ui.label(format!("{} {direction} @{}", edge.kind.label(), other.id));
    }
    if !any {
        ui.label("No interactions.");
    }
}
