use eframe::egui::{self, RichText, Ui};

use super::super::{GraphView, Tab, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        match self.tab {
            Tab::Graph => match &mut self.graph {
                Some(graph) => graph.draw_controls(ui),
                None => {
                    ui.label("No graph loaded.");
                }
            },
            Tab::Treemap => {
                ui.heading("Word Treemap");
                ui.separator();
                if self.peaks.peaks.is_empty() {
                    ui.label("No keyword peaks loaded.");
                    return;
                }
                ui.label(format!("peaks: {}", self.peaks.peaks.len()));
                if let Some(cached) = &self.peaks.layout {
                    ui.label(format!("words: {}", cached.layout.leaves.len()));
                    ui.label(format!(
                        "rows reused: {} of {}",
                        cached.layout.reused_rows,
                        cached.layout.reused_rows + cached.layout.fresh_rows
                    ));
                }
                ui.add_space(6.0);
                ui.label(
                    "Switching peaks keeps the row structure of the previous layout \
                     wherever it still fits, so words move instead of jumping.",
                );
                if ui.button("Forget row structure").clicked() {
                    self.peaks.engine.reset();
                    self.peaks.layout = None;
                }
            }
            Tab::Timeline => {
                ui.heading("Story Timeline");
                ui.separator();
                let Some(timeline) = &self.timeline else {
                    ui.label("No timeline loaded.");
                    return;
                };
                ui.label(format!("clusters: {}", timeline.clusters.len()));
                if let Some((_, layout)) = &timeline.layout {
                    ui.label(format!("lanes: {}", layout.lanes));
                }
                let omitted = timeline.omitted();
                if omitted > 0 {
                    ui.label(
                        RichText::new(format!("{omitted} outside the time range"))
                            .color(egui::Color32::from_rgb(241, 146, 94)),
                    );
                }
            }
        }
    }
}

impl GraphView {
    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Find user")
            .on_hover_text("Fuzzy-match a user name and center the view on it.");
        let search = ui.text_edit_singleline(&mut self.search);
        let submitted = search.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
        if search.changed() {
            self.search_miss = false;
        }
        if (submitted || ui.button("Focus").clicked()) && !self.search.trim().is_empty() {
            let center = self.canvas.map_or_else(
                || self.session.simulation.center().to_pos2(),
                |canvas| (canvas.size() * 0.5).to_pos2(),
            );
            let query = self.search.trim().to_owned();
            self.search_miss = self.session.focus_query(&query, center).is_none();
        }
        if self.search_miss {
            ui.label(
                RichText::new("No user matches that query.")
                    .color(egui::Color32::from_rgb(241, 146, 94)),
            );
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Pause to freeze the layout while keeping pan and zoom.");
        ui.checkbox(&mut self.show_labels, "Show labels when zoomed in");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut cells used for the repulsion force.");

        ui.horizontal(|ui| {
            if ui.button("Reheat").clicked() {
                self.session.simulation.reheat(1.0);
            }
            if ui.button("Reset view").clicked() {
                self.session.viewport.set(Default::default());
            }
        });

        ui.separator();
        let state = self.session.simulation.state();
        ui.label(format!("alpha: {:.4}", state.alpha));
        ui.label(format!("alpha target: {:.2}", state.alpha_target));
        ui.label(format!("ticks: {}", self.session.simulation.ticks()));
        ui.label(if self.session.simulation.is_running() {
            "simulation: running"
        } else {
            "simulation: settled"
        });
        ui.label(format!("zoom: {:.2}x", self.session.viewport.k));
    }
}
