use std::path::Path;

use eframe::egui::{self, Align, Context, Layout};

use super::super::{Tab, ViewModel};

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        input: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("radar-layout");
                    ui.separator();
                    ui.label(format!("input: {}", input.display()));
                    if let Some(graph) = &self.graph {
                        let simulation = &graph.session.simulation;
                        ui.label(format!("nodes: {}", simulation.nodes().len()));
                        ui.label(format!("edges: {}", simulation.edges().len()));
                    }
                    ui.label(format!("peaks: {}", self.peaks.peaks.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload dashboard"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        self.draw_tab_selector(ui);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Graph => match &mut self.graph {
                Some(graph) => graph.draw(ui),
                None => {
                    ui.label("This dashboard has no interaction graph.");
                }
            },
            Tab::Treemap => self.peaks.draw(ui),
            Tab::Timeline => match &mut self.timeline {
                Some(timeline) => timeline.draw(ui, &self.settings.timeline),
                None => {
                    ui.label("This dashboard has no timeline.");
                }
            },
        });
    }

    fn draw_tab_selector(&mut self, ui: &mut egui::Ui) {
        // Right-to-left layout: last tab first.
        if self.timeline.is_some() {
            ui.selectable_value(&mut self.tab, Tab::Timeline, "Timeline");
        }
        if !self.peaks.peaks.is_empty() {
            ui.selectable_value(&mut self.tab, Tab::Treemap, "Word treemap");
        }
        if self.graph.is_some() {
            ui.selectable_value(&mut self.tab, Tab::Graph, "Interactions");
        }
    }
}
