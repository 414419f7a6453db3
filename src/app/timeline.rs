use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, pos2, vec2};
use radar_layout::timeline::{self, PlacedCluster, TimeAxis, TimelineConfig};

use super::TimelineView;
use super::render_utils::{BACKGROUND, dim_color, series_color};

const TICK_EVERY_MS: f64 = 6.0 * 60.0 * 60.0 * 1000.0;

impl TimelineView {
    fn axis(&self) -> TimeAxis {
        TimeAxis::new(self.beginning, self.ending)
    }

    fn ensure_layout(&mut self, config: &TimelineConfig) {
        if self
            .layout
            .as_ref()
            .is_some_and(|(width, _)| *width == config.width)
        {
            return;
        }

        let layout = timeline::layout(&self.clusters, self.axis(), config);
        self.layout = Some((config.width, layout));
    }

    pub(in crate::app) fn selected_cluster(&self) -> Option<&PlacedCluster> {
        let id = self.selected.as_deref()?;
        let (_, layout) = self.layout.as_ref()?;
        layout.clusters.iter().find(|cluster| cluster.id == id)
    }

    pub(in crate::app) fn omitted(&self) -> usize {
        self.layout.as_ref().map_or(0, |(_, layout)| layout.omitted)
    }

    pub(in crate::app) fn draw(&mut self, ui: &mut Ui, base: &TimelineConfig) {
        let config = TimelineConfig {
            width: ui.available_width().max(base.margin.left + base.margin.right + 1.0),
            ..*base
        };
        self.ensure_layout(&config);
        let Some((_, layout)) = &self.layout else {
            return;
        };

        if layout.clusters.is_empty() {
            ui.label("No clusters fall inside the timeline range.");
            return;
        }

        let axis = self.axis();
        let ticks = timeline::ticks(axis, &config, TICK_EVERY_MS);
        let height = layout.height(&config);
        let mut clicked = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(vec2(config.width, height), Sense::click());
                let painter = ui.painter_at(rect);
                painter.rect_filled(rect, 0.0, BACKGROUND);

                let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 90));
                let tick_font = FontId::proportional(10.0);
                for tick in &ticks {
                    let x = rect.left() + tick.x;
                    painter.line_segment(
                        [pos2(x, rect.top() + config.margin.top - 6.0), pos2(x, rect.bottom())],
                        grid,
                    );
                    painter.text(
                        pos2(x, rect.top() + 4.0),
                        Align2::CENTER_TOP,
                        tick.label.as_str(),
                        tick_font.clone(),
                        Color32::from_gray(190),
                    );
                }

                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .filter(|position| rect.contains(*position))
                    .map(|position| position - rect.min);
                let hovered = pointer.and_then(|offset| layout.cluster_at(offset.x, offset.y));

                for cluster in &layout.clusters {
                    let extent = Rect::from_min_max(
                        rect.min + vec2(cluster.extent.x0, cluster.extent.y0),
                        rect.min + vec2(cluster.extent.x1, cluster.extent.y1),
                    );
                    let is_active = hovered.is_some_and(|hit| hit.id == cluster.id)
                        || self.selected.as_deref() == Some(cluster.id.as_str());
                    let base = series_color(cluster.series);
                    let color = if is_active { base } else { dim_color(base, 0.8) };

                    if cluster.point {
                        painter.circle_filled(extent.center(), extent.height() / 2.0, color);
                    } else {
                        painter.rect_filled(extent, 2.0, color);
                    }
                }

                if let Some(cluster) = hovered {
                    let text = cluster
                        .summary
                        .clone()
                        .unwrap_or_else(|| cluster.id.clone());
                    response.clone().on_hover_text_at_pointer(text);
                }

                if response.clicked() {
                    clicked = Some(hovered.map(|cluster| cluster.id.clone()));
                }
            });

        if let Some(selection) = clicked {
            self.selected = selection;
        }
    }
}
