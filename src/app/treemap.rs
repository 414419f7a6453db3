use std::collections::HashMap;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, Ui, pos2, vec2};
use radar_layout::treemap::{LeafRect, TileRect};

use super::render_utils::{BACKGROUND, clipped_label, dim_color, series_color};
use super::{CachedTreemap, PeakView};

impl PeakView {
    fn draw_selector(&mut self, ui: &mut Ui) {
        let current = self
            .peaks
            .get(self.selected)
            .map_or("none", |peak| peak.keyword.as_str())
            .to_owned();

        egui::ComboBox::from_label("Peak")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (index, peak) in self.peaks.iter().enumerate() {
                    ui.selectable_value(&mut self.selected, index, peak.keyword.as_str());
                }
            });
    }

    fn ensure_layout(&mut self, size: egui::Vec2) {
        if let Some(cached) = &self.layout
            && cached.peak == self.selected
            && cached.size == size
        {
            return;
        }

        let Some(peak) = self.peaks.get(self.selected) else {
            self.layout = None;
            return;
        };

        let container = TileRect::from_size(f64::from(size.x), f64::from(size.y));
        let layout = self.engine.layout(&peak.treemap, container);
        if self
            .selected_leaf
            .as_deref()
            .is_some_and(|key| layout.leaf_by_key(key).is_none())
        {
            self.selected_leaf = None;
        }
        self.layout = Some(CachedTreemap {
            peak: self.selected,
            size,
            layout,
        });
    }

    pub(in crate::app) fn selected_leaf(&self) -> Option<&LeafRect> {
        let key = self.selected_leaf.as_deref()?;
        self.layout.as_ref()?.layout.leaf_by_key(key)
    }

    pub(in crate::app) fn draw(&mut self, ui: &mut Ui) {
        if self.peaks.is_empty() {
            ui.label("This dashboard has no keyword peaks.");
            return;
        }

        ui.horizontal(|ui| self.draw_selector(ui));
        ui.add_space(4.0);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);

        self.ensure_layout(rect.size());
        let Some(cached) = &self.layout else {
            return;
        };

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|position| rect.contains(*position))
            .map(|position| position - rect.min);
        let hovered = pointer.and_then(|offset| {
            cached
                .layout
                .leaf_at(f64::from(offset.x), f64::from(offset.y))
        });

        let mut groups: HashMap<&str, usize> = HashMap::new();
        let font = FontId::proportional(11.0);
        for leaf in &cached.layout.leaves {
            let next = groups.len();
            let group = *groups.entry(group_of(&leaf.key)).or_insert(next);
            let tile = Rect::from_min_max(
                rect.min + vec2(leaf.rect.x0 as f32, leaf.rect.y0 as f32),
                rect.min + vec2(leaf.rect.x1 as f32, leaf.rect.y1 as f32),
            );

            let is_hovered = hovered.is_some_and(|hit| hit.key == leaf.key);
            let is_selected = self.selected_leaf.as_deref() == Some(leaf.key.as_str());
            let base = series_color(group);
            let fill = if is_hovered || is_selected {
                base
            } else {
                dim_color(base, 0.75)
            };
            painter.rect_filled(tile, 0.0, fill);
            if is_selected {
                painter.rect_stroke(
                    tile,
                    0.0,
                    Stroke::new(2.0, Color32::from_gray(245)),
                    StrokeKind::Inside,
                );
            }

            if tile.height() >= 14.0
                && let Some(label) = clipped_label(&leaf.name, tile.width() - 6.0, 6.5)
            {
                painter.text(
                    pos2(tile.left() + 3.0, tile.top() + 2.0),
                    Align2::LEFT_TOP,
                    label,
                    font.clone(),
                    Color32::from_gray(245),
                );
            }
        }

        if let Some(leaf) = hovered {
            let text = match &leaf.summary {
                Some(summary) => format!("{} ({})\n{summary}", leaf.name, leaf.value),
                None => format!("{} ({})", leaf.name, leaf.value),
            };
            response.clone().on_hover_text_at_pointer(text);
        }

        if response.clicked() {
            self.selected_leaf = hovered.map(|leaf| leaf.key.clone());
        }
    }
}

fn group_of(key: &str) -> &str {
    let mut segments = key.splitn(3, '.');
    let root = segments.next().unwrap_or(key);
    segments.next().unwrap_or(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_group_under_first_level_below_root() {
        assert_eq!(group_of("tomaat.rood.kers"), "rood");
        assert_eq!(group_of("tomaat.groen"), "groen");
        assert_eq!(group_of("tomaat"), "tomaat");
    }
}
