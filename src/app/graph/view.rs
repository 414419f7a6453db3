use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, pos2, vec2,
};

use super::super::GraphView;
use super::super::render_utils::{
    circle_visible, dim_color, draw_arrow, draw_background, edge_color, edge_visible,
};
use super::interaction::forward_pointer;

const NODE_RADIUS: f32 = 5.0;

impl GraphView {
    pub(in crate::app) fn draw(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.canvas = Some(rect);

        self.session.simulation.set_center(rect.size() * 0.5);
        forward_pointer(ui, rect, &response, &mut self.session);

        if self.live_physics {
            self.session.frame();
        } else {
            self.session
                .controller
                .flush(&mut self.session.simulation, &mut self.session.viewport);
        }

        let transform = self.session.viewport;
        let to_screen = |model: Pos2| rect.min + transform.apply(model).to_vec2();
        draw_background(&painter, rect, &transform);

        if self.show_quadtree_overlay {
            self.session.simulation.quadtree_cells(&mut self.quadtree_cells);
            for cell in &self.quadtree_cells {
                let [cx, cy] = cell.center;
                let min = to_screen(pos2(cx - cell.half_extent, cy - cell.half_extent));
                let max = to_screen(pos2(cx + cell.half_extent, cy + cell.half_extent));
                let alpha = if cell.is_leaf { 110 } else { 55 };
                let width = (1.4_f32 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
                painter.rect_stroke(
                    Rect::from_min_max(min, max),
                    0.0,
                    Stroke::new(width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                    StrokeKind::Middle,
                );
            }
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|position| rect.contains(*position));
        self.hovered = pointer.and_then(|position| {
            let local = (position - rect.min).to_pos2();
            self.session
                .controller
                .hit_test(&self.session.simulation, &transform, local)
                .map(|hit| hit.node)
        });
        let dragged = self.session.controller.dragged_node();
        let focus = dragged.or(self.hovered);

        let simulation = &self.session.simulation;
        let nodes = simulation.nodes();
        let radius = (NODE_RADIUS * transform.k).max(2.0);
        let edge_width = transform.k.sqrt().clamp(0.6, 2.4);

        for edge in simulation.edges() {
            if edge.is_self_loop() {
                continue;
            }
            let (Some(source), Some(target)) = (nodes.get(edge.source), nodes.get(edge.target))
            else {
                continue;
            };

            let start = to_screen(source.position.to_pos2());
            let end = to_screen(target.position.to_pos2());
            if !edge_visible(rect, start, end, radius) {
                continue;
            }

            let touches_focus = focus.is_some_and(|node| node == edge.source || node == edge.target);
            let color = if focus.is_none() || touches_focus {
                edge_color(edge.kind)
            } else {
                dim_color(edge_color(edge.kind), 0.4)
            };
            let width = if touches_focus { edge_width * 1.6 } else { edge_width };
            draw_arrow(&painter, start, end, radius, Stroke::new(width, color));
        }

        let label_font = FontId::proportional(11.0);
        for (index, node) in nodes.iter().enumerate() {
            let position = to_screen(node.position.to_pos2());
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let highlighted = focus == Some(index);
            let fill = if highlighted {
                Color32::from_rgb(255, 164, 101)
            } else if node.is_pinned() {
                Color32::from_rgb(245, 206, 93)
            } else {
                Color32::from_gray(210)
            };
            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if highlighted || (self.show_labels && transform.k >= 0.8) {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.id.as_str(),
                    label_font.clone(),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(node) = self.hovered.and_then(|index| nodes.get(index)) {
            let state = if node.is_pinned() { "  |  pinned" } else { "" };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("@{}{state}", node.id),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            ui.output_mut(|output| output.cursor_icon = CursorIcon::PointingHand);
        }

        if (self.live_physics && self.session.wants_frames()) || response.dragged() {
            ui.ctx().request_repaint();
        }
    }
}
