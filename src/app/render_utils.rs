use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2};
use radar_layout::simulation::EdgeKind;
use radar_layout::viewport::ViewportTransform;

const SERIES_COLORS: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);

pub(super) fn series_color(index: usize) -> Color32 {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

pub(super) fn edge_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::Retweet => Color32::from_rgb(214, 39, 40),
        EdgeKind::Mention => Color32::from_rgb(44, 160, 44),
        EdgeKind::Reply => Color32::from_rgb(31, 119, 180),
        EdgeKind::Other => Color32::from_gray(120),
    }
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: &ViewportTransform) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (56.0 * transform.k.clamp(0.6, 1.8)).max(20.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let origin = rect.min + transform.translation();

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn draw_arrow(painter: &Painter, start: Pos2, end: Pos2, target_radius: f32, stroke: Stroke) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 1.0 {
        return;
    }

    let direction = delta / length;
    let tip = end - direction * target_radius;
    painter.line_segment([start, tip], stroke);

    let head = (stroke.width * 4.0).clamp(4.0, 9.0);
    let normal = Vec2::new(-direction.y, direction.x);
    let base = tip - direction * head;
    painter.line_segment([tip, base + normal * head * 0.5], stroke);
    painter.line_segment([tip, base - normal * head * 0.5], stroke);
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn clipped_label(text: &str, width: f32, char_width: f32) -> Option<String> {
    let fits = (width / char_width.max(1.0)).floor() as usize;
    if fits == 0 {
        return None;
    }

    let count = text.chars().count();
    if count <= fits {
        return Some(text.to_owned());
    }
    if fits <= 1 {
        return text.chars().next().map(String::from);
    }

    let mut clipped: String = text.chars().take(fits - 1).collect();
    clipped.push('…');
    Some(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipped_label_fits_or_truncates() {
        assert_eq!(clipped_label("kers", 100.0, 6.5).as_deref(), Some("kers"));
        assert_eq!(clipped_label("komkommer", 26.0, 6.5).as_deref(), Some("kom…"));
        assert_eq!(clipped_label("sla", 3.0, 6.5), None);
    }

    #[test]
    fn edges_are_coloured_by_kind() {
        assert_eq!(edge_color(EdgeKind::Retweet), Color32::from_rgb(214, 39, 40));
        assert_eq!(edge_color(EdgeKind::Mention), Color32::from_rgb(44, 160, 44));
        assert_eq!(edge_color(EdgeKind::Reply), Color32::from_rgb(31, 119, 180));
    }

    #[test]
    fn culls_offscreen_geometry() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-3.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-10.0, 50.0), 5.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -5.0), 2.0));
    }
}
