use eframe::egui::{Pos2, Vec2, pos2};
use serde::Serialize;

use crate::util::EPSILON;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleExtent {
    pub min: f32,
    pub max: f32,
}

impl ScaleExtent {
    pub fn new(min: f32, max: f32) -> Self {
        let min = min.max(EPSILON);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn clamp(self, k: f32) -> f32 {
        k.clamp(self.min, self.max)
    }
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self::new(0.5, 4.0)
    }
}

/// Pan/zoom state mapping model space onto the canvas:
/// `screen = model * k + (tx, ty)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportTransform {
    pub k: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn new(k: f32, tx: f32, ty: f32) -> Self {
        Self {
            k: k.max(EPSILON),
            tx,
            ty,
        }
    }

    pub fn apply(&self, model: Pos2) -> Pos2 {
        pos2(model.x * self.k + self.tx, model.y * self.k + self.ty)
    }

    pub fn invert(&self, screen: Pos2) -> Pos2 {
        let k = self.k.max(EPSILON);
        pos2((screen.x - self.tx) / k, (screen.y - self.ty) / k)
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }

    pub fn set(&mut self, next: ViewportTransform) {
        *self = next;
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            k: self.k,
            tx: self.tx + delta.x,
            ty: self.ty + delta.y,
        }
    }

    pub fn zoomed_at(&self, origin: Pos2, factor: f32, extent: ScaleExtent) -> Self {
        let anchor = self.invert(origin);
        let k = extent.clamp(self.k * factor.max(EPSILON));
        Self {
            k,
            tx: origin.x - anchor.x * k,
            ty: origin.y - anchor.y * k,
        }
    }

    pub fn centered_on(&self, model: Pos2, screen: Pos2) -> Self {
        Self {
            k: self.k,
            tx: screen.x - model.x * self.k,
            ty: screen.y - model.y * self.k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn apply_then_invert_round_trips() {
        let transforms = [
            ViewportTransform::IDENTITY,
            ViewportTransform::new(2.5, -40.0, 13.0),
            ViewportTransform::new(0.5, 300.0, 220.0),
        ];
        let points = [pos2(0.0, 0.0), pos2(-12.5, 88.0), pos2(400.0, -3.25)];
        for transform in transforms {
            for point in points {
                assert!(close(transform.invert(transform.apply(point)), point));
            }
        }
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let transform = ViewportTransform::new(1.0, 50.0, 50.0);
        let origin = pos2(120.0, 80.0);
        let anchor = transform.invert(origin);

        let zoomed = transform.zoomed_at(origin, 3.0, ScaleExtent::default());
        assert!((zoomed.k - 3.0).abs() < 1e-6);
        assert!(close(zoomed.apply(anchor), origin));

        let clamped = zoomed.zoomed_at(origin, 10.0, ScaleExtent::default());
        assert!((clamped.k - 4.0).abs() < 1e-6);
        assert!(close(clamped.apply(anchor), origin));

        let floor = transform.zoomed_at(origin, 0.01, ScaleExtent::default());
        assert!((floor.k - 0.5).abs() < 1e-6);
    }

    #[test]
    fn centered_on_moves_model_point_to_screen_point() {
        let transform = ViewportTransform::new(2.0, 0.0, 0.0);
        let moved = transform.centered_on(pos2(10.0, -5.0), pos2(400.0, 300.0));
        assert!(close(moved.apply(pos2(10.0, -5.0)), pos2(400.0, 300.0)));
        assert_eq!(moved.k, 2.0);
    }
}
