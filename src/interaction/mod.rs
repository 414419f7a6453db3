mod gesture;

use std::collections::VecDeque;

use eframe::egui::Pos2;
use tracing::debug;

pub use gesture::{Effect, Gesture, GestureContext, Hit, PointerEvent, transition};

use crate::simulation::Simulation;
use crate::viewport::{ScaleExtent, ViewportTransform};

#[derive(Clone, Copy, Debug)]
pub struct InteractionConfig {
    pub hit_radius: f32,
    pub scale_extent: ScaleExtent,
    pub wheel_sensitivity: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_radius: 8.0,
            scale_extent: ScaleExtent::default(),
            wheel_sensitivity: 0.002,
        }
    }
}

/// Buffers pointer events between frames and applies them in order before
/// the next tick. Only pin fields, alpha target and the viewport are written.
#[derive(Debug, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    gesture: Gesture,
    pending: VecDeque<PointerEvent>,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            pending: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn dragged_node(&self) -> Option<usize> {
        match self.gesture {
            Gesture::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn push(&mut self, event: PointerEvent) {
        self.pending.push_back(event);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn flush(&mut self, simulation: &mut Simulation, viewport: &mut ViewportTransform) -> usize {
        let mut applied = 0;
        while let Some(event) = self.pending.pop_front() {
            let hit = match event {
                PointerEvent::Down { position } => self.hit_test(simulation, viewport, position),
                _ => None,
            };
            let ctx = GestureContext {
                config: &self.config,
                transform: *viewport,
                alpha_target: simulation.state().alpha_target,
                warm_alpha_target: simulation.config().warm_alpha_target,
                hit,
            };

            let (next, effects) = transition(self.gesture, event, &ctx);
            if next != self.gesture {
                debug!(from = ?self.gesture, to = ?next, "gesture changed");
            }
            self.gesture = next;

            applied += effects.len();
            for effect in effects {
                apply_effect(effect, simulation, viewport);
            }
        }
        applied
    }

    pub fn hit_test(
        &self,
        simulation: &Simulation,
        viewport: &ViewportTransform,
        screen: Pos2,
    ) -> Option<Hit> {
        let model = viewport.invert(screen).to_vec2();
        let node = simulation.nearest_node(model, self.config.hit_radius)?;
        simulation.nodes().get(node).map(|found| Hit {
            node,
            position: found.position,
        })
    }

    pub fn focus(
        &self,
        node: usize,
        simulation: &Simulation,
        viewport: &mut ViewportTransform,
        canvas_center: Pos2,
    ) -> bool {
        let Some(found) = simulation.nodes().get(node) else {
            return false;
        };
        viewport.set(viewport.centered_on(found.position.to_pos2(), canvas_center));
        true
    }

    pub fn focus_query(
        &self,
        query: &str,
        simulation: &Simulation,
        viewport: &mut ViewportTransform,
        canvas_center: Pos2,
    ) -> Option<usize> {
        let node = simulation.find_node(query)?;
        self.focus(node, simulation, viewport, canvas_center)
            .then_some(node)
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.gesture = Gesture::Idle;
    }
}

fn apply_effect(effect: Effect, simulation: &mut Simulation, viewport: &mut ViewportTransform) {
    match effect {
        Effect::Pin { node, at } => simulation.pin(node, at),
        Effect::Unpin { node } => simulation.unpin(node),
        Effect::SetAlphaTarget(target) => simulation.set_alpha_target(target),
        Effect::Restart => simulation.restart(),
        Effect::SetTransform(next) => viewport.set(next),
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Vec2, pos2, vec2};

    use super::*;
    use crate::simulation::{EdgeKind, EdgeRecord, GraphData, NodeRecord, SimulationConfig};

    fn simulation() -> Simulation {
        let mut data = GraphData {
            nodes: ["a", "b"].into_iter().map(NodeRecord::new).collect(),
            edges: vec![EdgeRecord::new("a", "b", EdgeKind::Reply)],
        };
        for (record, x) in data.nodes.iter_mut().zip([0.0, 40.0]) {
            record.x = Some(x);
            record.y = Some(0.0);
        }
        Simulation::new(&data, SimulationConfig::default(), Vec2::ZERO)
    }

    #[test]
    fn drag_pins_node_under_pointer_and_releases_it() {
        let mut simulation = simulation();
        let mut viewport = ViewportTransform::new(2.0, 100.0, 100.0);
        let mut controller = InteractionController::default();

        controller.push(PointerEvent::Down {
            position: pos2(182.0, 100.0),
        });
        controller.push(PointerEvent::Move {
            position: pos2(182.0, 140.0),
        });
        controller.flush(&mut simulation, &mut viewport);

        assert_eq!(controller.dragged_node(), Some(1));
        assert_eq!(simulation.nodes()[1].pin, Some(vec2(40.0, 20.0)));
        assert_eq!(simulation.state().alpha_target, 0.3);
        assert_eq!(viewport, ViewportTransform::new(2.0, 100.0, 100.0));

        controller.push(PointerEvent::Leave);
        controller.flush(&mut simulation, &mut viewport);
        assert_eq!(controller.gesture(), Gesture::Idle);
        assert!(simulation.nodes()[1].pin.is_none());
        assert_eq!(simulation.state().alpha_target, 0.0);
    }

    #[test]
    fn hit_test_uses_current_positions() {
        let mut simulation = simulation();
        let viewport = ViewportTransform::IDENTITY;
        let controller = InteractionController::default();
        assert_eq!(
            controller
                .hit_test(&simulation, &viewport, pos2(40.0, 0.0))
                .map(|hit| hit.node),
            Some(1)
        );

        simulation.pin(1, vec2(200.0, 200.0));
        simulation.tick();
        assert!(controller.hit_test(&simulation, &viewport, pos2(40.0, 0.0)).is_none());
        assert_eq!(
            controller
                .hit_test(&simulation, &viewport, pos2(203.0, 198.0))
                .map(|hit| hit.node),
            Some(1)
        );
    }

    #[test]
    fn missed_pointer_down_pans_without_touching_nodes() {
        let mut simulation = simulation();
        let before = simulation.nodes()[0].position;
        let mut viewport = ViewportTransform::IDENTITY;
        let mut controller = InteractionController::default();

        controller.push(PointerEvent::Down {
            position: pos2(500.0, 500.0),
        });
        controller.push(PointerEvent::Move {
            position: pos2(520.0, 490.0),
        });
        controller.push(PointerEvent::Up {
            position: pos2(520.0, 490.0),
        });
        controller.flush(&mut simulation, &mut viewport);

        assert_eq!(viewport, ViewportTransform::new(1.0, 20.0, -10.0));
        assert_eq!(simulation.nodes()[0].position, before);
        assert!(simulation.nodes().iter().all(|node| node.pin.is_none()));
        assert_eq!(controller.gesture(), Gesture::Idle);
    }

    #[test]
    fn focus_query_centers_matching_node() {
        let simulation = simulation();
        let mut viewport = ViewportTransform::new(3.0, 0.0, 0.0);
        let controller = InteractionController::default();

        let center = pos2(400.0, 300.0);
        assert_eq!(
            controller.focus_query("b", &simulation, &mut viewport, center),
            Some(1)
        );
        let screen = viewport.apply(simulation.nodes()[1].position.to_pos2());
        assert!((screen - center).length() < 1e-3);
        assert_eq!(viewport.k, 3.0);
        assert_eq!(
            controller.focus_query("zzz", &simulation, &mut viewport, center),
            None
        );
    }
}
