use eframe::egui::{Pos2, Vec2};

use crate::interaction::{InteractionConfig, InteractionController, PointerEvent};
use crate::simulation::{GraphData, Simulation, SimulationConfig};
use crate::viewport::ViewportTransform;

pub struct GraphSession {
    pub simulation: Simulation,
    pub viewport: ViewportTransform,
    pub controller: InteractionController,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub effects: usize,
    pub ticked: bool,
}

impl FrameOutcome {
    pub fn changed(&self) -> bool {
        self.ticked || self.effects > 0
    }
}

impl GraphSession {
    pub fn new(
        data: &GraphData,
        simulation: SimulationConfig,
        interaction: InteractionConfig,
        center: Vec2,
    ) -> Self {
        Self {
            simulation: Simulation::new(data, simulation, center),
            viewport: ViewportTransform::IDENTITY,
            controller: InteractionController::new(interaction),
        }
    }

    pub fn push(&mut self, event: PointerEvent) {
        self.controller.push(event);
    }

    /// Applies pending input, then advances the simulation by one tick if it
    /// is still warm.
    pub fn frame(&mut self) -> FrameOutcome {
        let effects = self
            .controller
            .flush(&mut self.simulation, &mut self.viewport);
        let ticked = self.simulation.step();
        FrameOutcome { effects, ticked }
    }

    pub fn wants_frames(&self) -> bool {
        self.simulation.is_running() || self.controller.has_pending()
    }

    pub fn replace_graph(&mut self, data: &GraphData) {
        self.controller.reset();
        self.simulation.replace_graph(data);
    }

    pub fn focus_query(&mut self, query: &str, canvas_center: Pos2) -> Option<usize> {
        self.controller
            .focus_query(query, &self.simulation, &mut self.viewport, canvas_center)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::simulation::{EdgeKind, EdgeRecord, NodeRecord};

    fn session() -> GraphSession {
        let mut data = GraphData {
            nodes: ["x", "y", "z"].into_iter().map(NodeRecord::new).collect(),
            edges: vec![
                EdgeRecord::new("x", "y", EdgeKind::Retweet),
                EdgeRecord::new("y", "z", EdgeKind::Retweet),
            ],
        };
        for (record, x) in data.nodes.iter_mut().zip([-30.0, 0.0, 30.0]) {
            record.x = Some(x);
            record.y = Some(0.0);
        }
        GraphSession::new(
            &data,
            SimulationConfig::default(),
            InteractionConfig::default(),
            Vec2::ZERO,
        )
    }

    #[test]
    fn drag_reheats_a_cold_simulation_and_cools_after_release() {
        let mut session = session();
        while session.frame().ticked {}
        assert!(!session.wants_frames());

        let start = session.viewport.apply(session.simulation.nodes()[0].position.to_pos2());
        session.push(PointerEvent::Down { position: start });
        session.push(PointerEvent::Move {
            position: start + vec2(0.0, 50.0),
        });
        let outcome = session.frame();
        assert!(outcome.ticked);
        assert!(outcome.effects >= 3);

        let pinned = session.simulation.nodes()[0].pin.expect("node is pinned");
        for _ in 0..500 {
            assert!(session.frame().ticked);
        }
        assert_eq!(session.simulation.nodes()[0].position, pinned);

        session.push(PointerEvent::Up {
            position: start + vec2(0.0, 50.0),
        });
        session.frame();
        assert!(session.simulation.nodes()[0].pin.is_none());

        let mut frames = 0;
        while session.frame().ticked {
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(session.simulation.state().is_cold());
    }

    #[test]
    fn wheel_zoom_does_not_move_nodes() {
        let mut session = session();
        while session.frame().ticked {}
        let before = session
            .simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();

        session.push(PointerEvent::Wheel {
            delta: -200.0,
            origin: pos2(10.0, 10.0),
        });
        let outcome = session.frame();
        assert_eq!(outcome.effects, 1);
        assert!(!outcome.ticked);
        assert!(session.viewport.k > 1.0);

        let after = session
            .simulation
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn replace_graph_cancels_drag() {
        let mut session = session();
        let start = session.viewport.apply(session.simulation.nodes()[1].position.to_pos2());
        session.push(PointerEvent::Down { position: start });
        session.frame();
        assert!(session.controller.dragged_node().is_some());

        session.replace_graph(&GraphData {
            nodes: vec![NodeRecord::new("y")],
            edges: Vec::new(),
        });
        assert!(session.controller.dragged_node().is_none());
        assert_eq!(session.simulation.nodes().len(), 1);
    }
}
