mod forces;
mod graph;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;
use tracing::debug;

use crate::util::Jiggle;
use forces::{LinkParams, ManyBodyParams, accumulate_many_body, apply_center, apply_links};
pub use graph::{Edge, EdgeKind, EdgeRecord, Graph, GraphData, Node, NodeRecord};
use quadtree::Quadtree;
pub use quadtree::QuadtreeCell;

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub link_distance: f32,
    pub charge_strength: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub theta: f32,
    pub center_strength: f32,
    pub warm_alpha_target: f32,
    pub initial_radius: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            link_distance: 30.0,
            charge_strength: -30.0,
            distance_min: 1.0,
            distance_max: 300.0,
            theta: 0.9,
            center_strength: 1.0,
            warm_alpha_target: 0.3,
            initial_radius: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SimulationState {
    pub alpha: f32,
    pub alpha_target: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl SimulationState {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
        }
    }

    fn cool(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
    }

    pub fn is_cold(&self) -> bool {
        self.alpha < self.alpha_min
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NodePosition<'a> {
    pub id: &'a str,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    degrees: Vec<usize>,
}

pub struct Simulation {
    graph: Graph,
    config: SimulationConfig,
    state: SimulationState,
    center: Vec2,
    running: bool,
    ticks: u64,
    jiggle: Jiggle,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(data: &GraphData, config: SimulationConfig, center: Vec2) -> Self {
        let mut jiggle = Jiggle::default();
        let graph = Graph::build(data, None, center, config.initial_radius, &mut jiggle);
        let mut simulation = Self {
            running: !graph.is_empty(),
            graph,
            state: SimulationState::new(&config),
            config,
            center,
            ticks: 0,
            jiggle,
            scratch: Scratch::default(),
        };
        simulation.refresh_degrees();
        debug!(
            nodes = simulation.graph.len(),
            edges = simulation.graph.edges.len(),
            "simulation created"
        );
        simulation
    }

    pub fn replace_graph(&mut self, data: &GraphData) {
        let graph = Graph::build(
            data,
            Some(&self.graph),
            self.center,
            self.config.initial_radius,
            &mut self.jiggle,
        );
        self.graph = graph;
        self.refresh_degrees();
        self.state = SimulationState::new(&self.config);
        self.running = !self.graph.is_empty();
    }

    fn refresh_degrees(&mut self) {
        self.scratch.degrees = self.graph.degrees();
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.graph.index_of(id)
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec2) {
        if (self.center - center).length_sq() > f32::EPSILON {
            self.center = center;
            self.restart();
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn restart(&mut self) {
        if !self.graph.is_empty() && !self.running {
            debug!(alpha = self.state.alpha, "simulation restarted");
        }
        self.running = !self.graph.is_empty();
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
        self.restart();
    }

    // Pin changes on a cold simulation reheat it to the drag level.
    fn wake(&mut self) {
        if self.state.is_cold() {
            self.state.alpha = self.state.alpha.max(self.config.warm_alpha_target);
        }
        self.restart();
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.state.alpha_target = target.clamp(0.0, 1.0);
        self.restart();
    }

    pub fn pin(&mut self, index: usize, at: Vec2) {
        if !(at.x.is_finite() && at.y.is_finite()) {
            return;
        }
        if let Some(node) = self.graph.nodes.get_mut(index) {
            node.pin = Some(at);
            self.wake();
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(node) = self.graph.nodes.get_mut(index) {
            node.pin = None;
            self.wake();
        }
    }

    /// Advances one frame if the simulation is warm. Returns whether a tick
    /// ran.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.tick();
        if self.state.is_cold() {
            self.running = false;
            debug!(ticks = self.ticks, "simulation quiesced");
        }
        true
    }

    pub fn run_to_quiescence(&mut self, max_ticks: usize) -> usize {
        let mut count = 0;
        while count < max_ticks && self.step() {
            count += 1;
        }
        count
    }

    pub fn tick(&mut self) {
        if self.graph.is_empty() {
            return;
        }

        self.state.cool();
        let alpha = self.state.alpha;
        self.ticks += 1;

        apply_links(
            &mut self.graph.nodes,
            &self.graph.edges,
            &self.scratch.degrees,
            LinkParams {
                distance: self.config.link_distance,
                alpha,
            },
            &mut self.jiggle,
        );

        self.apply_many_body(alpha);
        apply_center(
            &mut self.graph.nodes,
            self.center,
            self.config.center_strength,
        );

        let retain = 1.0 - self.config.velocity_decay.clamp(0.0, 1.0);
        for node in &mut self.graph.nodes {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            node.velocity *= retain;
            if !(node.velocity.x.is_finite() && node.velocity.y.is_finite()) {
                node.velocity = Vec2::ZERO;
            }
            node.position += node.velocity;
        }
    }

    fn apply_many_body(&mut self, alpha: f32) {
        let node_count = self.graph.len();
        if node_count < 2 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.graph.nodes.iter().map(|node| node.position));
        scratch.velocities.clear();
        scratch.velocities.resize(node_count, Vec2::ZERO);

        let Some(tree) = Quadtree::build(&scratch.positions) else {
            return;
        };

        let distance_min = self.config.distance_min.max(0.0);
        let distance_max = self.config.distance_max.max(distance_min);
        let params = ManyBodyParams {
            strength: self.config.charge_strength,
            distance_min_sq: distance_min * distance_min,
            distance_max_sq: distance_max * distance_max,
            theta_sq: self.config.theta * self.config.theta,
            alpha,
        };

        for (index, velocity) in scratch.velocities.iter_mut().enumerate() {
            accumulate_many_body(
                &tree,
                index,
                &scratch.positions,
                params,
                &mut self.jiggle,
                velocity,
            );
        }

        for (node, change) in self.graph.nodes.iter_mut().zip(&scratch.velocities) {
            node.velocity += *change;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = NodePosition<'_>> {
        self.graph.nodes.iter().map(|node| NodePosition {
            id: node.id.as_str(),
            x: node.position.x,
            y: node.position.y,
            pinned: node.is_pinned(),
        })
    }

    pub fn nearest_node(&self, point: Vec2, radius: f32) -> Option<usize> {
        let radius_sq = radius * radius;
        self.graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let distance_sq = (node.position - point).length_sq();
                (distance_sq <= radius_sq).then_some((index, distance_sq))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub fn find_node(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(index) = self.graph.index_of(query) {
            return Some(index);
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        self.graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                matcher
                    .fuzzy_match(&node.id, query)
                    .map(|score| (index, score))
            })
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(index, _)| index)
    }

    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .graph
            .nodes
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        if let Some(tree) = Quadtree::build(&positions) {
            tree.collect_cells(cells);
        }
    }

    pub fn max_speed(&self) -> f32 {
        self.graph
            .nodes
            .iter()
            .map(|node| node.velocity.length())
            .fold(0.0, f32::max)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(&GraphData::default(), SimulationConfig::default(), vec2(0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> GraphData {
        GraphData {
            nodes: ["A", "B", "C"].into_iter().map(NodeRecord::new).collect(),
            edges: vec![
                EdgeRecord::new("A", "B", EdgeKind::Retweet),
                EdgeRecord::new("B", "C", EdgeKind::Mention),
            ],
        }
    }

    fn distance(simulation: &Simulation, a: &str, b: &str) -> f32 {
        let a = simulation.graph().node_by_id(a).unwrap().position;
        let b = simulation.graph().node_by_id(b).unwrap().position;
        (a - b).length()
    }

    #[test]
    fn empty_graph_never_ticks() {
        let mut simulation = Simulation::default();
        assert!(!simulation.is_running());
        assert!(!simulation.step());
        simulation.set_alpha_target(0.3);
        assert!(!simulation.step());
        assert_eq!(simulation.ticks(), 0);
    }

    #[test]
    fn alpha_decreases_monotonically_until_idle() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        let mut previous = simulation.state().alpha;
        let mut ticks = 0;
        while simulation.step() {
            let alpha = simulation.state().alpha;
            assert!(alpha < previous);
            previous = alpha;
            ticks += 1;
            assert!(ticks <= 400, "simulation did not cool down");
        }
        assert!(simulation.state().is_cold());
        assert!(!simulation.is_running());
        assert!(simulation.max_speed() < 0.5);
    }

    #[test]
    fn chain_settles_near_link_distance() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.run_to_quiescence(1000);

        let ab = distance(&simulation, "A", "B");
        let bc = distance(&simulation, "B", "C");
        let ac = distance(&simulation, "A", "C");
        let target = simulation.config().link_distance;
        assert!((ab - target).abs() < target * 0.5, "ab = {ab}");
        assert!((bc - target).abs() < target * 0.5, "bc = {bc}");
        assert!(ac > ab && ac > bc, "ac = {ac}, ab = {ab}, bc = {bc}");
    }

    #[test]
    fn pin_then_unpin_without_tick_keeps_position() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.run_to_quiescence(50);
        let before = simulation.nodes()[1].position;

        simulation.pin(1, vec2(500.0, 500.0));
        simulation.unpin(1);

        assert_eq!(simulation.nodes()[1].position, before);
        assert!(!simulation.nodes()[1].is_pinned());
    }

    #[test]
    fn pinned_node_holds_pin_and_reheats() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.run_to_quiescence(1000);
        assert!(!simulation.is_running());

        simulation.pin(0, vec2(40.0, -20.0));
        assert!(simulation.is_running());
        simulation.set_alpha_target(0.3);
        for _ in 0..20 {
            simulation.step();
        }
        assert_eq!(simulation.nodes()[0].position, vec2(40.0, -20.0));
        assert_eq!(simulation.nodes()[0].velocity, Vec2::ZERO);
        assert!(simulation.state().alpha > 0.05);
        assert!(simulation.is_running());
    }

    #[test]
    fn pinning_a_settled_graph_moves_its_neighbours() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.run_to_quiescence(1000);
        assert!(!simulation.is_running());
        let a = simulation.nodes()[0].position;
        let b_before = simulation.nodes()[1].position;

        simulation.pin(0, a + vec2(80.0, 0.0));
        assert!(simulation.state().alpha >= simulation.config().warm_alpha_target);
        let ticks = simulation.run_to_quiescence(50);
        assert!(ticks > 1, "only {ticks} tick ran");
        assert!((simulation.nodes()[1].position - b_before).length() > 1.0);

        simulation.run_to_quiescence(1000);
        simulation.unpin(0);
        assert!(simulation.is_running());
        assert!(simulation.run_to_quiescence(50) > 1);
    }

    #[test]
    fn warm_target_keeps_ticking() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.set_alpha_target(0.3);
        for _ in 0..2000 {
            assert!(simulation.step());
        }
        simulation.set_alpha_target(0.0);
        assert!(simulation.run_to_quiescence(2000) < 2000);
        assert!(!simulation.is_running());
    }

    #[test]
    fn nearest_node_prefers_closest_within_radius() {
        let mut data = chain();
        for (record, x) in data.nodes.iter_mut().zip([0.0, 10.0, 100.0]) {
            record.x = Some(x);
            record.y = Some(0.0);
        }
        let simulation = Simulation::new(&data, SimulationConfig::default(), Vec2::ZERO);
        assert_eq!(simulation.nearest_node(vec2(6.0, 0.0), 8.0), Some(1));
        assert_eq!(simulation.nearest_node(vec2(50.0, 0.0), 8.0), None);
    }

    #[test]
    fn find_node_uses_fuzzy_match() {
        let data = GraphData {
            nodes: ["tomatenkweker", "komkommer", "paprika_nl"]
                .into_iter()
                .map(NodeRecord::new)
                .collect(),
            edges: Vec::new(),
        };
        let simulation = Simulation::new(&data, SimulationConfig::default(), Vec2::ZERO);
        assert_eq!(simulation.find_node("paprika_nl"), Some(2));
        assert_eq!(simulation.find_node("kmkmr"), Some(1));
        assert_eq!(simulation.find_node("   "), None);
    }

    #[test]
    fn replace_graph_keeps_surviving_positions() {
        let mut simulation = Simulation::new(&chain(), SimulationConfig::default(), Vec2::ZERO);
        simulation.run_to_quiescence(1000);
        let b_before = simulation.graph().node_by_id("B").unwrap().position;
        simulation.pin(0, vec2(1.0, 1.0));

        let next = GraphData {
            nodes: ["B", "D"].into_iter().map(NodeRecord::new).collect(),
            edges: vec![EdgeRecord::new("B", "D", EdgeKind::Reply)],
        };
        simulation.replace_graph(&next);
        assert_eq!(simulation.graph().node_by_id("B").unwrap().position, b_before);
        assert!(simulation.nodes().iter().all(|node| !node.is_pinned()));
        assert!(simulation.is_running());
        assert_eq!(simulation.state().alpha, 1.0);
    }
}
