use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::util::Jiggle;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "value")]
    pub kind: EdgeKind,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Retweet,
    Mention,
    Reply,
    #[default]
    #[serde(other)]
    Other,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Retweet => "retweet",
            Self::Mention => "mention",
            Self::Reply => "reply",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
}

impl Node {
    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
}

impl Graph {
    /// Builds a graph from raw records. Duplicate node ids keep their first
    /// occurrence and edges with an unknown endpoint are dropped.
    ///
    /// Nodes already present in `previous` keep their position and velocity,
    /// nodes with coordinates in the record use them, the rest are placed on
    /// a phyllotaxis spiral around `center`.
    pub fn build(
        data: &GraphData,
        previous: Option<&Graph>,
        center: Vec2,
        initial_radius: f32,
        jiggle: &mut Jiggle,
    ) -> Self {
        let mut nodes = Vec::with_capacity(data.nodes.len());
        let mut index_by_id = HashMap::with_capacity(data.nodes.len());

        for record in &data.nodes {
            if index_by_id.contains_key(&record.id) {
                warn!(id = %record.id, "duplicate node id, keeping the first occurrence");
                continue;
            }

            let index = nodes.len();
            let carried = previous
                .and_then(|graph| graph.node_by_id(&record.id))
                .map(|node| (node.position, node.velocity));

            let (position, velocity) = match (carried, record.x, record.y) {
                (Some(state), _, _) => state,
                (None, Some(x), Some(y)) => (vec2(x, y), Vec2::ZERO),
                _ => (spiral_position(index, center, initial_radius), Vec2::ZERO),
            };

            index_by_id.insert(record.id.clone(), index);
            nodes.push(Node {
                id: record.id.clone(),
                position,
                velocity,
                pin: None,
            });
        }

        let mut edges = Vec::with_capacity(data.edges.len());
        let mut dropped = 0usize;
        for record in &data.edges {
            match (
                index_by_id.get(&record.source),
                index_by_id.get(&record.target),
            ) {
                (Some(&source), Some(&target)) => edges.push(Edge {
                    source,
                    target,
                    kind: record.kind,
                }),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped edges with unresolved endpoints");
        }

        let mut graph = Self {
            nodes,
            edges,
            index_by_id,
        };
        graph.separate_coincident(jiggle);
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            if edge.is_self_loop() {
                continue;
            }
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }
        degrees
    }

    fn separate_coincident(&mut self, jiggle: &mut Jiggle) {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &mut self.nodes {
            while !seen.insert((node.position.x.to_bits(), node.position.y.to_bits())) {
                node.position += vec2(jiggle.next_offset(0.02), jiggle.next_offset(0.02));
            }
        }
    }
}

fn spiral_position(index: usize, center: Vec2, initial_radius: f32) -> Vec2 {
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = initial_radius * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    center + vec2(angle.cos(), angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(nodes: &[&str], edges: &[(&str, &str)]) -> GraphData {
        GraphData {
            nodes: nodes.iter().map(|id| NodeRecord::new(*id)).collect(),
            edges: edges
                .iter()
                .map(|(s, t)| EdgeRecord::new(*s, *t, EdgeKind::Mention))
                .collect(),
        }
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let graph = Graph::build(
            &data(&["a", "b"], &[("a", "b"), ("a", "ghost"), ("nobody", "b")]),
            None,
            Vec2::ZERO,
            10.0,
            &mut Jiggle::default(),
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, 0);
        assert_eq!(graph.edges[0].target, 1);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let graph = Graph::build(
            &data(&["a", "b", "a"], &[]),
            None,
            Vec2::ZERO,
            10.0,
            &mut Jiggle::default(),
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.index_of("a"), Some(0));
    }

    #[test]
    fn coincident_positions_are_separated() {
        let mut records = data(&["a", "b", "c"], &[]);
        for record in &mut records.nodes {
            record.x = Some(5.0);
            record.y = Some(5.0);
        }
        let graph = Graph::build(&records, None, Vec2::ZERO, 10.0, &mut Jiggle::default());
        for i in 0..graph.len() {
            for j in (i + 1)..graph.len() {
                assert!(graph.nodes[i].position != graph.nodes[j].position);
                assert!((graph.nodes[i].position - graph.nodes[j].position).length() < 0.1);
            }
        }
    }

    #[test]
    fn previous_positions_are_carried_over() {
        let mut jiggle = Jiggle::default();
        let mut first = Graph::build(&data(&["a", "b"], &[]), None, Vec2::ZERO, 10.0, &mut jiggle);
        first.nodes[1].position = vec2(123.0, -45.0);

        let second = Graph::build(
            &data(&["c", "b"], &[("c", "b")]),
            Some(&first),
            Vec2::ZERO,
            10.0,
            &mut jiggle,
        );
        assert_eq!(second.node_by_id("b").map(|n| n.position), Some(vec2(123.0, -45.0)));
        assert!(second.nodes.iter().all(|n| n.pin.is_none()));
    }

    #[test]
    fn edge_kind_parses_unknown_values_as_other() {
        let record: EdgeRecord =
            serde_json::from_str(r#"{"source":"a","target":"b","value":"quote"}"#).unwrap();
        assert_eq!(record.kind, EdgeKind::Other);
        let record: EdgeRecord =
            serde_json::from_str(r#"{"source":"a","target":"b","value":"retweet"}"#).unwrap();
        assert_eq!(record.kind, EdgeKind::Retweet);
    }
}
