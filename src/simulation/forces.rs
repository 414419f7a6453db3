use eframe::egui::{Vec2, vec2};

use super::graph::{Edge, Node};
use super::quadtree::{Extent, Quad, Quadtree};
use crate::util::{EPSILON, Jiggle};

const JIGGLE_SCALE: f32 = 1e-3;

#[derive(Clone, Copy)]
pub(super) struct ManyBodyParams {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta_sq: f32,
    pub(super) alpha: f32,
}

fn separate(delta: Vec2, jiggle: &mut Jiggle) -> Vec2 {
    if delta.length_sq() > EPSILON * EPSILON {
        delta
    } else {
        vec2(jiggle.next_offset(JIGGLE_SCALE), jiggle.next_offset(JIGGLE_SCALE))
    }
}

fn pair_velocity(delta: Vec2, weight: f32, params: ManyBodyParams) -> Option<Vec2> {
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return None;
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    Some(delta * (params.strength * weight * params.alpha / distance_sq.max(EPSILON)))
}

pub(super) fn accumulate_many_body(
    tree: &Quadtree,
    index: usize,
    positions: &[Vec2],
    params: ManyBodyParams,
    jiggle: &mut Jiggle,
    velocity: &mut Vec2,
) {
    visit(&tree.root, tree.extent, index, positions[index], params, jiggle, velocity);
}

fn visit(
    quad: &Quad,
    extent: Extent,
    index: usize,
    point: Vec2,
    params: ManyBodyParams,
    jiggle: &mut Jiggle,
    velocity: &mut Vec2,
) {
    // Nothing inside a cell whose nearest edge is past distance_max can act.
    if extent.distance_sq(point) >= params.distance_max_sq {
        return;
    }

    match quad {
        Quad::Leaf(leaf) => {
            let others = leaf.members.iter().filter(|&&member| member != index).count();
            if others == 0 {
                return;
            }
            let delta = separate(leaf.point - point, jiggle);
            if let Some(change) = pair_velocity(delta, others as f32, params) {
                *velocity += change;
            }
        }
        Quad::Branch(branch) => {
            let delta = branch.centroid - point;
            let width = extent.width();
            if width * width < params.theta_sq * delta.length_sq() && !extent.contains(point) {
                if let Some(change) = pair_velocity(delta, branch.mass, params) {
                    *velocity += change;
                }
                return;
            }

            for (slot, child) in branch.children.iter().enumerate() {
                if let Some(child) = child {
                    visit(child, extent.child(slot), index, point, params, jiggle, velocity);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) alpha: f32,
}

/// Spring pulling each edge's endpoints toward `distance`, using predicted
/// positions. The degree bias makes well-connected nodes move less.
pub(super) fn apply_links(
    nodes: &mut [Node],
    edges: &[Edge],
    degrees: &[usize],
    params: LinkParams,
    jiggle: &mut Jiggle,
) {
    for edge in edges {
        if edge.is_self_loop() {
            continue;
        }
        let (source, target) = (edge.source, edge.target);
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let strength = 1.0 / source_degree.min(target_degree);
        let bias = source_degree / (source_degree + target_degree);

        let source_next = nodes[source].position + nodes[source].velocity;
        let target_next = nodes[target].position + nodes[target].velocity;
        let delta = separate(target_next - source_next, jiggle);
        let length = delta.length().max(EPSILON);
        let stretch = (length - params.distance) / length * params.alpha * strength;
        let correction = delta * stretch;

        nodes[target].velocity -= correction * bias;
        nodes[source].velocity += correction * (1.0 - bias);
    }
}

pub(super) fn apply_center(nodes: &mut [Node], center: Vec2, strength: f32) {
    if nodes.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for node in nodes.iter() {
        centroid += node.position;
    }
    centroid /= nodes.len() as f32;

    let shift = (centroid - center) * strength;
    if shift.length_sq() <= EPSILON * EPSILON {
        return;
    }
    for node in nodes.iter_mut() {
        node.position -= shift;
    }
}
