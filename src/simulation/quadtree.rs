use eframe::egui::{Vec2, vec2};
use serde::Serialize;

// Points this close after repeated halving are chained as if coincident.
const MAX_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Extent {
    pub(super) x0: f32,
    pub(super) y0: f32,
    pub(super) x1: f32,
    pub(super) y1: f32,
}

impl Extent {
    fn covering(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for point in rest {
            x0 = x0.min(point.x);
            y0 = y0.min(point.y);
            x1 = x1.max(point.x);
            y1 = y1.max(point.y);
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }

        let side = (x1 - x0).max(y1 - y0).max(1.0);
        Some(Self {
            x0,
            y0,
            x1: x0 + side,
            y1: y0 + side,
        })
    }

    pub(super) fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub(super) fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    pub(super) fn distance_sq(&self, point: Vec2) -> f32 {
        let dx = (self.x0 - point.x).max(point.x - self.x1).max(0.0);
        let dy = (self.y0 - point.y).max(point.y - self.y1).max(0.0);
        dx * dx + dy * dy
    }

    fn midpoint(&self) -> Vec2 {
        vec2((self.x0 + self.x1) * 0.5, (self.y0 + self.y1) * 0.5)
    }

    fn slot_for(&self, point: Vec2) -> usize {
        let mid = self.midpoint();
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    pub(super) fn child(&self, slot: usize) -> Self {
        let mid = self.midpoint();
        let (x0, x1) = if slot & 1 == 0 { (self.x0, mid.x) } else { (mid.x, self.x1) };
        let (y0, y1) = if slot & 2 == 0 { (self.y0, mid.y) } else { (mid.y, self.y1) };
        Self { x0, y0, x1, y1 }
    }
}

#[derive(Debug)]
pub(super) struct Leaf {
    pub(super) point: Vec2,
    pub(super) members: Vec<usize>,
}

#[derive(Debug)]
pub(super) struct Branch {
    pub(super) children: [Option<Box<Quad>>; 4],
    pub(super) mass: f32,
    pub(super) centroid: Vec2,
}

#[derive(Debug)]
pub(super) enum Quad {
    Leaf(Leaf),
    Branch(Branch),
}

impl Quad {
    fn mass(&self) -> f32 {
        match self {
            Self::Leaf(leaf) => leaf.members.len() as f32,
            Self::Branch(branch) => branch.mass,
        }
    }

    fn centroid(&self) -> Vec2 {
        match self {
            Self::Leaf(leaf) => leaf.point,
            Self::Branch(branch) => branch.centroid,
        }
    }

    fn empty_branch() -> Self {
        Self::Branch(Branch {
            children: [None, None, None, None],
            mass: 0.0,
            centroid: Vec2::ZERO,
        })
    }

    fn summarize(&mut self) {
        let Self::Branch(branch) = self else {
            return;
        };

        let mut mass = 0.0;
        let mut weighted = Vec2::ZERO;
        for child in branch.children.iter_mut().flatten() {
            child.summarize();
            let child_mass = child.mass();
            mass += child_mass;
            weighted += child.centroid() * child_mass;
        }
        branch.mass = mass;
        if mass > 0.0 {
            branch.centroid = weighted / mass;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct QuadtreeCell {
    pub center: [f32; 2],
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Point quadtree over node positions with coincident points chained in one
/// leaf, aggregated for Barnes-Hut.
#[derive(Debug)]
pub(super) struct Quadtree {
    pub(super) extent: Extent,
    pub(super) root: Quad,
}

impl Quadtree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let extent = Extent::covering(positions)?;
        let mut root = None;
        for (index, &point) in positions.iter().enumerate() {
            insert(
                &mut root,
                extent,
                Leaf {
                    point,
                    members: vec![index],
                },
                0,
            );
        }

        let mut root = root?;
        root.summarize();
        Some(Self { extent, root: *root })
    }

    pub(super) fn collect_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        collect_cells(&self.root, self.extent, 0, cells);
    }
}

fn insert(slot: &mut Option<Box<Quad>>, extent: Extent, leaf: Leaf, depth: usize) {
    let Some(quad) = slot else {
        *slot = Some(Box::new(Quad::Leaf(leaf)));
        return;
    };

    match quad.as_mut() {
        Quad::Branch(branch) => {
            let index = extent.slot_for(leaf.point);
            insert(&mut branch.children[index], extent.child(index), leaf, depth + 1);
        }
        Quad::Leaf(existing) if existing.point == leaf.point || depth >= MAX_DEPTH => {
            existing.members.extend(leaf.members);
        }
        Quad::Leaf(_) => {
            let Quad::Leaf(existing) = std::mem::replace(quad.as_mut(), Quad::empty_branch()) else {
                return;
            };
            let Quad::Branch(branch) = quad.as_mut() else {
                return;
            };
            let first = extent.slot_for(existing.point);
            insert(&mut branch.children[first], extent.child(first), existing, depth + 1);
            let second = extent.slot_for(leaf.point);
            insert(&mut branch.children[second], extent.child(second), leaf, depth + 1);
        }
    }
}

fn collect_cells(quad: &Quad, extent: Extent, depth: usize, cells: &mut Vec<QuadtreeCell>) {
    let center = extent.midpoint();
    cells.push(QuadtreeCell {
        center: [center.x, center.y],
        half_extent: extent.width() * 0.5,
        depth,
        is_leaf: matches!(quad, Quad::Leaf(_)),
    });

    if let Quad::Branch(branch) = quad {
        for (slot, child) in branch.children.iter().enumerate() {
            if let Some(child) = child {
                collect_cells(child, extent.child(slot), depth + 1, cells);
            }
        }
    }
}
