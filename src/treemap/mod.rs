//! Stable squarified treemaps.
//!
//! The engine remembers the row structure chosen for every parent, keyed by
//! the parent's path below the root. Laying out another tree of the same
//! shape (the next keyword peak, for instance) reuses those rows so that
//! rectangles move instead of jumping around.

mod squarify;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use squarify::{RowLayout, resquarify, squarify};
pub use squarify::TileRect;

pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HierarchyNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl HierarchyNode {
    pub fn leaf(name: impl Into<String>, size: f64) -> Self {
        Self {
            name: name.into(),
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn parent(name: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        Self {
            name: name.into(),
            children,
            ..Self::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TreemapConfig {
    pub ratio: f64,
    pub padding_inner: f64,
    pub round: bool,
}

impl Default for TreemapConfig {
    fn default() -> Self {
        Self {
            ratio: GOLDEN_RATIO,
            padding_inner: 0.0,
            round: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LeafRect {
    pub key: String,
    pub name: String,
    pub value: f64,
    pub depth: usize,
    pub rect: TileRect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TreemapLayout {
    pub container: TileRect,
    pub leaves: Vec<LeafRect>,
    #[serde(skip)]
    pub reused_rows: usize,
    #[serde(skip)]
    pub fresh_rows: usize,
}

impl TreemapLayout {
    pub fn leaf_at(&self, x: f64, y: f64) -> Option<&LeafRect> {
        self.leaves.iter().find(|leaf| leaf.rect.contains(x, y))
    }

    pub fn leaf_by_key(&self, key: &str) -> Option<&LeafRect> {
        self.leaves.iter().find(|leaf| leaf.key == key)
    }
}

struct Weighted<'a> {
    source: &'a HierarchyNode,
    key: String,
    relative: String,
    value: f64,
    height: usize,
    children: Vec<Weighted<'a>>,
}

impl<'a> Weighted<'a> {
    fn build(source: &'a HierarchyNode, key: String, relative: String) -> Self {
        if source.is_leaf() {
            let value = source
                .size
                .filter(|size| size.is_finite() && *size > 0.0)
                .unwrap_or(0.0);
            return Self {
                source,
                key,
                relative,
                value,
                height: 0,
                children: Vec::new(),
            };
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut children = source
            .children
            .iter()
            .map(|child| {
                let occurrence = seen.entry(child.name.as_str()).or_insert(0);
                let segment = if *occurrence == 0 {
                    child.name.clone()
                } else {
                    format!("{}~{}", child.name, occurrence)
                };
                *occurrence += 1;
                Self::build(
                    child,
                    format!("{key}.{segment}"),
                    format!("{relative}/{segment}"),
                )
            })
            .collect::<Vec<_>>();

        // Stable: equal entries keep their input order.
        children.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| b.height.cmp(&a.height))
        });

        let value = children.iter().map(|child| child.value).sum();
        let height = children.iter().map(|child| child.height + 1).max().unwrap_or(0);
        Self {
            source,
            key,
            relative,
            value,
            height,
            children,
        }
    }

    fn is_empty(&self) -> bool {
        self.source.is_leaf() && self.source.size.is_none()
    }
}

#[derive(Debug, Default)]
pub struct TreemapEngine {
    config: TreemapConfig,
    memory: HashMap<String, RowLayout>,
}

impl TreemapEngine {
    pub fn new(config: TreemapConfig) -> Self {
        Self {
            config,
            memory: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TreemapConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.memory.clear();
    }

    pub fn layout(&mut self, root: &HierarchyNode, container: TileRect) -> TreemapLayout {
        let mut layout = TreemapLayout {
            container,
            ..TreemapLayout::default()
        };

        let weighted = Weighted::build(root, root.name.clone(), String::new());
        if weighted.is_empty() {
            return layout;
        }

        self.position(&weighted, container, 0.0, 0, &mut layout);
        debug!(
            root = %root.name,
            leaves = layout.leaves.len(),
            reused = layout.reused_rows,
            fresh = layout.fresh_rows,
            "treemap laid out"
        );
        layout
    }

    fn position(
        &mut self,
        node: &Weighted<'_>,
        rect: TileRect,
        padding: f64,
        depth: usize,
        layout: &mut TreemapLayout,
    ) {
        let rect = rect.inset(padding);

        if node.children.is_empty() {
            layout.leaves.push(LeafRect {
                key: node.key.clone(),
                name: node.source.name.clone(),
                value: node.value,
                depth,
                rect: if self.config.round { rect.rounded() } else { rect },
                summary: node.source.summary.clone(),
            });
            return;
        }

        // Children are tiled into the rect grown by half the gap, then each
        // shrinks by the same amount, so gaps only appear between siblings.
        let half = self.config.padding_inner.max(0.0) / 2.0;
        let inner = rect.inset(-half);

        let values = node.children.iter().map(|child| child.value).collect::<Vec<_>>();
        let tiles = self.tile(&node.relative, &values, inner, layout);
        for (child, tile) in node.children.iter().zip(tiles) {
            self.position(child, tile, half, depth + 1, layout);
        }
    }

    fn tile(
        &mut self,
        relative: &str,
        values: &[f64],
        rect: TileRect,
        layout: &mut TreemapLayout,
    ) -> Vec<TileRect> {
        let ratio = self.config.ratio.max(1.0);
        if let Some(rows) = self.memory.get(relative)
            && rows.fits(ratio, values.len())
        {
            layout.reused_rows += rows.rows.len();
            return resquarify(rows, values, rect);
        }

        let (tiles, rows) = squarify(ratio, values, rect);
        layout.fresh_rows += rows.rows.len();
        self.memory.insert(relative.to_string(), rows);
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(root: &str, sizes: &[(&str, f64)]) -> HierarchyNode {
        HierarchyNode::parent(
            root,
            sizes
                .iter()
                .map(|(name, size)| HierarchyNode::leaf(*name, *size))
                .collect(),
        )
    }

    fn overlap(a: &TileRect, b: &TileRect) -> f64 {
        let w = (a.x1.min(b.x1) - a.x0.max(b.x0)).max(0.0);
        let h = (a.y1.min(b.y1) - a.y0.max(b.y0)).max(0.0);
        w * h
    }

    #[test]
    fn leaves_partition_the_container() {
        let tree = HierarchyNode::parent(
            "tomaat",
            vec![
                peak("kas", &[("licht", 12.0), ("warmte", 7.0), ("co2", 3.0)]),
                HierarchyNode::leaf("oogst", 9.0),
                peak("prijs", &[("veiling", 5.0), ("export", 4.0)]),
            ],
        );
        let container = TileRect::from_size(640.0, 360.0);
        let layout = TreemapEngine::default().layout(&tree, container);

        assert_eq!(layout.leaves.len(), 6);
        let total: f64 = layout.leaves.iter().map(|leaf| leaf.value).sum();
        let area: f64 = layout.leaves.iter().map(|leaf| leaf.rect.area()).sum();
        assert!((area - container.area()).abs() < 1e-6);

        for (i, a) in layout.leaves.iter().enumerate() {
            let expected = container.area() * a.value / total;
            assert!((a.rect.area() - expected).abs() < 1e-6);
            assert!(a.rect.x0 >= 0.0 && a.rect.x1 <= 640.0 + 1e-9);
            assert!(a.rect.y0 >= 0.0 && a.rect.y1 <= 360.0 + 1e-9);
            for b in &layout.leaves[i + 1..] {
                assert!(overlap(&a.rect, &b.rect) < 1e-9, "{} overlaps {}", a.key, b.key);
            }
        }
    }

    #[test]
    fn two_leaves_split_with_one_cut() {
        let tree = peak("root", &[("a", 10.0), ("b", 30.0)]);
        let layout = TreemapEngine::default().layout(&tree, TileRect::from_size(100.0, 100.0));

        let a = layout.leaf_by_key("root.a").unwrap();
        let b = layout.leaf_by_key("root.b").unwrap();
        assert!((a.rect.area() / 100.0 - 25.0).abs() < 1e-9);
        assert!((b.rect.area() / 100.0 - 75.0).abs() < 1e-9);
        assert_eq!(b.rect.x1, a.rect.x0);
        assert_eq!((a.rect.y0, a.rect.y1), (0.0, 100.0));
        assert_eq!((b.rect.y0, b.rect.y1), (0.0, 100.0));
    }

    #[test]
    fn children_are_ordered_by_descending_value() {
        let tree = peak("root", &[("small", 1.0), ("large", 9.0), ("mid", 4.0)]);
        let layout = TreemapEngine::default().layout(&tree, TileRect::from_size(90.0, 60.0));
        let names = layout.leaves.iter().map(|leaf| leaf.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["large", "mid", "small"]);
    }

    #[test]
    fn zero_size_leaf_is_degenerate_not_an_error() {
        let tree = peak("root", &[("a", 4.0), ("nothing", 0.0)]);
        let layout = TreemapEngine::default().layout(&tree, TileRect::from_size(10.0, 10.0));
        let nothing = layout.leaf_by_key("root.nothing").unwrap();
        assert_eq!(nothing.rect.area(), 0.0);
        assert!(nothing.rect.x0.is_finite() && nothing.rect.y0.is_finite());
    }

    #[test]
    fn empty_tree_yields_no_rectangles() {
        let layout = TreemapEngine::default()
            .layout(&HierarchyNode::default(), TileRect::from_size(10.0, 10.0));
        assert!(layout.leaves.is_empty());

        let layout = TreemapEngine::default()
            .layout(&HierarchyNode::parent("root", Vec::new()), TileRect::from_size(10.0, 10.0));
        assert!(layout.leaves.is_empty());

        let layout = TreemapEngine::default()
            .layout(&HierarchyNode::leaf("alleen", 3.0), TileRect::from_size(10.0, 10.0));
        assert_eq!(layout.leaves.len(), 1);
        assert_eq!(layout.leaves[0].rect, TileRect::from_size(10.0, 10.0));
    }

    #[test]
    fn duplicate_sibling_names_get_unique_keys() {
        let tree = peak("root", &[("kas", 2.0), ("kas", 1.0), ("kas", 1.0)]);
        let layout = TreemapEngine::default().layout(&tree, TileRect::from_size(10.0, 10.0));
        let mut keys = layout.leaves.iter().map(|leaf| leaf.key.clone()).collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, ["root.kas", "root.kas~1", "root.kas~2"]);
    }

    #[test]
    fn next_peak_reuses_row_structure() {
        let mut engine = TreemapEngine::default();
        let container = TileRect::from_size(400.0, 300.0);
        let first = engine.layout(
            &peak("komkommer", &[("a", 8.0), ("b", 5.0), ("c", 4.0), ("d", 2.0)]),
            container,
        );
        assert_eq!(first.reused_rows, 0);
        assert!(first.fresh_rows > 0);

        let second = engine.layout(
            &peak("paprika", &[("w", 7.0), ("x", 6.0), ("y", 3.0), ("z", 3.0)]),
            container,
        );
        assert_eq!(second.fresh_rows, 0);
        assert_eq!(second.reused_rows, first.fresh_rows);
        let area: f64 = second.leaves.iter().map(|leaf| leaf.rect.area()).sum();
        assert!((area - container.area()).abs() < 1e-6);

        let third = engine.layout(&peak("sla", &[("p", 1.0), ("q", 1.0)]), container);
        assert_eq!(third.reused_rows, 0);
    }

    #[test]
    fn padding_and_rounding_follow_config() {
        let mut engine = TreemapEngine::new(TreemapConfig {
            padding_inner: 1.0,
            round: true,
            ..TreemapConfig::default()
        });
        let layout = engine.layout(
            &peak("root", &[("a", 1.0), ("b", 1.0)]),
            TileRect::from_size(101.0, 50.0),
        );
        let a = &layout.leaves[0].rect;
        let b = &layout.leaves[1].rect;
        assert_eq!(a.x0, 0.0);
        assert_eq!(b.x1, 101.0);
        assert_eq!(b.x0 - a.x1, 1.0);
        for rect in [a, b] {
            assert_eq!(rect.x0.fract(), 0.0);
            assert_eq!(rect.x1.fract(), 0.0);
        }
    }

    #[test]
    fn leaf_at_finds_summary() {
        let mut tree = peak("root", &[("a", 1.0), ("b", 3.0)]);
        tree.children[0].summary = Some("Een groente.".to_string());
        let layout = TreemapEngine::default().layout(&tree, TileRect::from_size(100.0, 100.0));
        let a = layout.leaf_by_key("root.a").unwrap().rect;
        let hit = layout.leaf_at((a.x0 + a.x1) / 2.0, (a.y0 + a.y1) / 2.0).unwrap();
        assert_eq!(hit.summary.as_deref(), Some("Een groente."));
        assert!(layout.leaf_at(-1.0, 5.0).is_none());
    }
}
