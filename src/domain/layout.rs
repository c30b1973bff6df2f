//! Layout: sizes children inside their parent and derives absolute placements.
//!
//! Widths and heights live on the [`Tower`] and are rewritten by [`LayoutEngine::layout`].
//! Positions are never stored; [`LayoutEngine::place`] recomputes them on demand.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::geometry::Geometry;
use crate::domain::palette::{Color, Palette, EMPTY_COLOR};
use crate::domain::tower::{NodePath, Tower};

/// Tolerance for floating point comparisons of accumulated widths.
const EPSILON: f64 = 1e-9;

/// A node with its absolute anchor. `left`/`bottom` are the lower-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub path: NodePath,
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    /// Nesting level below the placed root
    pub level: usize,
    pub color: Color,
    pub corner_radius: f64,
}

impl PlacedNode {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    geometry: Geometry,
}

impl LayoutEngine {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Sizes `tower` to `total_width` and recursively splits that width among its children.
    ///
    /// A leaf is painted with the empty-set color. Every other node takes the
    /// palette color of `depth`; its children share the width left after
    /// `n + 1` spacing gaps and are one floor ratio lower.
    #[instrument(level = "trace", skip(self, tower))]
    pub fn layout(&self, tower: &mut Tower, total_width: f64, depth: usize, palette: Palette) {
        tower.width = total_width;
        let n = tower.children.len();
        if n == 0 {
            tower.color = EMPTY_COLOR;
            return;
        }

        tower.color = palette.color_for_level(depth);
        let spacing = self.geometry.spacing_for(total_width, n);
        let share = (total_width - (n + 1) as f64 * spacing) / n as f64;
        let child_height = tower.height * self.geometry.floor_ratio;
        for child in &mut tower.children {
            child.height = child_height;
            self.layout(child, share, depth + 1, palette);
        }
    }

    /// Absolute placements of every node, pre-order, with the root's lower-left
    /// corner at (`left`, `bottom`). Children rest on their parent's top edge and
    /// are centered on it as a group.
    pub fn place(&self, tower: &Tower, left: f64, bottom: f64) -> Vec<PlacedNode> {
        let mut placed = Vec::with_capacity(tower.count_descendants());
        self.place_into(tower, Vec::new(), left, bottom, 0, &mut placed);
        debug!("placed {} nodes", placed.len());
        placed
    }

    /// Placements with the root centered on the stage and standing on the ground.
    pub fn place_on_stage(&self, tower: &Tower) -> Vec<PlacedNode> {
        self.place(tower, -tower.width / 2.0, self.geometry.ground_level)
    }

    fn place_into(
        &self,
        tower: &Tower,
        path: NodePath,
        left: f64,
        bottom: f64,
        level: usize,
        out: &mut Vec<PlacedNode>,
    ) {
        let offsets = self.child_offsets(tower);
        out.push(PlacedNode {
            path: path.clone(),
            left,
            bottom,
            width: tower.width,
            height: tower.height,
            level,
            color: tower.color,
            corner_radius: self.geometry.corner_radius_at(level),
        });
        for (index, (child, offset)) in tower.children.iter().zip(offsets).enumerate() {
            let mut child_path = path.clone();
            child_path.push(index);
            self.place_into(
                child,
                child_path,
                left + offset,
                bottom + tower.height,
                level + 1,
                out,
            );
        }
    }

    /// Left edge of every child relative to the parent's left edge.
    pub fn child_offsets(&self, tower: &Tower) -> Vec<f64> {
        let widths: Vec<f64> = tower.children.iter().map(|c| c.width).collect();
        self.offsets_for(tower.width, &widths)
    }

    fn offsets_for(&self, parent_width: f64, widths: &[f64]) -> Vec<f64> {
        let n = widths.len();
        if n == 0 {
            return Vec::new();
        }
        let spacing = self.geometry.spacing_for(parent_width, n);
        let group = widths.iter().sum::<f64>() + spacing * (n - 1) as f64;
        let mut x = (parent_width - group) / 2.0;
        widths
            .iter()
            .map(|w| {
                let offset = x;
                x += w + spacing;
                offset
            })
            .collect()
    }

    /// Horizontal shift that re-centers the children flagged in `kept` on the
    /// parent, starting from where they stand among all of `tower`'s children.
    ///
    /// Returns 0 when nothing is kept.
    pub fn recenter_shift(&self, tower: &Tower, kept: &[bool]) -> f64 {
        let offsets = self.child_offsets(tower);
        let spans: Vec<(f64, f64)> = tower
            .children
            .iter()
            .zip(offsets)
            .zip(kept)
            .filter(|(_, &keep)| keep)
            .map(|((child, offset), _)| (offset, offset + child.width))
            .collect();
        self.shift_to_center(tower.width, &spans)
    }

    /// Horizontal shift that centers the grandchildren of `tower` on it, as they
    /// stand before their parents are dissolved.
    pub fn lifted_shift(&self, tower: &Tower) -> f64 {
        let mut spans = Vec::new();
        for (child, offset) in tower.children.iter().zip(self.child_offsets(tower)) {
            for (grandchild, inner) in child.children.iter().zip(self.child_offsets(child)) {
                let left = offset + inner;
                spans.push((left, left + grandchild.width));
            }
        }
        self.shift_to_center(tower.width, &spans)
    }

    fn shift_to_center(&self, parent_width: f64, spans: &[(f64, f64)]) -> f64 {
        if spans.is_empty() {
            return 0.0;
        }
        let left = spans.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
        let right = spans.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max);
        parent_width / 2.0 - (left + right) / 2.0
    }

    /// Whether the children plus `n + 1` spacing gaps fit within the parent's width.
    pub fn contains_children(&self, tower: &Tower) -> bool {
        let n = tower.children.len();
        if n == 0 {
            return true;
        }
        let spacing = self.geometry.spacing_for(tower.width, n);
        let used = tower.children.iter().map(|c| c.width).sum::<f64>() + (n + 1) as f64 * spacing;
        used <= tower.width + EPSILON
    }
}
