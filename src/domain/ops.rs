//! Structural tree operations.
//!
//! Every operation edits the tree in place (or assembles a new one) and returns
//! an [`OpPlan`] describing the sub-steps in the order they are to be shown.
//! Irregular arguments degrade to a no-op with an empty plan and an untouched tree.

use itertools::Itertools;
use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::geometry::Geometry;
use crate::domain::layout::LayoutEngine;
use crate::domain::palette::{Palette, BASE_COLOR, EMPTY_COLOR};
use crate::domain::plan::{child_path, Addressing, MergeOrder, OpKind, OpPlan, Segment, Step};
use crate::domain::tower::{max_depth, span_width, NodePath, Tower};

/// Probability that `resize` stretches a child's height rather than narrowing it.
const HEIGHT_CHANGE_PROBABILITY: f64 = 0.8;
/// Width factor for children that are narrowed by `resize`.
const NARROW_FACTOR: f64 = 0.6;
/// Height of the inner base built by `successive`, relative to the outer one.
const INNER_BASE_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOps {
    layout: LayoutEngine,
    palette: Palette,
}

impl TreeOps {
    pub fn new(geometry: Geometry, palette: Palette) -> Self {
        Self {
            layout: LayoutEngine::new(geometry),
            palette,
        }
    }

    fn geometry(&self) -> &Geometry {
        self.layout.geometry()
    }

    /// Builds the tower bottom-up: every subtree is raised before its parent
    /// merges its children onto itself, rightmost child first.
    ///
    /// The structure is left unchanged.
    #[instrument(level = "debug", skip_all)]
    pub fn raise_tower(&self, tower: &Tower) -> OpPlan {
        let mut plan = OpPlan::new(OpKind::Raise, Addressing::Result);
        self.raise_into(tower, Vec::new(), &mut plan);
        debug!("raise: {} segments", plan.segments.len());
        plan
    }

    fn raise_into(&self, tower: &Tower, path: NodePath, plan: &mut OpPlan) {
        if tower.is_leaf() {
            let mut segment = Segment::new(path.clone());
            segment.enter.push(Step::Ground { path });
            plan.push(segment);
            return;
        }
        for (index, child) in tower.children.iter().enumerate() {
            self.raise_into(child, child_path(&path, index), plan);
        }
        plan.push(self.merge_segment(tower, path, MergeOrder::Reverse));
    }

    fn merge_segment(&self, base: &Tower, path: NodePath, order: MergeOrder) -> Segment {
        let mut segment = Segment::new(path.clone());
        if base.is_leaf() {
            return segment;
        }
        segment.enter.push(Step::BaseEnter {
            base: path.clone(),
            order,
        });
        for index in order.indices(base.fanout()) {
            let child = &base.children[index];
            segment.per_child.push(Step::Merge {
                base: path.clone(),
                child: child_path(&path, index),
                depth: child.depth(),
                fanout: child.fanout(),
                sound_level: child.depth(),
                order,
            });
        }
        segment.settle.push(Step::CenterBase { base: path });
        segment
    }

    /// Stands `children` on `base` in the given order and centers the base under them.
    pub fn merge_under_base(
        &self,
        children: Vec<Tower>,
        base: Tower,
        order: MergeOrder,
    ) -> (Tower, OpPlan) {
        if children.is_empty() {
            return (base, OpPlan::empty(OpKind::MergeUnderBase));
        }
        let tower = base.with_children(children);
        let mut plan = OpPlan::new(OpKind::MergeUnderBase, Addressing::Result);
        plan.push(self.merge_segment(&tower, Vec::new(), order));
        (tower, plan)
    }

    /// Builds a container base spanning `towers` and merges them onto it.
    ///
    /// Without an explicit `height` the container is one floor ratio lower per
    /// level of the deepest tower.
    #[instrument(level = "debug", skip(self, towers))]
    pub fn raise_towers(&self, towers: Vec<Tower>, height: Option<f64>) -> (Tower, OpPlan) {
        let geometry = self.geometry();
        let level = max_depth(&towers);
        let width = span_width(&towers, geometry.spacing) + 2.0 * geometry.spacing;
        let height =
            height.unwrap_or(geometry.base_height * geometry.floor_ratio.powi(level as i32));
        let container = Tower::new(width, height).with_color(self.palette.color_for_level(level));

        let (tower, mut plan) = self.merge_under_base(towers, container, MergeOrder::Reverse);
        plan.op = OpKind::RaiseTowers;
        // Every tower sounds the container's level
        for step in plan
            .segments
            .iter_mut()
            .flat_map(|segment| segment.per_child.iter_mut())
        {
            if let Step::Merge { sound_level, .. } = step {
                *sound_level = level;
            }
        }
        (tower, plan)
    }

    /// Replaces every child by its own children, flattening one level.
    #[instrument(level = "debug", skip_all)]
    pub fn union(&self, tower: &mut Tower) -> OpPlan {
        if tower.is_leaf() {
            return OpPlan::empty(OpKind::Union);
        }

        let dx = self.layout.lifted_shift(tower);
        let mut segment = Segment::new(Vec::new());
        for index in 0..tower.fanout() {
            segment.enter.push(Step::Highlight { path: vec![index] });
        }
        segment.enter.push(Step::Pause);

        for (index, child) in tower.children.iter().enumerate() {
            segment.per_child.push(Step::Dissolve { path: vec![index] });
            for (inner, grandchild) in child.children.iter().enumerate() {
                segment.per_child.push(Step::Drop {
                    path: vec![index, inner],
                    dy: -child.height,
                    depth: grandchild.depth(),
                });
            }
        }

        let lifted: Vec<Tower> = std::mem::take(&mut tower.children)
            .into_iter()
            .flat_map(|child| child.children)
            .collect();
        if lifted.is_empty() {
            tower.color = EMPTY_COLOR;
        } else {
            segment.settle.push(Step::Recenter {
                path: Vec::new(),
                dx,
            });
        }
        debug!("union: {} children lifted", lifted.len());
        tower.children = lifted;

        let mut plan = OpPlan::new(OpKind::Union, Addressing::Source);
        plan.push(segment);
        plan
    }

    /// Removes every direct child structurally equal to an earlier sibling.
    #[instrument(level = "debug", skip_all)]
    pub fn remove_duplicate_subtowers(&self, tower: &mut Tower) -> OpPlan {
        let mut plan = OpPlan::new(OpKind::RemoveDuplicates, Addressing::Source);
        plan.push(self.dedup_segment(tower, Vec::new()));
        plan
    }

    /// Removes duplicates at every level, deepest nodes first.
    #[instrument(level = "debug", skip_all)]
    pub fn remove_duplicate_subtowers_recursively(&self, tower: &mut Tower) -> OpPlan {
        let mut plan = OpPlan::new(OpKind::RemoveDuplicatesRecursive, Addressing::Source);
        self.dedup_into(tower, Vec::new(), &mut plan);
        plan
    }

    fn dedup_into(&self, tower: &mut Tower, path: NodePath, plan: &mut OpPlan) {
        for (index, child) in tower.children.iter_mut().enumerate() {
            self.dedup_into(child, child_path(&path, index), plan);
        }
        plan.push(self.dedup_segment(tower, path));
    }

    fn dedup_segment(&self, tower: &mut Tower, path: NodePath) -> Segment {
        let n = tower.fanout();
        let mut removed = vec![false; n];
        let mut segment = Segment::new(path.clone());

        for (i, j) in (0..n).tuple_combinations() {
            if removed[i] || removed[j] {
                continue;
            }
            if tower.children[i] == tower.children[j] {
                removed[j] = true;
                segment.per_child.push(Step::Match {
                    keep: child_path(&path, i),
                    remove: child_path(&path, j),
                });
            }
        }

        if removed.iter().any(|&r| r) {
            let kept: Vec<bool> = removed.iter().map(|&r| !r).collect();
            let dx = self.layout.recenter_shift(tower, &kept);
            debug!(?path, removed = removed.iter().filter(|&&r| r).count(), "dedup");
            self.retain_children(tower, &kept);
            segment.settle.push(Step::Recenter { path, dx });
        }
        segment
    }

    /// Rebuilds the children sequence keeping the flagged ones.
    fn retain_children(&self, tower: &mut Tower, kept: &[bool]) {
        tower.children = std::mem::take(&mut tower.children)
            .into_iter()
            .zip(kept)
            .filter_map(|(child, &keep)| keep.then_some(child))
            .collect();
        if tower.is_leaf() {
            tower.color = EMPTY_COLOR;
        }
    }

    /// Swaps children `i` and `j`. Out of range or equal indices are a no-op.
    #[instrument(level = "debug", skip(self, tower))]
    pub fn swap_subtowers(&self, tower: &mut Tower, i: usize, j: usize) -> OpPlan {
        let n = tower.fanout();
        if i == j || i >= n || j >= n {
            return OpPlan::empty(OpKind::Swap);
        }
        tower.children.swap(i, j);

        let mut segment = Segment::new(Vec::new());
        segment.per_child.push(Step::Swap {
            first: vec![i],
            second: vec![j],
        });
        segment.settle.push(Step::AlignTop { path: vec![i] });
        segment.settle.push(Step::AlignTop { path: vec![j] });

        let mut plan = OpPlan::new(OpKind::Swap, Addressing::Source);
        plan.push(segment);
        plan
    }

    /// Inspects every child and removes those failing `predicate(node, child)`.
    #[instrument(level = "debug", skip_all)]
    pub fn select_subtowers<P>(&self, tower: &mut Tower, predicate: P) -> OpPlan
    where
        P: Fn(&Tower, &Tower) -> bool,
    {
        if tower.is_leaf() {
            return OpPlan::empty(OpKind::Select);
        }

        let kept: Vec<bool> = tower
            .children
            .iter()
            .map(|child| predicate(tower, child))
            .collect();

        let mut segment = Segment::new(Vec::new());
        for (index, &keep) in kept.iter().enumerate() {
            segment.per_child.push(Step::Inspect { path: vec![index] });
            if !keep {
                segment.per_child.push(Step::Remove { path: vec![index] });
            }
        }

        if kept.iter().any(|&keep| !keep) {
            let dx = self.layout.recenter_shift(tower, &kept);
            self.retain_children(tower, &kept);
            segment.settle.push(Step::Recenter {
                path: Vec::new(),
                dx,
            });
        }
        debug!("select: {} children kept", tower.fanout());

        let mut plan = OpPlan::new(OpKind::Select, Addressing::Source);
        plan.push(segment);
        plan
    }

    /// Randomly perturbs the geometry of the whole subtree.
    ///
    /// The node's width is scaled by a factor in `[0.8, 1.3)`. Each child then
    /// either gets its height scaled by a factor in `[0.8, 1.5)` and realigned to
    /// the parent's top, or is narrowed to 60% of its width, and is resized in turn.
    #[instrument(level = "debug", skip_all)]
    pub fn resize<R: Rng + ?Sized>(&self, tower: &mut Tower, rng: &mut R) -> OpPlan {
        let mut segment = Segment::new(Vec::new());
        let factor = rng.gen_range(0.8..1.3);
        tower.width *= factor;
        segment.enter.push(Step::ScaleWidth {
            path: Vec::new(),
            factor,
        });
        self.resize_children(tower, &[], rng, &mut segment.per_child);

        let mut plan = OpPlan::new(OpKind::Resize, Addressing::Source);
        plan.push(segment);
        plan
    }

    fn resize_children<R: Rng + ?Sized>(
        &self,
        tower: &mut Tower,
        path: &[usize],
        rng: &mut R,
        steps: &mut Vec<Step>,
    ) {
        for (index, child) in tower.children.iter_mut().enumerate() {
            let path = child_path(path, index);
            if rng.gen::<f64>() < HEIGHT_CHANGE_PROBABILITY {
                let factor = rng.gen_range(0.8..1.5);
                child.height *= factor;
                steps.push(Step::ScaleHeight {
                    path: path.clone(),
                    factor,
                });
                steps.push(Step::AlignTop { path: path.clone() });
            } else {
                child.width *= NARROW_FACTOR;
                steps.push(Step::ScaleWidth {
                    path: path.clone(),
                    factor: NARROW_FACTOR,
                });
            }

            let factor = rng.gen_range(0.8..1.3);
            child.width *= factor;
            steps.push(Step::ScaleWidth {
                path: path.clone(),
                factor,
            });
            self.resize_children(child, &path, rng, steps);
        }
    }

    /// Chains the tower with a shrunk copy of itself.
    ///
    /// The result is a new base as wide as `tower` and `height` high carrying the
    /// shrunk copy at `[0]` and, at `[1]`, a lower base that carries the shrunk
    /// tower at `[1, 0]`.
    #[instrument(level = "debug", skip(self, tower))]
    pub fn successive(&self, tower: &Tower, height: f64) -> (Tower, OpPlan) {
        if height <= 0.0 {
            return (tower.clone(), OpPlan::empty(OpKind::Successive));
        }
        let shrink = self.geometry().shrink_ratio;

        let mut inner = tower.clone();
        inner.scale(shrink);
        let copy = inner.clone();
        let inner_base = Tower::new(inner.width, height * INNER_BASE_RATIO)
            .with_color(BASE_COLOR)
            .with_children(vec![inner]);
        let root = Tower::new(tower.width, height)
            .with_color(BASE_COLOR)
            .with_children(vec![copy, inner_base]);

        let chained = vec![1, 0];
        let mut outer = Segment::new(Vec::new());
        outer.enter.push(Step::BaseEnter {
            base: Vec::new(),
            order: MergeOrder::Reverse,
        });
        outer.enter.push(Step::Merge {
            base: Vec::new(),
            child: chained.clone(),
            depth: tower.depth(),
            fanout: tower.fanout(),
            sound_level: tower.depth(),
            order: MergeOrder::Reverse,
        });
        outer.per_child.push(Step::Shrink {
            path: chained.clone(),
            factor: shrink,
        });
        outer.per_child.push(Step::AlignTop {
            path: chained.clone(),
        });
        outer.per_child.push(Step::Duplicate {
            from: chained.clone(),
            to: vec![0],
        });

        let mut second = Segment::new(vec![1]);
        second.enter.push(Step::BaseEnter {
            base: vec![1],
            order: MergeOrder::Reverse,
        });
        second.per_child.push(Step::Merge {
            base: vec![1],
            child: chained,
            depth: tower.depth(),
            fanout: tower.fanout(),
            sound_level: tower.depth(),
            order: MergeOrder::Reverse,
        });
        second.settle.push(Step::Settle { path: Vec::new() });

        let mut plan = OpPlan::new(OpKind::Successive, Addressing::Result);
        plan.push(outer);
        plan.push(second);
        (root, plan)
    }
}
