//! Operation plans: the pure, ordered description of what a tree operation did.
//!
//! A plan never touches a renderer. The scheduler turns it into events.

use serde::Serialize;

use crate::domain::tower::NodePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Raise,
    RaiseTowers,
    MergeUnderBase,
    Union,
    RemoveDuplicates,
    RemoveDuplicatesRecursive,
    Swap,
    Select,
    Resize,
    Successive,
}

/// Order in which children are merged onto a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrder {
    /// Rightmost child first
    #[default]
    Reverse,
    /// Leftmost child first
    Forward,
}

impl MergeOrder {
    pub fn indices(self, n: usize) -> Vec<usize> {
        match self {
            MergeOrder::Reverse => (0..n).rev().collect(),
            MergeOrder::Forward => (0..n).collect(),
        }
    }
}

/// Which tree the paths of a plan refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// The operated node as it was before the edit
    Source,
    /// The operated node (or assembled result) after the edit
    Result,
}

/// One sub-step of an operation. Paths are relative to the operated node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// A leaf is set down on the ground line
    Ground { path: NodePath },
    /// A base slides in from the stage edge next to the towers it will carry.
    /// Reverse merges enter from the right edge, forward merges from the left.
    BaseEnter { base: NodePath, order: MergeOrder },
    /// A child is lifted onto its base, sonified, wiggled and settled
    Merge {
        base: NodePath,
        child: NodePath,
        depth: usize,
        fanout: usize,
        /// Level the instruments play; the child's depth unless a container sounds its own
        sound_level: usize,
        order: MergeOrder,
    },
    /// The base moves under the center of the towers it carries
    CenterBase { base: NodePath },
    Highlight { path: NodePath },
    /// Long pause after highlighting
    Pause,
    /// The block of a node disappears while its children stay
    Dissolve { path: NodePath },
    /// A node falls by `dy` onto the block below it
    Drop {
        path: NodePath,
        dy: f64,
        depth: usize,
    },
    /// Two structurally equal siblings; `remove` goes away
    Match { keep: NodePath, remove: NodePath },
    Inspect { path: NodePath },
    /// A whole subtree disappears
    Remove { path: NodePath },
    /// The children of `path` shift horizontally by `dx`
    Recenter { path: NodePath, dx: f64 },
    Swap { first: NodePath, second: NodePath },
    ScaleWidth { path: NodePath, factor: f64 },
    ScaleHeight { path: NodePath, factor: f64 },
    /// The node's bottom is realigned to its parent's top edge
    AlignTop { path: NodePath },
    Shrink { path: NodePath, factor: f64 },
    /// A copy of `from` is made and moved into the place of `to`
    Duplicate { from: NodePath, to: NodePath },
    /// Final pause; the node's expression is shown
    Settle { path: NodePath },
}

/// `ENTER -> {PER_CHILD}* -> SETTLE` for one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Segment {
    pub node: NodePath,
    pub enter: Vec<Step>,
    pub per_child: Vec<Step>,
    pub settle: Vec<Step>,
}

impl Segment {
    pub fn new(node: NodePath) -> Self {
        Self {
            node,
            ..Self::default()
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.enter
            .iter()
            .chain(self.per_child.iter())
            .chain(self.settle.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.per_child.is_empty() && self.settle.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpPlan {
    pub op: OpKind,
    pub addressing: Addressing,
    pub segments: Vec<Segment>,
}

impl OpPlan {
    pub fn new(op: OpKind, addressing: Addressing) -> Self {
        Self {
            op,
            addressing,
            segments: Vec::new(),
        }
    }

    /// Plan of an operation that degraded to a no-op.
    pub fn empty(op: OpKind) -> Self {
        Self::new(op, Addressing::Source)
    }

    /// Appends `segment` unless it holds no step.
    pub fn push(&mut self, segment: Segment) {
        if !segment.is_empty() {
            self.segments.push(segment);
        }
    }

    pub fn extend(&mut self, other: OpPlan) {
        self.segments.extend(other.segments);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.segments.iter().flat_map(Segment::steps)
    }
}

/// `base` extended by one child index.
pub fn child_path(base: &[usize], index: usize) -> NodePath {
    let mut path = base.to_vec();
    path.push(index);
    path
}
