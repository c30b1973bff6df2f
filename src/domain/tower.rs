//! Tower: a block carrying an ordered sequence of exclusively owned sub-towers.

use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::palette::{Color, BLOCK_COLOR};

/// Child indices leading from an operated node down to a descendant.
/// The empty path is the node itself.
pub type NodePath = Vec<usize>;

/// A block of the drawing together with the towers standing on it.
///
/// A leaf always has an empty `children` vector; there is no separate
/// "unknown" state. Cloning is a deep copy.
#[derive(Debug, Clone, Serialize)]
pub struct Tower {
    pub width: f64,
    pub height: f64,
    pub color: Color,
    pub children: Vec<Tower>,
}

impl Tower {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            color: BLOCK_COLOR,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Tower>) -> Self {
        self.children = children;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Distance from this node to its deepest descendant leaf.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn fanout(&self) -> usize {
        self.children.len()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn count_descendants(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Tower::count_descendants)
            .sum::<usize>()
    }

    pub fn child(&self, index: usize) -> DomainResult<&Tower> {
        let len = self.children.len();
        self.children
            .get(index)
            .ok_or(DomainError::IndexOutOfRange { index, len })
    }

    pub fn child_mut(&mut self, index: usize) -> DomainResult<&mut Tower> {
        let len = self.children.len();
        self.children
            .get_mut(index)
            .ok_or(DomainError::IndexOutOfRange { index, len })
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, path: &[usize]) -> DomainResult<&Tower> {
        path.iter().try_fold(self, |node, &index| node.child(index))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_mut(&mut self, path: &[usize]) -> DomainResult<&mut Tower> {
        let mut node = self;
        for &index in path {
            node = node.child_mut(index)?;
        }
        Ok(node)
    }

    /// Uniformly scales the whole subtree.
    pub fn scale(&mut self, factor: f64) {
        self.width *= factor;
        self.height *= factor;
        for child in &mut self.children {
            child.scale(factor);
        }
    }

    /// Bracket expression of this node, e.g. `(()(()))`.
    pub fn expression(&self) -> String {
        let mut out = String::new();
        self.write_expression(&mut out);
        out
    }

    /// Bracket expression of the children without the node's own pair.
    pub fn inner_expression(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_expression(&mut out);
        }
        out
    }

    fn write_expression(&self, out: &mut String) {
        out.push('(');
        for child in &self.children {
            child.write_expression(out);
        }
        out.push(')');
    }

    /// Pre-order traversal yielding every node with its path.
    pub fn iter(&self) -> TowerIter<'_> {
        TowerIter {
            stack: vec![(Vec::new(), self)],
        }
    }

    pub fn to_tree_string(&self) -> Tree<String> {
        let label = if self.is_leaf() {
            format!("() {:.3}x{:.3} {}", self.width, self.height, self.color)
        } else {
            format!(
                "depth {} fanout {} {:.3}x{:.3} {}",
                self.depth(),
                self.fanout(),
                self.width,
                self.height,
                self.color
            )
        };
        let leaves: Vec<_> = self.children.iter().map(Tower::to_tree_string).collect();
        Tree::new(label).with_leaves(leaves)
    }
}

/// Structural equality: same child count and pairwise equal children, in order.
/// Geometry and color do not take part.
impl PartialEq for Tower {
    fn eq(&self, other: &Self) -> bool {
        self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a == b)
    }
}

impl Eq for Tower {}

pub struct TowerIter<'a> {
    stack: Vec<(NodePath, &'a Tower)>,
}

impl<'a> Iterator for TowerIter<'a> {
    type Item = (NodePath, &'a Tower);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for (index, child) in node.children.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            self.stack.push((child_path, child));
        }
        Some((path, node))
    }
}

/// Deepest `depth` among `towers`, 0 for none.
pub fn max_depth(towers: &[Tower]) -> usize {
    towers.iter().map(Tower::depth).max().unwrap_or(0)
}

/// Width of `towers` standing side by side `spacing` apart.
pub fn span_width(towers: &[Tower], spacing: f64) -> f64 {
    if towers.is_empty() {
        return 0.0;
    }
    towers.iter().map(|t| t.width).sum::<f64>() + spacing * (towers.len() - 1) as f64
}
