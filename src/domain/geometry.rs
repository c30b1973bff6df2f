//! Geometric constants shared by parser, layout and tree operations.

use serde::{Deserialize, Serialize};

/// Sizes and ratios of the tower drawing. All lengths are in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Gap between sibling blocks and between a block and its parent's edge
    pub spacing: f64,
    /// Height multiplier per nesting level
    pub floor_ratio: f64,
    /// Provisional width multiplier per nesting level while parsing
    pub width_ratio: f64,
    /// Width of the implicit root
    pub base_width: f64,
    /// Height of the implicit root
    pub base_height: f64,
    pub corner_radius: f64,
    /// Corner radius multiplier per nesting level
    pub corner_ratio: f64,
    /// Scale applied to a tower when `successive` wraps it
    pub shrink_ratio: f64,
    /// Horizontal distance of the stage edge from the center; bases slide in from there
    pub stage_edge: f64,
    /// Vertical position of the ground line
    pub ground_level: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            spacing: 0.06,
            floor_ratio: 0.9,
            width_ratio: 0.5,
            base_width: 7.0,
            base_height: 1.0,
            corner_radius: 0.3,
            corner_ratio: 0.9,
            shrink_ratio: 0.45,
            stage_edge: 7.0,
            ground_level: -2.0,
        }
    }
}

impl Geometry {
    pub fn corner_radius_at(&self, level: usize) -> f64 {
        self.corner_radius * self.corner_ratio.powi(level as i32)
    }

    /// Spacing actually used between `n` children of a block `total_width` wide.
    ///
    /// Shrinks below the configured spacing when the block is too narrow to
    /// hold `n + 1` gaps and still give every child a positive width.
    pub fn spacing_for(&self, total_width: f64, n: usize) -> f64 {
        self.spacing.min(total_width / (2.0 * (n + 1) as f64))
    }
}
