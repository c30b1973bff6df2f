//! Indicator displays: level, child count, expression and instrument icons.
//!
//! Panels only build payloads; the scheduler bundles them into the geometry
//! event they accompany.

use crate::application::timeline::{Indicator, Motion, Payload, ShapeRef};
use crate::domain::palette::{Color, HIGHLIGHT_COLOR};

pub trait IndicatorPanel: Send + Sync {
    fn level(&self, _level: usize) -> Vec<Payload> {
        Vec::new()
    }

    fn children(&self, _count: usize) -> Vec<Payload> {
        Vec::new()
    }

    fn expression(&self, _expression: &str, _color: Color) -> Vec<Payload> {
        Vec::new()
    }

    /// Feedback for the instruments that just sounded.
    fn instruments(&self, _selected: &[usize]) -> Vec<Payload> {
        Vec::new()
    }
}

/// Panel that shows nothing.
#[derive(Debug, Default)]
pub struct NullPanel;

impl IndicatorPanel for NullPanel {}

/// Panel with individually switchable indicators.
#[derive(Debug, Clone, Copy)]
pub struct TowerPanel {
    pub level: bool,
    pub children: bool,
    pub expression: bool,
}

impl Default for TowerPanel {
    fn default() -> Self {
        Self {
            level: true,
            children: true,
            expression: true,
        }
    }
}

fn label(indicator: Indicator, value: String, color: Color) -> Vec<Payload> {
    vec![Payload::Label {
        indicator,
        value,
        color,
    }]
}

impl IndicatorPanel for TowerPanel {
    fn level(&self, level: usize) -> Vec<Payload> {
        if !self.level {
            return Vec::new();
        }
        label(Indicator::Level, level.to_string(), HIGHLIGHT_COLOR)
    }

    fn children(&self, count: usize) -> Vec<Payload> {
        if !self.children {
            return Vec::new();
        }
        label(Indicator::Children, count.to_string(), HIGHLIGHT_COLOR)
    }

    fn expression(&self, expression: &str, color: Color) -> Vec<Payload> {
        if !self.expression {
            return Vec::new();
        }
        label(Indicator::Expression, expression.to_string(), color)
    }

    fn instruments(&self, selected: &[usize]) -> Vec<Payload> {
        selected
            .iter()
            .map(|&index| Payload::shape(ShapeRef::Icon(index), Motion::Wiggle))
            .collect()
    }
}
