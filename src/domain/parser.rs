//! Recursive descent over bracket expressions.
//!
//! `()`, `[]`, `{}` and `<>` are interchangeable: only the nesting counts, and an
//! open bracket of one kind may be closed by any close bracket. Whitespace is
//! removed first; all indices refer to the text without whitespace.

use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult, MalformedReason};
use crate::domain::geometry::Geometry;
use crate::domain::layout::LayoutEngine;
use crate::domain::palette::Palette;
use crate::domain::tower::Tower;

pub fn is_open(c: char) -> bool {
    matches!(c, '(' | '[' | '{' | '<')
}

pub fn is_close(c: char) -> bool {
    matches!(c, ')' | ']' | '}' | '>')
}

fn strip_whitespace(text: &str) -> Vec<char> {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionParser {
    layout: LayoutEngine,
    palette: Palette,
}

impl ExpressionParser {
    pub fn new(geometry: Geometry, palette: Palette) -> Self {
        Self {
            layout: LayoutEngine::new(geometry),
            palette,
        }
    }

    fn geometry(&self) -> &Geometry {
        self.layout.geometry()
    }

    /// Parses the bracket group opening at `start` and returns it with the index
    /// of its matching close bracket.
    ///
    /// The tower gets `base_width` by `base_height`; nested groups get provisional
    /// sizes shrinking per level before the whole group is laid out once, colored
    /// from level `depth`.
    #[instrument(level = "debug", skip(self))]
    pub fn parse(
        &self,
        text: &str,
        start: usize,
        base_width: f64,
        base_height: f64,
        depth: usize,
    ) -> DomainResult<(Tower, usize)> {
        let chars = strip_whitespace(text);
        let (mut tower, end) = self.descend(&chars, start, base_width, base_height, depth)?;
        self.layout.layout(&mut tower, base_width, depth, self.palette);
        Ok((tower, end))
    }

    /// Parses a sequence of top-level groups and stands them on an implicit root
    /// (the ground base) of the configured base size.
    ///
    /// `"()"` yields a root with a single leaf child.
    #[instrument(level = "debug", skip(self))]
    pub fn parse_expression(&self, text: &str) -> DomainResult<Tower> {
        let chars = strip_whitespace(text);
        if chars.is_empty() {
            return Err(DomainError::malformed(0, MalformedReason::Empty));
        }

        let geometry = self.geometry();
        let (width, height) = (geometry.base_width, geometry.base_height);
        let child_width = width * geometry.width_ratio;
        let child_height = height * geometry.floor_ratio;

        let mut groups = Vec::new();
        let mut index = 0;
        while index < chars.len() {
            let (group, end) = self.descend(&chars, index, child_width, child_height, 1)?;
            groups.push(group);
            index = end + 1;
        }

        let mut root = Tower::new(width, height).with_children(groups);
        self.layout.layout(&mut root, width, 0, self.palette);
        debug!(
            "parsed {} top-level groups, depth {}",
            root.fanout(),
            root.depth()
        );
        Ok(root)
    }

    fn descend(
        &self,
        chars: &[char],
        start: usize,
        width: f64,
        height: f64,
        depth: usize,
    ) -> DomainResult<(Tower, usize)> {
        let Some(&open) = chars.get(start) else {
            return Err(DomainError::malformed(start, MalformedReason::UnexpectedEnd));
        };
        if is_close(open) {
            return Err(DomainError::malformed(start, MalformedReason::UnmatchedClose));
        }
        if !is_open(open) {
            return Err(DomainError::malformed(
                start,
                MalformedReason::UnexpectedCharacter(open),
            ));
        }

        let geometry = self.geometry();
        let mut children = Vec::new();
        let mut index = start + 1;
        loop {
            match chars.get(index) {
                None => {
                    return Err(DomainError::malformed(start, MalformedReason::Unterminated));
                }
                Some(&c) if is_close(c) => {
                    trace!(start, end = index, depth, "group closed");
                    let tower = Tower::new(width, height).with_children(children);
                    return Ok((tower, index));
                }
                Some(_) => {
                    let (child, end) = self.descend(
                        chars,
                        index,
                        width * geometry.width_ratio,
                        height * geometry.floor_ratio,
                        depth + 1,
                    )?;
                    children.push(child);
                    index = end + 1;
                }
            }
        }
    }
}
