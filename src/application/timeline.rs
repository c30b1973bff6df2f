//! Timed audio-visual events and the timeline they form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Color, NodePath, OpKind};

/// Durations (seconds) used when turning plans into events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Short moves: lifting, rotating, base advances
    pub transition: f64,
    /// Pause while a merged child is tilted
    pub wiggle_pause: f64,
    /// Indications, swaps and removals
    pub step: f64,
    /// Falling blocks during union
    pub drop: f64,
    pub resize_step: f64,
    pub recenter: f64,
    pub highlight_pause: f64,
    pub settle_pause: f64,
    /// Per character when playing a bracket string
    pub sound_time: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            transition: 0.05,
            wiggle_pause: 0.05,
            step: 0.5,
            drop: 0.4,
            resize_step: 0.1,
            recenter: 0.1,
            highlight_pause: 3.0,
            settle_pause: 1.0,
            sound_time: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Transition,
    Sound,
    Wait,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Transition => write!(f, "transition"),
            EventKind::Sound => write!(f, "sound"),
            EventKind::Wait => write!(f, "wait"),
        }
    }
}

/// What a shape payload acts on. Node paths are relative to the operated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "path", rename_all = "snake_case")]
pub enum ShapeRef {
    Node(NodePath),
    /// All children of the node, moved as a group
    Children(NodePath),
    /// The ground line the towers stand on
    Ground,
    /// The icon of an instrument on the instrument display
    Icon(usize),
}

impl fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeRef::Node(path) => write!(f, "node{:?}", path),
            ShapeRef::Children(path) => write!(f, "children{:?}", path),
            ShapeRef::Ground => write!(f, "ground"),
            ShapeRef::Icon(index) => write!(f, "icon#{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "motion", rename_all = "snake_case")]
pub enum Motion {
    Create,
    /// Removes the block only, or the block with everything on it
    Uncreate { subtree: bool },
    /// Moves the lower-left corner to an absolute position
    Place { left: f64, bottom: f64 },
    Shift { dx: f64, dy: f64 },
    Rotate { angle: f64 },
    Indicate,
    Recolor { color: Color },
    ScaleWidth { factor: f64 },
    ScaleHeight { factor: f64 },
    Scale { factor: f64 },
    SwapWith { other: NodePath },
    /// Bottom realigned to the parent's top edge
    AlignTop,
    CopyTo { to: NodePath },
    Wiggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Level,
    Children,
    Expression,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Level => write!(f, "level"),
            Indicator::Children => write!(f, "children"),
            Indicator::Expression => write!(f, "expression"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Shape { target: ShapeRef, motion: Motion },
    Sound { sample: String, gain: f64 },
    Label {
        indicator: Indicator,
        value: String,
        color: Color,
    },
}

impl Payload {
    pub fn shape(target: ShapeRef, motion: Motion) -> Self {
        Payload::Shape { target, motion }
    }

    pub fn node(path: &[usize], motion: Motion) -> Self {
        Payload::Shape {
            target: ShapeRef::Node(path.to_vec()),
            motion,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Payload::Label { .. })
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Payload::Shape { .. })
    }
}

/// One unit of the timeline. All payloads of an event run together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub duration: f64,
    pub payloads: Vec<Payload>,
}

impl Event {
    pub fn transition(duration: f64, payloads: Vec<Payload>) -> Self {
        Self {
            kind: EventKind::Transition,
            duration,
            payloads,
        }
    }

    /// Sounds are fire-and-forget and take no time.
    pub fn sound(payloads: Vec<Payload>) -> Self {
        Self {
            kind: EventKind::Sound,
            duration: 0.0,
            payloads,
        }
    }

    pub fn wait(duration: f64) -> Self {
        Self {
            kind: EventKind::Wait,
            duration,
            payloads: Vec::new(),
        }
    }
}

/// Ordered events of one operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Timeline {
    pub op: Option<OpKind>,
    pub events: Vec<Event>,
}

impl Timeline {
    pub fn new(op: Option<OpKind>) -> Self {
        Self {
            op,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(|e| e.duration).sum()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}
