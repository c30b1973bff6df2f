//! Domain layer: towers, layout, structural operations and instruments
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod geometry;
pub mod instrument;
pub mod layout;
pub mod ops;
pub mod palette;
pub mod parser;
pub mod plan;
pub mod tower;

pub use error::{DomainError, DomainResult, MalformedReason};
pub use geometry::Geometry;
pub use instrument::{Instrument, Note};
pub use layout::{LayoutEngine, PlacedNode};
pub use ops::TreeOps;
pub use palette::{Color, Palette};
pub use parser::ExpressionParser;
pub use plan::{Addressing, MergeOrder, OpKind, OpPlan, Segment, Step};
pub use tower::{NodePath, Tower};
