//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on capability traits (InstrumentPlayer, IndicatorPanel)
//! but are themselves concrete structs, not traits.

mod scene;

pub use scene::{Operation, SceneOutcome, SceneService, Selection};
