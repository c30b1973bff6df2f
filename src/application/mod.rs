//! Application layer: sonification, scheduling and the scene service
//!
//! This layer orchestrates domain logic and depends on playback boundary traits.

pub mod error;
pub mod error_ext;
pub mod panel;
pub mod scheduler;
pub mod services;
pub mod sonification;
pub mod timeline;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use panel::{IndicatorPanel, NullPanel, TowerPanel};
pub use scheduler::{dispatch, EventScheduler};
pub use sonification::{
    InstrumentPlayer, NoteSource, PlaybackMode, SilentPlayer, SonificationMapper, SoundCue,
    Trigger,
};
pub use timeline::{Event, EventKind, Indicator, Motion, Payload, ShapeRef, Timeline, Timing};
