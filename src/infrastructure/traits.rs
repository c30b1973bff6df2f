//! Playback boundary traits
//!
//! These traits abstract the external renderer, audio device and label
//! display, allowing timelines to be played against mock implementations.

use std::io;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::application::timeline::{Indicator, Motion, ShapeRef};

/// Visual transitions of shapes.
pub trait Renderer: Send + Sync {
    /// Start a transition. Transitions started before the next `wait` run together.
    fn render(&self, shape: &ShapeRef, motion: &Motion, duration: f64) -> io::Result<()>;

    /// Block until `duration` seconds have elapsed.
    fn wait(&self, duration: f64) -> io::Result<()>;
}

/// Fire-and-forget sample playback.
pub trait AudioDevice: Send + Sync {
    fn play(&self, sample: &str, gain: f64) -> io::Result<()>;
}

/// Text indicators (level, child count, expression).
pub trait LabelSink: Send + Sync {
    fn show(&self, indicator: Indicator, value: &str, duration: f64) -> io::Result<()>;
}

// ============================================================
// TRACING IMPLEMENTATIONS
// ============================================================

/// Renderer that logs every transition.
///
/// With `realtime` set, `wait` sleeps for the requested duration.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    pub realtime: bool,
}

impl TracingRenderer {
    pub fn new(realtime: bool) -> Self {
        Self { realtime }
    }
}

impl Renderer for TracingRenderer {
    fn render(&self, shape: &ShapeRef, motion: &Motion, duration: f64) -> io::Result<()> {
        info!(%shape, ?motion, duration, "render");
        Ok(())
    }

    fn wait(&self, duration: f64) -> io::Result<()> {
        if self.realtime && duration > 0.0 {
            thread::sleep(Duration::from_secs_f64(duration));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TracingAudioDevice;

impl AudioDevice for TracingAudioDevice {
    fn play(&self, sample: &str, gain: f64) -> io::Result<()> {
        info!(sample, gain, "play");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TracingLabelSink;

impl LabelSink for TracingLabelSink {
    fn show(&self, indicator: Indicator, value: &str, duration: f64) -> io::Result<()> {
        info!(%indicator, value, duration, "label");
        Ok(())
    }
}
