//! Error conversion helpers for the external playback boundary
//!
//! Provides an extension trait for cleaner error handling with event context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add context naming what was being played to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// renderer.wait(0.5)
    ///     .with_event_context("wait", 3)?;
    /// ```
    fn with_event_context(self, action: &str, event: usize) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_event_context(self, action: &str, event: usize) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{} (event {})", action, event),
            source: Box::new(e),
        })
    }
}
