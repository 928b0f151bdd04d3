//! Operator-facing progress output.
//!
//! Indexing runs report human-readable lines ("Processing area: ...",
//! "Processed 5 records ...") with a nesting depth. Where those lines go is
//! up to the [`ProgressTrace`] passed in.

use std::sync::Mutex;

use tracing::info;

/// Sink for progress lines.
pub trait ProgressTrace: Send + Sync {
    fn output(&self, message: &str, depth: usize);
}

/// Discards all output.
pub struct NoOpProgress;

impl ProgressTrace for NoOpProgress {
    fn output(&self, _message: &str, _depth: usize) {}
}

/// Emits every line as an `info!` event.
pub struct TracingProgress;

impl ProgressTrace for TracingProgress {
    fn output(&self, message: &str, depth: usize) {
        info!(depth, "{}", message);
    }
}

/// Collects output as text, two spaces of indent per depth level.
#[derive(Default)]
pub struct BufferedProgress {
    buffer: Mutex<String>,
}

impl BufferedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_buffer(&self) -> String {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reset_buffer(&self) {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Return the buffer and clear it.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl ProgressTrace for BufferedProgress {
    fn output(&self, message: &str, depth: usize) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.push_str(&"  ".repeat(depth));
        buffer.push_str(message);
        buffer.push('\n');
    }
}
