//! Best-effort clipboard writes.

use crate::error::ClipboardError;
use log::{debug, warn};
use std::sync::{Arc, Mutex};

pub trait ClipboardSink: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard. The handle is opened lazily and kept so the
/// copied text outlives the call on platforms where the owner must stay
/// alive.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?;
        if handle.is_none() {
            *handle = Some(
                arboard::Clipboard::new()
                    .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?,
            );
        }
        match handle.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::AccessFailed(e.to_string())),
            None => Err(ClipboardError::Unavailable),
        }
    }
}

/// For hosts with no page to fall back into.
pub struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// Clipboard for one-shot command line runs.
///
/// X11 and Wayland drop a selection as soon as its owner exits, and a
/// headless run exits right after printing. On Linux the answer is only
/// printed.
pub fn headless_sink() -> Arc<dyn ClipboardSink> {
    if cfg!(target_os = "linux") {
        debug!("Headless run on Linux: answers are printed, not copied");
        Arc::new(NoClipboard)
    } else {
        Arc::new(SystemClipboard::new())
    }
}

/// Try `primary`, then `fallback`. Failures are logged, never returned.
pub fn copy_best_effort(primary: &dyn ClipboardSink, fallback: &dyn ClipboardSink, text: &str) {
    match primary.write_text(text) {
        Ok(()) => debug!("Copied {} chars to clipboard", text.len()),
        Err(e) => {
            log_failure("Clipboard write failed, trying fallback", &e);
            if let Err(e) = fallback.write_text(text) {
                log_failure("Failed to copy text", &e);
            }
        }
    }
}

// A missing clipboard is expected in some hosts; only real failures warn.
fn log_failure(context: &str, e: &ClipboardError) {
    match e {
        ClipboardError::Unavailable => debug!("{}: {}", context, e),
        _ => warn!("{}: {}", context, e),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Blocks the calling thread for `delay` on every write.
    pub struct SlowClipboard {
        delay: Duration,
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl SlowClipboard {
        pub fn new(delay: Duration) -> Self {
            Self {
                delay,
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            }
        }

        pub fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }

        pub fn finished(&self) -> usize {
            self.finished.load(Ordering::SeqCst)
        }
    }

    impl ClipboardSink for SlowClipboard {
        fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingClipboard {
        pub written: Mutex<Vec<String>>,
        pub broken: bool,
    }

    impl RecordingClipboard {
        pub fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        pub fn contents(&self) -> Vec<String> {
            self.written.lock().unwrap().clone()
        }
    }

    impl ClipboardSink for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError::AccessFailed("denied".to_string()));
            }
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
