//! The single per-page status overlay.
//!
//! Every call cancels the pending hide timer before doing anything else, so
//! at most one timer is ever live and a newer result is never hidden early.

use log::debug;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    Hidden,
    Loading,
    ShowingResult,
    ShowingError,
    /// A hint to the user, e.g. that nothing is selected.
    ShowingStatus,
}

/// What the surface should draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayView {
    pub state: OverlayState,
    pub visible: bool,
    pub text: String,
}

pub trait OverlaySurface: Send + Sync {
    fn render(&self, view: &OverlayView);
}

/// Renders to the log; used headless.
pub struct LogSurface;

impl OverlaySurface for LogSurface {
    fn render(&self, view: &OverlayView) {
        if view.visible {
            log::info!("[overlay] {}", view.text);
        } else {
            debug!("[overlay] hidden");
        }
    }
}

struct Inner {
    state: OverlayState,
    text: String,
    hide_timer: Option<JoinHandle<()>>,
    // Bumped on every mutation; a timer only hides the generation it was
    // scheduled for.
    generation: u64,
}

#[derive(Clone)]
pub struct Overlay {
    inner: Arc<Mutex<Inner>>,
    surface: Arc<dyn OverlaySurface>,
}

impl Overlay {
    pub fn new(surface: Arc<dyn OverlaySurface>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: OverlayState::Hidden,
                text: String::new(),
                hide_timer: None,
                generation: 0,
            })),
            surface,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a render panicked; the state is still
        // consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, inner: &mut Inner, state: OverlayState, text: String) -> u64 {
        if let Some(timer) = inner.hide_timer.take() {
            timer.abort();
        }
        inner.generation += 1;
        inner.state = state;
        inner.text = text;
        self.surface.render(&OverlayView {
            state,
            visible: state != OverlayState::Hidden,
            text: inner.text.clone(),
        });
        inner.generation
    }

    /// Show `text` with no scheduled hide.
    pub fn show(&self, state: OverlayState, text: impl Into<String>) {
        let mut inner = self.lock();
        self.apply(&mut inner, state, text.into());
    }

    pub fn hide(&self) {
        let mut inner = self.lock();
        self.apply(&mut inner, OverlayState::Hidden, String::new());
    }

    /// Show `text`, then hide after `delay` unless something newer lands
    /// first. Must be called from within a tokio runtime.
    pub fn show_then_hide_after(&self, state: OverlayState, text: impl Into<String>, delay: Duration) {
        let mut inner = self.lock();
        let generation = self.apply(&mut inner, state, text.into());

        let overlay = self.clone();
        inner.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = overlay.lock();
            if inner.generation == generation {
                // This task is the one being replaced; don't abort ourselves.
                inner.hide_timer = None;
                overlay.apply(&mut inner, OverlayState::Hidden, String::new());
            }
        }));
    }

    pub fn state(&self) -> OverlayState {
        self.lock().state
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    /// Number of hide timers still pending (0 or 1).
    pub fn pending_timers(&self) -> usize {
        self.lock()
            .hide_timer
            .as_ref()
            .map_or(0, |t| usize::from(!t.is_finished()))
    }
}
