//! Trigger handling: selection in, overlay and clipboard out.
//!
//! Triggers are not serialized. Each one runs its own pipeline and whichever
//! response lands last owns the overlay and its hide timer.

use crate::ai::Assistant;
use crate::clipboard::{copy_best_effort, ClipboardSink};
use crate::config::Timings;
use crate::overlay::{Overlay, OverlayState};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

pub const LOADING_TEXT: &str = "...";
pub const EMPTY_SELECTION_TEXT: &str = "Select text";

/// Message sent by the menu handler to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    #[serde(rename = "answerQuestion")]
    AnswerQuestion {
        #[serde(rename = "selectedText", default)]
        selected_text: Option<String>,
    },
}

/// Everything the dispatcher task receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(Message),
    Keyboard(String),
    PageLoaded(String),
}

/// Per-page state handed to every pipeline run.
pub struct PageContext {
    pub overlay: Overlay,
    pub assistant: Arc<Assistant>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub fallback_clipboard: Arc<dyn ClipboardSink>,
    pub timings: Timings,
}

#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<PageContext>,
    in_flight: Arc<Mutex<Vec<AbortHandle>>>,
}

impl Dispatcher {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.ctx.overlay
    }

    /// Returns `true`: the reply, if any, is asynchronous.
    pub fn handle_message(&self, message: Message) -> bool {
        match message {
            Message::AnswerQuestion { selected_text } => {
                self.trigger(selected_text.as_deref().unwrap_or(""));
            }
        }
        true
    }

    /// Start the pipeline for `selection`. Returns the pipeline task, or
    /// `None` when there was nothing selected.
    pub fn trigger(&self, selection: &str) -> Option<JoinHandle<()>> {
        let text = selection.trim();
        let overlay = &self.ctx.overlay;

        if text.is_empty() {
            overlay.show_then_hide_after(
                OverlayState::ShowingStatus,
                EMPTY_SELECTION_TEXT,
                self.ctx.timings.empty_selection,
            );
            return None;
        }

        overlay.show(OverlayState::Loading, LOADING_TEXT);

        let ctx = self.ctx.clone();
        let text = text.to_string();
        let handle = tokio::spawn(async move { run_pipeline(ctx, text).await });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle.abort_handle());
        drop(in_flight);

        Some(handle)
    }

    /// Tear down the page's state: abort running pipelines, hide the overlay.
    pub fn reset_page(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        for handle in in_flight.drain(..) {
            handle.abort();
        }
        drop(in_flight);
        self.ctx.overlay.hide();
    }

    pub async fn run(self, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        info!("Dispatcher ready (provider: {})", self.ctx.assistant.provider_id());
        while let Some(event) = inbound.recv().await {
            match event {
                Inbound::Message(message) => {
                    debug!("Menu message: {:?}", message);
                    self.handle_message(message);
                }
                Inbound::Keyboard(selection) => {
                    debug!("Shortcut trigger ({} chars)", selection.len());
                    self.trigger(&selection);
                }
                Inbound::PageLoaded(url) => {
                    debug!("Page loaded: {}", url);
                    self.reset_page();
                }
            }
        }
        info!("Dispatcher channel closed");
    }
}

async fn run_pipeline(ctx: Arc<PageContext>, text: String) {
    match ctx.assistant.answer(&text).await {
        Ok(answer) => {
            ctx.overlay
                .show_then_hide_after(OverlayState::ShowingResult, answer.clone(), ctx.timings.success);

            // arboard can block on the display server.
            let primary = ctx.clipboard.clone();
            let fallback = ctx.fallback_clipboard.clone();
            let copy = tokio::task::spawn_blocking(move || {
                copy_best_effort(primary.as_ref(), fallback.as_ref(), &answer)
            });
            if let Err(e) = copy.await {
                warn!("Clipboard task failed: {}", e);
            }
        }
        Err(e) => {
            warn!("Lookup failed: {}", e);
            ctx.overlay
                .show_then_hide_after(OverlayState::ShowingError, e.overlay_text(), ctx.timings.error);
        }
    }
}
