use crate::ai::Assistant;
use crate::browser::address::page_label;
use crate::browser::background::{Background, MENU_TITLE};
use crate::browser::page::{content_script, legacy_copy_js, render_overlay_js, PageEvent};
use crate::browser::settings::{handle_request, settings_page_html, SettingsReply, SettingsRequest};
use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::Config;
use crate::dispatcher::{Dispatcher, Inbound, PageContext};
use crate::error::ClipboardError;
use crate::overlay::{Overlay, OverlaySurface, OverlayView};
use crate::storage::CredentialStore;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use wry::application::event_loop::EventLoopProxy;

/// Work handed back to the UI thread.
#[derive(Debug)]
pub enum UserEvent {
    Page(PageEvent),
    Overlay(OverlayView),
    Copy(String),
    Settings(SettingsReply),
}

/// Lets background tasks reach the page through the event loop.
struct PageBridge {
    proxy: Mutex<EventLoopProxy<UserEvent>>,
}

impl PageBridge {
    fn send(&self, event: UserEvent) -> bool {
        match self.proxy.lock() {
            Ok(proxy) => proxy.send_event(event).is_ok(),
            Err(_) => false,
        }
    }
}

impl OverlaySurface for PageBridge {
    fn render(&self, view: &OverlayView) {
        if !self.send(UserEvent::Overlay(view.clone())) {
            debug!("Event loop gone, dropping overlay render");
        }
    }
}

/// The in-page textarea + execCommand path.
impl ClipboardSink for PageBridge {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.send(UserEvent::Copy(text.to_string())) {
            Ok(())
        } else {
            Err(ClipboardError::Unavailable)
        }
    }
}

pub struct Browser {
    config: Config,
    runtime: Handle,
    assistant: Arc<Assistant>,
    credentials: CredentialStore,
    start_url: String,
}

impl Browser {
    pub fn new(
        config: Config,
        runtime: Handle,
        assistant: Arc<Assistant>,
        credentials: CredentialStore,
        start_url: String,
    ) -> Result<Self> {
        Ok(Self {
            config,
            runtime,
            assistant,
            credentials,
            start_url,
        })
    }

    /// Runs the UI event loop. Must be called on the main thread and never
    /// returns.
    pub fn run(self) -> Result<()> {
        use wry::{
            application::{
                dpi::LogicalSize,
                event::{Event, StartCause, WindowEvent},
                event_loop::{ControlFlow, EventLoop},
                menu::{MenuBar, MenuItemAttributes},
                window::WindowBuilder,
            },
            webview::WebViewBuilder,
        };

        let Browser {
            config,
            runtime,
            assistant,
            credentials,
            start_url,
        } = self;

        let event_loop = EventLoop::<UserEvent>::with_user_event();
        let proxy = event_loop.create_proxy();

        let mut answer_menu = MenuBar::new();
        let mut answer_item =
            answer_menu.add_item(MenuItemAttributes::new(MENU_TITLE).with_enabled(false));
        let settings_item = answer_menu.add_item(MenuItemAttributes::new("Settings..."));
        let mut menu_bar = MenuBar::new();
        menu_bar.add_submenu("Answer", true, answer_menu);

        let window = WindowBuilder::new()
            .with_title("SyncFlo Answer")
            .with_menu(menu_bar)
            .with_inner_size(LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)
            .context("Failed to create window")?;

        let settings_window = WindowBuilder::new()
            .with_title("SyncFlo Answer Settings")
            .with_inner_size(LogicalSize::new(360.0, 180.0))
            .with_resizable(false)
            .with_visible(false)
            .build(&event_loop)
            .context("Failed to create settings window")?;

        // Content side: one dispatcher task for the lifetime of the window.
        let bridge = Arc::new(PageBridge {
            proxy: Mutex::new(proxy.clone()),
        });
        let dispatcher = Dispatcher::new(PageContext {
            overlay: Overlay::new(bridge.clone()),
            assistant,
            clipboard: Arc::new(SystemClipboard::new()),
            fallback_clipboard: bridge,
            timings: config.timings,
        });
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        runtime.spawn(dispatcher.run(inbound_rx));

        let script = content_script(&config.shortcuts).context("Failed to build content script")?;
        let page_proxy = proxy.clone();
        let content = WebViewBuilder::new(window)?
            .with_initialization_script(&script)
            .with_url(&start_url)?
            .with_devtools(cfg!(debug_assertions))
            .with_ipc_handler(move |_, msg| match PageEvent::parse(&msg) {
                Ok(event) => {
                    let _ = page_proxy.send_event(UserEvent::Page(event));
                }
                Err(e) => warn!("Ignoring malformed page message: {}", e),
            })
            .build()?;

        let settings_proxy = proxy.clone();
        let settings_runtime = runtime.clone();
        let settings = WebViewBuilder::new(settings_window)?
            .with_html(settings_page_html())?
            .with_ipc_handler(move |_, msg| {
                let request = match serde_json::from_str::<SettingsRequest>(&msg) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Ignoring malformed settings message: {}", e);
                        return;
                    }
                };
                let proxy = settings_proxy.clone();
                let store = credentials.clone();
                settings_runtime.spawn(async move {
                    let reply = handle_request(&store, request).await;
                    let _ = proxy.send_event(UserEvent::Settings(reply));
                });
            })
            .build()?;

        let answer_id = answer_item.clone().id();
        let settings_id = settings_item.clone().id();

        let mut background = Background::new();
        let shortcuts: Vec<String> = config.shortcuts.iter().map(|c| c.to_string()).collect();
        info!("Shortcuts: {}", shortcuts.join(", "));

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;

            match event {
                Event::NewEvents(StartCause::Init) => {
                    info!("SyncFlo Answer initialized");
                }
                Event::UserEvent(UserEvent::Page(page_event)) => match page_event {
                    PageEvent::Ready { url } => {
                        background.on_page_loaded();
                        answer_item.set_enabled(false);
                        debug!("New page context: {}", page_label(&url));
                        let _ = inbound.send(Inbound::PageLoaded(url));
                    }
                    PageEvent::Selection { text } => {
                        answer_item.set_enabled(background.on_selection_changed(&text));
                    }
                    PageEvent::Trigger { selection } => {
                        let _ = inbound.send(Inbound::Keyboard(selection));
                    }
                },
                Event::UserEvent(UserEvent::Overlay(view)) => {
                    match render_overlay_js(&view) {
                        Ok(js) => {
                            if let Err(e) = content.evaluate_script(&js) {
                                warn!("Overlay render failed: {}", e);
                            }
                        }
                        Err(e) => warn!("Overlay render failed: {}", e),
                    }
                }
                Event::UserEvent(UserEvent::Copy(text)) => match legacy_copy_js(&text) {
                    Ok(js) => {
                        if let Err(e) = content.evaluate_script(&js) {
                            warn!("Failed to copy text: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to copy text: {}", e),
                },
                Event::UserEvent(UserEvent::Settings(reply)) => match reply.to_js() {
                    Ok(js) => {
                        if let Err(e) = settings.evaluate_script(&js) {
                            warn!("Settings update failed: {}", e);
                        }
                    }
                    Err(e) => warn!("Settings update failed: {}", e),
                },
                Event::MenuEvent { menu_id, .. } => {
                    if menu_id == answer_id {
                        if let Some(message) = background.on_menu_click() {
                            let _ = inbound.send(Inbound::Message(message));
                        }
                    } else if menu_id == settings_id {
                        settings.window().set_visible(true);
                        let _ = settings
                            .evaluate_script("window.__syncfloSettings && window.__syncfloSettings.load();");
                    }
                }
                Event::WindowEvent {
                    window_id,
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    // Closing the popup only hides it.
                    if window_id == settings.window().id() {
                        settings.window().set_visible(false);
                    } else if window_id == content.window().id() {
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            }
        })
    }
}
