mod ai;
mod browser;
mod clipboard;
mod config;
mod dispatcher;
mod error;
mod overlay;
mod storage;

use ai::provider::{build_provider, ProviderKind};
use ai::Assistant;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use clipboard::{headless_sink, NoClipboard};
use config::{parse_shortcuts, Config, DEFAULT_SHORTCUTS};
use dispatcher::{Dispatcher, PageContext, EMPTY_SELECTION_TEXT};
use log::info;
use overlay::{LogSurface, Overlay, OverlayState};
use std::path::PathBuf;
use std::sync::Arc;
use storage::{mask_secret, CredentialStore, JsonFileStorage};

#[derive(Parser)]
#[command(name = "syncflo-answer", version, about = "Select text, press a shortcut, get an answer")]
struct Cli {
    /// Answer provider: groq or gemini
    #[arg(long, global = true, env = "AI_PROVIDER", default_value = "groq")]
    provider: ProviderKind,

    /// Override the provider's base URL
    #[arg(long, global = true, env = "AI_API_ENDPOINT")]
    endpoint: Option<String>,

    /// Override the provider's model
    #[arg(long, global = true, env = "AI_MODEL")]
    model: Option<String>,

    /// Storage file holding the API key
    #[arg(long, global = true, env = "SYNCFLO_STORAGE")]
    storage: Option<PathBuf>,

    /// Comma-separated keyboard shortcuts, e.g. "ctrl+q,alt+x" or "z"
    #[arg(long, global = true, env = "SYNCFLO_SHORTCUTS", default_value = DEFAULT_SHORTCUTS)]
    shortcuts: String,

    /// Language single words are defined in
    #[arg(long, global = true, env = "SYNCFLO_DEFINITION_LANGUAGE", default_value = ai::prompt::DEFAULT_DEFINITION_LANGUAGE)]
    definition_language: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the browser window (default)
    Run {
        /// Address or search terms to open first
        #[arg(default_value = "https://en.wikipedia.org")]
        url: String,
    },
    /// Answer a selection from the command line
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    Set { value: String },
    Show,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let storage_path = self
            .storage
            .clone()
            .unwrap_or_else(JsonFileStorage::default_path);
        let mut config = Config::new(self.provider, storage_path);
        if let Some(endpoint) = &self.endpoint {
            config.provider = config.provider.with_base_url(endpoint.as_str());
        }
        if let Some(model) = &self.model {
            config.provider = config.provider.with_model(model.as_str());
        }
        config.shortcuts = parse_shortcuts(&self.shortcuts).map_err(|e| anyhow!(e))?;
        config.definition_language = self.definition_language.clone();
        Ok(config)
    }
}

fn credentials_for(config: &Config) -> CredentialStore {
    CredentialStore::new(
        Arc::new(JsonFileStorage::new(&config.storage_path)),
        config.provider.kind.key_name(),
    )
}

fn build_assistant(config: &Config, credentials: &CredentialStore) -> Result<Arc<Assistant>> {
    let provider = build_provider(config.provider.clone(), credentials.clone())
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(Assistant::new(
        provider,
        config.definition_language.clone(),
    )))
}

async fn ask(config: &Config, text: &str) -> Result<String> {
    let credentials = credentials_for(config);
    let dispatcher = Dispatcher::new(PageContext {
        overlay: Overlay::new(Arc::new(LogSurface)),
        assistant: build_assistant(config, &credentials)?,
        clipboard: headless_sink(),
        fallback_clipboard: Arc::new(NoClipboard),
        timings: config.timings,
    });

    let task = dispatcher
        .trigger(text)
        .ok_or_else(|| anyhow!(EMPTY_SELECTION_TEXT))?;
    task.await.context("Answer task failed")?;

    let overlay = dispatcher.overlay();
    match overlay.state() {
        OverlayState::ShowingResult => Ok(overlay.text()),
        _ => bail!("{}", overlay.text()),
    }
}

async fn manage_key(config: &Config, action: KeyAction) -> Result<()> {
    let credentials = credentials_for(config);
    match action {
        KeyAction::Set { value } => {
            let value = value.trim();
            if value.is_empty() {
                bail!("{}", browser::settings::EMPTY_KEY_ALERT);
            }
            credentials.set_key(value).await?;
            println!("Saved!");
        }
        KeyAction::Show => match credentials.get_key().await? {
            Some(key) => println!("{}: {}", credentials.key_name(), mask_secret(&key)),
            None => println!("{}: (not set)", credentials.key_name()),
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Some(Command::Ask { text }) => {
            let answer = runtime.block_on(ask(&config, &text.join(" ")))?;
            println!("{}", answer);
            Ok(())
        }
        Some(Command::Key { action }) => runtime.block_on(manage_key(&config, action)),
        command => {
            let url = match command {
                Some(Command::Run { url }) => url,
                _ => "https://en.wikipedia.org".to_string(),
            };
            info!(
                "Starting SyncFlo Answer ({} / {})",
                config.provider.kind, config.provider.model
            );
            let credentials = credentials_for(&config);
            let assistant = build_assistant(&config, &credentials)?;

            // The event loop must own the main thread (macOS requirement);
            // async work runs on the runtime's worker threads.
            browser::Browser::new(
                config,
                runtime.handle().clone(),
                assistant,
                credentials,
                browser::resolve_address(&url),
            )?
            .run()
        }
    }
}
