use crate::ai::prompt::DEFAULT_DEFINITION_LANGUAGE;
use crate::ai::provider::{ProviderKind, ProviderSettings};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SHORTCUTS: &str = "ctrl+q,alt+x";

/// How long each outcome stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub empty_selection: Duration,
    pub success: Duration,
    pub error: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            empty_selection: Duration::from_millis(1500),
            success: Duration::from_millis(3000),
            error: Duration::from_millis(5000),
        }
    }
}

/// A keyboard shortcut: modifiers plus one key, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: String,
}

impl std::str::FromStr for Chord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chord = Chord {
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            key: String::new(),
        };
        for part in s.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                "" => return Err(format!("Empty key in shortcut '{}'", s)),
                key if chord.key.is_empty() => chord.key = key.to_string(),
                _ => return Err(format!("Shortcut '{}' names more than one key", s)),
            }
        }
        if chord.key.is_empty() {
            return Err(format!("Shortcut '{}' has no key", s));
        }
        Ok(chord)
    }
}

impl std::fmt::Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (on, name) in [
            (self.ctrl, "Ctrl+"),
            (self.alt, "Alt+"),
            (self.shift, "Shift+"),
            (self.meta, "Meta+"),
        ] {
            if on {
                write!(f, "{}", name)?;
            }
        }
        write!(f, "{}", self.key.to_uppercase())
    }
}

/// Parse a comma-separated chord list such as `ctrl+q,alt+x`.
pub fn parse_shortcuts(list: &str) -> Result<Vec<Chord>, String> {
    let chords = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Chord>, _>>()?;
    if chords.is_empty() {
        return Err("At least one shortcut is required".to_string());
    }
    Ok(chords)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderSettings,
    pub storage_path: PathBuf,
    pub shortcuts: Vec<Chord>,
    pub definition_language: String,
    pub timings: Timings,
}

impl Config {
    pub fn new(provider: ProviderKind, storage_path: PathBuf) -> Self {
        Self {
            provider: ProviderSettings::new(provider),
            storage_path,
            shortcuts: parse_shortcuts(DEFAULT_SHORTCUTS).unwrap_or_default(),
            definition_language: DEFAULT_DEFINITION_LANGUAGE.to_string(),
            timings: Timings::default(),
        }
    }
}
