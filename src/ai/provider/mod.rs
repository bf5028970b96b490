pub mod gemini;
pub mod openai;

use crate::error::LookupError;
use crate::storage::CredentialStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub use gemini::GeminiProvider;
pub use openai::ChatCompletionsProvider;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Something that turns a prompt into one short textual answer.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Returns the trimmed answer text, or why there is none.
    async fn generate(&self, prompt: &str, instruction: &str) -> Result<String, LookupError>;
}

/// Fixed sampling settings: low randomness, short output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (Groq).
    Groq,
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" | "openai" => Ok(ProviderKind::Groq),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

impl ProviderKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.2-90b-vision-preview",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }

    /// Storage key the provider's API key lives under.
    pub fn key_name(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groqApiKey",
            ProviderKind::Gemini => "geminiApiKey",
        }
    }
}

/// Endpoint and model for one provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub params: GenerationParams,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
            model: kind.default_model().to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

pub fn build_provider(
    settings: ProviderSettings,
    credentials: CredentialStore,
) -> Result<Arc<dyn AnswerProvider>, LookupError> {
    let client = http_client()?;
    Ok(match settings.kind {
        ProviderKind::Groq => Arc::new(ChatCompletionsProvider::new(client, settings, credentials)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client, settings, credentials)),
    })
}

pub(crate) fn http_client() -> Result<reqwest::Client, LookupError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Both providers report failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

pub(crate) fn upstream_error(status: StatusCode, body: &str) -> LookupError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed ({})", status));
    LookupError::UpstreamError(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn upstream_error_prefers_body_message() {
        let err = upstream_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"bad key"}}"#,
        );
        assert!(matches!(err, LookupError::UpstreamError(m) if m == "bad key"));
    }

    #[test]
    fn upstream_error_falls_back_to_status() {
        let err = upstream_error(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, LookupError::UpstreamError(m) if m.contains("502")));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let settings = ProviderSettings::new(ProviderKind::Groq).with_base_url("http://x/v1/");
        assert_eq!(settings.base_url, "http://x/v1");
    }
}
