use super::{upstream_error, AnswerProvider, ProviderSettings};
use crate::error::LookupError;
use crate::storage::CredentialStore;
use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// `POST {base}/chat/completions` with bearer auth.
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    credentials: CredentialStore,
}

impl ChatCompletionsProvider {
    pub fn new(
        client: reqwest::Client,
        settings: ProviderSettings,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            client,
            settings,
            credentials,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }
}

#[async_trait]
impl AnswerProvider for ChatCompletionsProvider {
    fn id(&self) -> &'static str {
        "groq"
    }

    async fn generate(&self, prompt: &str, instruction: &str) -> Result<String, LookupError> {
        let api_key = self.credentials.require().await?;

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.params.temperature,
            max_tokens: self.settings.params.max_tokens,
        };

        info!("Chat completion request: model={}", self.settings.model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Chat completion response status: {}", status);

        if !status.is_success() {
            error!("Chat completion error: status={}, body={}", status, body);
            return Err(upstream_error(status, &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|_| LookupError::MalformedResponse)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .ok_or(LookupError::MalformedResponse)
    }
}
