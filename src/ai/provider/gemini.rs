use super::{upstream_error, AnswerProvider, ProviderSettings};
use crate::error::LookupError;
use crate::storage::CredentialStore;
use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// `POST {base}/{model}:generateContent?key=...`
pub struct GeminiProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    credentials: CredentialStore,
}

impl GeminiProvider {
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
        format!(
            "{}/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }
}

#[async_trait]
impl AnswerProvider for GeminiProvider {
    fn id(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, instruction: &str) -> Result<String, LookupError> {
        let api_key = self.credentials.require().await?;

        // The instruction rides along in the single user turn.
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: format!("{}\n\n{}", instruction, prompt),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.params.temperature,
                max_output_tokens: self.settings.params.max_tokens,
            },
        };

        info!("Gemini generateContent: model={}", self.settings.model);
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the URL, which carries the key.
                let e = e.without_url();
                error!("Gemini request failed: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;
        debug!("Gemini response status: {}", status);

        if !status.is_success() {
            error!("Gemini API error: status={}, body={}", status, body);
            return Err(upstream_error(status, &body));
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&body).map_err(|_| LookupError::MalformedResponse)?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|text| text.trim().to_string())
            .ok_or(LookupError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ProviderKind;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer, key: Option<&str>) -> GeminiProvider {
        let credentials = CredentialStore::new(Arc::new(MemoryStorage::new()), "geminiApiKey");
        if let Some(key) = key {
            credentials.set_key(key).await.unwrap();
        }
        let settings = ProviderSettings::new(ProviderKind::Gemini)
            .with_base_url(format!("{}/v1beta/models", server.uri()));
        GeminiProvider::new(reqwest::Client::new(), settings, credentials)
    }

    #[tokio::test]
    async fn extracts_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "AIza-test"))
            .and(body_partial_json(json!({
                "generationConfig": {"maxOutputTokens": 150}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "\n True \n"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("AIza-test")).await;
        assert_eq!(provider.generate("q", "i").await.unwrap(), "True");
    }

    #[tokio::test]
    async fn missing_key_never_hits_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None).await;
        assert!(matches!(
            provider.generate("q", "i").await,
            Err(LookupError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn upstream_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "bad key", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("nope")).await;
        let err = provider.generate("q", "i").await.unwrap_err();
        assert!(matches!(err, LookupError::UpstreamError(m) if m == "bad key"));
    }

    #[tokio::test]
    async fn candidate_without_parts_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": []}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("k")).await;
        assert!(matches!(
            provider.generate("q", "i").await,
            Err(LookupError::MalformedResponse)
        ));
    }
}
