use crate::ai::processor::clean_answer;
use crate::ai::prompt::Prompt;
use crate::ai::provider::AnswerProvider;
use crate::error::LookupError;
use log::debug;
use std::sync::Arc;

/// Classify a selection, build its prompt, ask the provider.
pub struct Assistant {
    provider: Arc<dyn AnswerProvider>,
    definition_language: String,
}

impl Assistant {
    pub fn new(provider: Arc<dyn AnswerProvider>, definition_language: impl Into<String>) -> Self {
        Self {
            provider,
            definition_language: definition_language.into(),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub async fn answer(&self, selection: &str) -> Result<String, LookupError> {
        let prompt = Prompt::for_selection(selection, &self.definition_language);
        debug!(
            "Asking {} ({:?}, {} chars)",
            self.provider.id(),
            prompt.kind,
            selection.len()
        );
        let raw = self.provider.generate(&prompt.text, prompt.instruction).await?;
        Ok(clean_answer(&raw))
    }
}
