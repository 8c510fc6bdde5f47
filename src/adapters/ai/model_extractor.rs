//! Model-backed answer extractor.
//!
//! Prompts the provider for a strict JSON judgment of the respondent's
//! latest message, then parses it with the tolerant extraction parser.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::interview::{parse_extraction_response, ExtractionResult, Field, MessageRole};
use crate::ports::{
    AiError, AiProvider, AnswerExtractor, CompletionRequest, ExtractionInput, PromptRole,
};

const EXTRACTION_TEMPERATURE: f32 = 0.0;
const EXTRACTION_MAX_TOKENS: u32 = 500;

/// Answer extractor that delegates the judgment to an AI provider.
pub struct ModelAnswerExtractor {
    provider: Arc<dyn AiProvider>,
}

impl ModelAnswerExtractor {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    fn system_prompt(form_overview: &str, field: &Field) -> String {
        let configuration = serde_json::to_string(field.configuration())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "You are validating answers collected by a conversational form.\n\
             \n\
             Form overview: {}\n\
             \n\
             The respondent's latest message should answer this field:\n\
             - name: {}\n\
             - description: {}\n\
             - configuration: {}\n\
             \n\
             Decide whether the latest user message contains a valid answer \
             for this field. Respond with ONLY a JSON object, no prose, in \
             this exact shape:\n\
             {{\"answer\": string or null, \"is_valid\": boolean, \
             \"confidence\": number between 0 and 1, \"reasoning\": string}}\n\
             \n\
             If the message does not answer the field, set answer to null \
             and is_valid to false. Extract the answer as a concise value, \
             not the whole message.",
            form_overview,
            field.name(),
            field.description(),
            configuration,
        )
    }
}

#[async_trait]
impl AnswerExtractor for ModelAnswerExtractor {
    async fn extract(&self, input: ExtractionInput<'_>) -> Result<ExtractionResult, AiError> {
        let mut request = CompletionRequest::new()
            .with_system_prompt(Self::system_prompt(input.form_overview, input.current_field))
            .with_temperature(EXTRACTION_TEMPERATURE)
            .with_max_tokens(EXTRACTION_MAX_TOKENS);

        for message in input.transcript {
            let role = match message.role {
                MessageRole::User => PromptRole::User,
                MessageRole::Assistant => PromptRole::Assistant,
            };
            request = request.with_message(role, message.content.clone());
        }

        let response = self.provider.complete(request).await?;
        parse_extraction_response(&response.content).map_err(|e| AiError::parse(e.to_string()))
    }
}
