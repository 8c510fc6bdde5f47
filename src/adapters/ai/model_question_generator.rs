//! Model-backed question generator.
//!
//! Streams the next question from the provider, phrased against the form
//! overview, the fill state of every field, and the transcript so far.

use async_trait::async_trait;
use futures::StreamExt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::interview::{Field, FieldConfiguration, MessageRole};
use crate::ports::{
    AiError, AiProvider, CompletionRequest, PromptRole, QuestionGenerator, QuestionPrompt,
    QuestionTokenStream,
};

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 300;

/// Question generator that delegates phrasing to an AI provider.
pub struct ModelQuestionGenerator {
    provider: Arc<dyn AiProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl ModelQuestionGenerator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self {
            provider,
            temperature: GENERATION_TEMPERATURE,
            max_tokens: GENERATION_MAX_TOKENS,
        }
    }

    /// Overrides the generation temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Overrides the per-question token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn describe_field(field: &Field) -> String {
        let mut line = format!(
            "- {} ({}): {}",
            field.name(),
            field.configuration().kind_label(),
            field.description()
        );
        match field.configuration() {
            FieldConfiguration::MultipleChoice { options, .. } => {
                let _ = write!(line, " [options: {}]", options.join(", "));
            }
            FieldConfiguration::Rating { max_rating } => {
                let _ = write!(line, " [1 to {}]", max_rating);
            }
            _ => {}
        }
        if let Some(value) = field.value() {
            let _ = write!(line, " [answered: {}]", value);
        } else {
            line.push_str(" [unanswered]");
        }
        line
    }

    fn system_prompt(prompt: &QuestionPrompt<'_>) -> String {
        let field_lines: Vec<String> = prompt.fields.iter().map(Self::describe_field).collect();

        let framing = if prompt.is_first_question {
            "This is the opening of the conversation. Greet the respondent \
             briefly, then ask about the field."
        } else {
            "Continue the conversation naturally. Acknowledge what the \
             respondent just said when it helps, then ask about the field. \
             If their last message did not answer it, gently rephrase the \
             question instead of repeating it."
        };

        format!(
            "You are a friendly interviewer filling out a form one field at \
             a time.\n\
             \n\
             Form overview: {}\n\
             \n\
             Fields:\n{}\n\
             \n\
             Ask about exactly this field next: {} ({})\n\
             \n\
             {}\n\
             Ask one question only. Keep it short and conversational. Never \
             mention field names, JSON, or that you are an AI.",
            prompt.form_overview,
            field_lines.join("\n"),
            prompt.current_field.name(),
            prompt.current_field.description(),
            framing,
        )
    }
}

#[async_trait]
impl QuestionGenerator for ModelQuestionGenerator {
    async fn generate_question(
        &self,
        prompt: QuestionPrompt<'_>,
    ) -> Result<QuestionTokenStream, AiError> {
        let mut request = CompletionRequest::new()
            .with_system_prompt(Self::system_prompt(&prompt))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        for message in prompt.transcript {
            let role = match message.role {
                MessageRole::User => PromptRole::User,
                MessageRole::Assistant => PromptRole::Assistant,
            };
            request = request.with_message(role, message.content.clone());
        }

        let chunks = self.provider.stream_complete(request).await?;

        let tokens = chunks.filter_map(|item| async move {
            match item {
                Ok(chunk) if chunk.is_final() => None,
                Ok(chunk) => Some(Ok(chunk.delta)),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiProvider;
    use crate::domain::foundation::FieldId;
    use crate::domain::interview::TranscriptMessage;

    fn field(id: &str, name: &str, configuration: FieldConfiguration) -> Field {
        Field::new(
            FieldId::new(id).unwrap(),
            name,
            format!("{} of the respondent", name),
            configuration,
        )
    }

    async fn collect(mut tokens: QuestionTokenStream) -> String {
        let mut text = String::new();
        while let Some(token) = tokens.next().await {
            text.push_str(&token.unwrap());
        }
        text
    }

    #[tokio::test]
    async fn streams_question_text_without_final_marker() {
        let provider = Arc::new(MockAiProvider::new().with_response("What is your name?"));
        let generator = ModelQuestionGenerator::new(provider.clone());

        let fields = vec![field("f-name", "Name", FieldConfiguration::Text)];
        let transcript: Vec<TranscriptMessage> = vec![];
        let tokens = generator
            .generate_question(QuestionPrompt {
                form_overview: "Contact form",
                fields: &fields,
                transcript: &transcript,
                current_field: &fields[0],
                is_first_question: true,
            })
            .await
            .unwrap();

        assert_eq!(collect(tokens).await, "What is your name?");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_reflects_fill_state_and_options() {
        let provider = Arc::new(MockAiProvider::new().with_response("Pick a color?"));
        let generator = ModelQuestionGenerator::new(provider.clone());

        let mut name = field("f-name", "Name", FieldConfiguration::Text);
        name.set_value("John".to_string());
        let color = field(
            "f-color",
            "Favorite color",
            FieldConfiguration::MultipleChoice {
                options: vec!["Red".to_string(), "Blue".to_string()],
                allow_multiple: false,
            },
        );
        let fields = vec![name, color];
        let transcript = vec![
            TranscriptMessage::assistant("What is your name?"),
            TranscriptMessage::user("John"),
        ];

        generator
            .generate_question(QuestionPrompt {
                form_overview: "Preferences form",
                fields: &fields,
                transcript: &transcript,
                current_field: &fields[1],
                is_first_question: false,
            })
            .await
            .unwrap();

        let calls = provider.get_calls();
        let system = calls[0].system_prompt.as_deref().unwrap();
        assert!(system.contains("[answered: John]"));
        assert!(system.contains("[options: Red, Blue]"));
        assert!(system.contains("Favorite color"));
        assert!(!system.contains("opening of the conversation"));
        assert_eq!(calls[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn first_question_uses_opening_framing() {
        let provider = Arc::new(MockAiProvider::new().with_response("Hi! What is your name?"));
        let generator = ModelQuestionGenerator::new(provider.clone());

        let fields = vec![field("f-name", "Name", FieldConfiguration::Text)];
        let transcript: Vec<TranscriptMessage> = vec![];
        generator
            .generate_question(QuestionPrompt {
                form_overview: "Contact form",
                fields: &fields,
                transcript: &transcript,
                current_field: &fields[0],
                is_first_question: true,
            })
            .await
            .unwrap();

        let calls = provider.get_calls();
        let system = calls[0].system_prompt.as_deref().unwrap();
        assert!(system.contains("opening of the conversation"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(
            MockAiProvider::new().with_error(crate::adapters::ai::mock_provider::MockError::Unavailable {
                message: "down".to_string(),
            }),
        );
        let generator = ModelQuestionGenerator::new(provider);

        let fields = vec![field("f-name", "Name", FieldConfiguration::Text)];
        let transcript: Vec<TranscriptMessage> = vec![];
        let result = generator
            .generate_question(QuestionPrompt {
                form_overview: "Contact form",
                fields: &fields,
                transcript: &transcript,
                current_field: &fields[0],
                is_first_question: true,
            })
            .await;

        assert!(matches!(result, Err(AiError::Unavailable { .. })));
    }
}
