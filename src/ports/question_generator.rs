//! Question generator port.
//!
//! Produces the assistant's next utterance as a token stream so the
//! respondent sees text as it is generated.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::interview::{Field, TranscriptMessage};
use crate::ports::ai_provider::AiError;

/// Token stream for one generated question.
pub type QuestionTokenStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

/// Everything the generator is allowed to see when phrasing a question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionPrompt<'a> {
    /// Static description of the form's purpose.
    pub form_overview: &'a str,
    /// All fields with their current fill state, in interview order.
    pub fields: &'a [Field],
    /// Transcript so far.
    pub transcript: &'a [TranscriptMessage],
    /// The field the question should ask about.
    pub current_field: &'a Field,
    /// True for the opening question of a fresh conversation.
    pub is_first_question: bool,
}

/// Port for conversational question generation.
///
/// The stream yields text fragments in order; the caller accumulates them
/// into the transcript message. Errors mid-stream abort the turn.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Starts generating the next question for `prompt.current_field`.
    async fn generate_question(
        &self,
        prompt: QuestionPrompt<'_>,
    ) -> Result<QuestionTokenStream, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_generator_is_object_safe() {
        fn _accepts_dyn(_generator: &dyn QuestionGenerator) {}
    }
}
