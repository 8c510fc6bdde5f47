//! Answer extractor port.
//!
//! Given the transcript and the field under discussion, the extractor
//! decides whether the respondent's latest message contains a valid
//! answer. Implementations typically prompt a model for a strict JSON
//! judgment; tests use scripted fakes.

use async_trait::async_trait;

use crate::domain::interview::{ExtractionResult, Field, TranscriptMessage};
use crate::ports::ai_provider::AiError;

/// Everything the extractor is allowed to see for one judgment.
///
/// Borrowed views into the conversation; the extractor never mutates
/// state.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    /// Static description of the form's purpose.
    pub form_overview: &'a str,
    /// Full transcript including the respondent's latest message.
    pub transcript: &'a [TranscriptMessage],
    /// The field the latest message is answering.
    pub current_field: &'a Field,
}

/// Port for answer extraction and validation.
///
/// "No valid answer found" is a successful extraction whose result has
/// `is_valid == false`; `Err` is reserved for infrastructure failures
/// (provider down, malformed model output).
#[async_trait]
pub trait AnswerExtractor: Send + Sync {
    /// Judges the respondent's latest message against the current field.
    async fn extract(&self, input: ExtractionInput<'_>) -> Result<ExtractionResult, AiError>;
}
