//! Interview domain - the conversation orchestration core.
//!
//! A conversation walks an ordered list of fields. Each turn the
//! orchestrator decides whether the respondent's latest message validly
//! answers the current field, then streams back either a follow-up
//! question, the next field's question, or a completion message.

mod conversation;
mod extraction;
mod field;
mod orchestrator;
mod transcript;

pub use conversation::{Conversation, ConversationError};
pub use extraction::{parse_extraction_response, ExtractionParseError, ExtractionResult};
pub use field::{Field, FieldConfiguration};
pub use orchestrator::{
    InterviewOrchestrator, OrchestratorError, OutboundChunk, TurnKind, TurnOutcome, TurnStream,
    DEFAULT_COMPLETION_MESSAGE,
};
pub use transcript::{MessageRole, TranscriptMessage};
