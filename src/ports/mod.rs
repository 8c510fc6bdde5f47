//! Ports - interfaces between the domain and the outside world.
//!
//! The orchestrator only ever talks to these traits. Adapters implement
//! them over HTTP APIs, Postgres, or in-memory fakes for tests.

pub mod ai_provider;
pub mod answer_extractor;
pub mod conversation_store;
pub mod question_generator;

pub use ai_provider::{
    AiError, AiProvider, CompletionRequest, CompletionResponse, FinishReason, PromptMessage,
    PromptRole, ProviderInfo, StreamChunk,
};
pub use answer_extractor::{AnswerExtractor, ExtractionInput};
pub use conversation_store::{ConversationStore, StoreError};
pub use question_generator::{QuestionGenerator, QuestionPrompt, QuestionTokenStream};
