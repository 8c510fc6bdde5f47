//! Answer-field use case.
//!
//! Loads the durable conversation snapshot and runs one orchestrator turn
//! against the submitted answer.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::foundation::{ConversationId, FieldId};
use crate::domain::interview::{InterviewOrchestrator, OrchestratorError, TurnStream};
use crate::ports::{ConversationStore, StoreError};

#[derive(Debug, Error)]
pub enum AnswerFieldError {
    #[error("conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Command to process one submitted answer.
#[derive(Debug)]
pub struct AnswerFieldCommand {
    pub conversation_id: ConversationId,
    pub field_id: FieldId,
    pub answer_text: String,
}

/// Handler for answer turns.
pub struct AnswerFieldHandler {
    store: Arc<dyn ConversationStore>,
    orchestrator: Arc<InterviewOrchestrator>,
}

impl AnswerFieldHandler {
    pub fn new(store: Arc<dyn ConversationStore>, orchestrator: Arc<InterviewOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Runs one turn. Every turn starts from the durable snapshot, never
    /// from in-memory state of a previous turn.
    pub async fn handle(&self, command: AnswerFieldCommand) -> Result<TurnStream, AnswerFieldError> {
        let conversation = self
            .store
            .find_by_id(command.conversation_id)
            .await?
            .ok_or(AnswerFieldError::ConversationNotFound(command.conversation_id))?;

        info!(
            conversation_id = %command.conversation_id,
            field_id = %command.field_id,
            "answer turn requested"
        );

        let stream = self
            .orchestrator
            .process(conversation, &command.answer_text, &command.field_id)
            .await?;
        Ok(stream)
    }
}
