//! Start-interview use case.
//!
//! Creates a conversation from a form definition, persists it, and opens
//! it with the streamed first question.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::foundation::{ConversationId, FormId, ValidationError};
use crate::domain::interview::{
    Conversation, Field, InterviewOrchestrator, OrchestratorError, TurnStream,
};
use crate::ports::{ConversationStore, StoreError};

#[derive(Debug, Error)]
pub enum StartInterviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Command to start a new interview.
#[derive(Debug)]
pub struct StartInterviewCommand {
    pub form_id: FormId,
    pub form_overview: String,
    pub fields: Vec<Field>,
}

/// Handler for starting interviews.
pub struct StartInterviewHandler {
    store: Arc<dyn ConversationStore>,
    orchestrator: Arc<InterviewOrchestrator>,
}

impl StartInterviewHandler {
    pub fn new(store: Arc<dyn ConversationStore>, orchestrator: Arc<InterviewOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Creates and opens a conversation.
    ///
    /// The conversation is durable before the first question streams, so
    /// a crashed opening turn leaves a resumable conversation behind.
    pub async fn handle(
        &self,
        command: StartInterviewCommand,
    ) -> Result<(ConversationId, TurnStream), StartInterviewError> {
        let conversation = Conversation::new(
            ConversationId::new(),
            command.form_id,
            command.form_overview,
            command.fields,
        )?;
        let conversation_id = conversation.id();

        self.store.create(&conversation).await?;
        info!(conversation_id = %conversation_id, form_id = %command.form_id, "interview started");

        let stream = self.orchestrator.initialize(conversation).await?;
        Ok((conversation_id, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAiProvider, ModelAnswerExtractor, ModelQuestionGenerator};
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::foundation::FieldId;
    use crate::domain::interview::{FieldConfiguration, TurnKind};
    use crate::ports::{AnswerExtractor, QuestionGenerator};

    fn handler_with(provider: MockAiProvider) -> (StartInterviewHandler, Arc<InMemoryConversationStore>) {
        let provider = Arc::new(provider);
        let store = Arc::new(InMemoryConversationStore::new());
        let orchestrator = Arc::new(InterviewOrchestrator::new(
            Arc::new(ModelAnswerExtractor::new(provider.clone())) as Arc<dyn AnswerExtractor>,
            Arc::new(ModelQuestionGenerator::new(provider)) as Arc<dyn QuestionGenerator>,
            store.clone() as Arc<dyn ConversationStore>,
        ));
        (
            StartInterviewHandler::new(store.clone() as Arc<dyn ConversationStore>, orchestrator),
            store,
        )
    }

    #[tokio::test]
    async fn creates_conversation_and_streams_first_question() {
        let (handler, store) =
            handler_with(MockAiProvider::new().with_response("What is your name?"));

        let (id, mut stream) = handler
            .handle(StartInterviewCommand {
                form_id: FormId::new(),
                form_overview: "Contact form".to_string(),
                fields: vec![Field::new(
                    FieldId::new("f-name").unwrap(),
                    "Name",
                    "The respondent's full name",
                    FieldConfiguration::Text,
                )],
            })
            .await
            .unwrap();

        let text = stream.collect_text().await;
        let outcome = stream.finish().await.unwrap();

        assert_eq!(text, "What is your name?");
        assert_eq!(outcome.kind, TurnKind::Opening);
        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.transcript().len(), 1);
    }

    #[tokio::test]
    async fn rejects_form_without_fields() {
        let (handler, store) = handler_with(MockAiProvider::new());

        let result = handler
            .handle(StartInterviewCommand {
                form_id: FormId::new(),
                form_overview: "Empty form".to_string(),
                fields: vec![],
            })
            .await;

        assert!(matches!(result, Err(StartInterviewError::Validation(_))));
        assert!(store.is_empty());
    }
}
