//! Interview orchestrator - the per-turn state machine.
//!
//! Each turn either opens a fresh conversation or processes one submitted
//! answer. Preconditions and the extraction judgment resolve before any
//! streaming starts, so precondition failures surface as plain errors.
//! Once a turn stream exists, a spawned task owns the conversation: it
//! forwards generated text to the consumer and, after the last fragment,
//! runs the completion hook (transcript append + persist) exactly once,
//! whether or not the consumer is still listening.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::foundation::{ConversationId, FieldId, StreamId};
use crate::ports::ai_provider::AiError;
use crate::ports::answer_extractor::{AnswerExtractor, ExtractionInput};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::question_generator::{QuestionGenerator, QuestionPrompt, QuestionTokenStream};

use super::conversation::Conversation;
use super::extraction::ExtractionResult;

/// Completion message used when the deployment does not configure one.
pub const DEFAULT_COMPLETION_MESSAGE: &str =
    "Thank you! You've completed the form. Your responses have been recorded.";

/// Buffered chunks between the turn task and a slow consumer.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// Errors that abort a turn before or during streaming.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("conversation {0} is already complete")]
    AlreadyComplete(ConversationId),

    #[error("answer text must not be empty")]
    EmptyAnswer,

    #[error("unknown field id '{0}'")]
    UnknownField(FieldId),

    #[error("conversation already has transcript messages")]
    TranscriptNotEmpty,

    #[error("conversation has no empty fields")]
    NoEmptyFields,

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("turn task aborted: {0}")]
    TurnAborted(String),
}

/// Which branch of the state machine this turn took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// First question of a fresh conversation.
    Opening,
    /// The answer was rejected; the same field is asked again.
    ReAsk,
    /// The answer was committed and the next field's question follows.
    Advance,
    /// The last field was committed; the conversation is finished.
    Complete,
}

/// Result of a finished turn: the mutated conversation, the full assistant
/// message that was streamed, and which branch was taken.
#[derive(Debug)]
pub struct TurnOutcome {
    pub conversation: Conversation,
    pub message: String,
    pub kind: TurnKind,
}

/// Wire envelope for one streamed fragment.
///
/// Every turn emits exactly one `TextStart`, zero or more `TextDelta`s in
/// generation order, and one `TextEnd`, all carrying the same stream id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundChunk {
    TextStart { stream_id: StreamId },
    TextDelta { stream_id: StreamId, delta: String },
    TextEnd { stream_id: StreamId },
}

/// Handle to one in-flight turn.
///
/// Implements [`Stream`] over [`OutboundChunk`]s for live forwarding.
/// Dropping the handle does not cancel the turn; the spawned task still
/// runs the completion hook and persists.
pub struct TurnStream {
    receiver: mpsc::Receiver<OutboundChunk>,
    handle: JoinHandle<Result<TurnOutcome, OrchestratorError>>,
}

impl TurnStream {
    /// Receives the next chunk, or `None` once streaming is over.
    pub async fn next_chunk(&mut self) -> Option<OutboundChunk> {
        self.receiver.recv().await
    }

    /// Drains remaining chunks and concatenates the text deltas.
    pub async fn collect_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.receiver.recv().await {
            if let OutboundChunk::TextDelta { delta, .. } = chunk {
                text.push_str(&delta);
            }
        }
        text
    }

    /// Waits for the turn task and returns its outcome.
    ///
    /// Drops the receiver first so a backpressured task can never deadlock
    /// against its own consumer.
    pub async fn finish(self) -> Result<TurnOutcome, OrchestratorError> {
        let TurnStream { receiver, handle } = self;
        drop(receiver);
        handle
            .await
            .map_err(|e| OrchestratorError::TurnAborted(e.to_string()))?
    }
}

impl Stream for TurnStream {
    type Item = OutboundChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// The conversation engine.
///
/// Owns no conversation state itself; each call takes a conversation
/// snapshot by value and hands the mutated copy back through the
/// [`TurnOutcome`].
pub struct InterviewOrchestrator {
    extractor: Arc<dyn AnswerExtractor>,
    generator: Arc<dyn QuestionGenerator>,
    store: Arc<dyn ConversationStore>,
    completion_message: String,
}

impl InterviewOrchestrator {
    pub fn new(
        extractor: Arc<dyn AnswerExtractor>,
        generator: Arc<dyn QuestionGenerator>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            extractor,
            generator,
            store,
            completion_message: DEFAULT_COMPLETION_MESSAGE.to_string(),
        }
    }

    /// Overrides the message streamed when the last field is committed.
    pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = message.into();
        self
    }

    /// Opens a fresh conversation by streaming the first question.
    ///
    /// The conversation must be active, have an empty transcript, and have
    /// at least one unfilled field.
    pub async fn initialize(
        &self,
        mut conversation: Conversation,
    ) -> Result<TurnStream, OrchestratorError> {
        if conversation.is_complete() {
            return Err(OrchestratorError::AlreadyComplete(conversation.id()));
        }
        if !conversation.transcript().is_empty() {
            return Err(OrchestratorError::TranscriptNotEmpty);
        }
        let first_id = conversation
            .next_empty_field()
            .map(|f| f.id().clone())
            .ok_or(OrchestratorError::NoEmptyFields)?;

        let tokens = {
            let field = conversation
                .field_by_id(&first_id)
                .ok_or_else(|| OrchestratorError::UnknownField(first_id.clone()))?;
            self.generator
                .generate_question(QuestionPrompt {
                    form_overview: conversation.form_overview(),
                    fields: conversation.fields(),
                    transcript: conversation.transcript(),
                    current_field: field,
                    is_first_question: true,
                })
                .await?
        };
        conversation.set_current_field(first_id);

        info!(conversation_id = %conversation.id(), "opening turn started");
        Ok(self.spawn_turn(conversation, tokens, TurnKind::Opening))
    }

    /// Processes one submitted answer for `field_id`.
    ///
    /// Exactly one of three branches runs: re-ask the same field, advance
    /// to the next empty field, or complete the conversation. Precondition
    /// and extraction failures return before any chunk is produced and
    /// leave durable state untouched.
    pub async fn process(
        &self,
        mut conversation: Conversation,
        answer_text: &str,
        field_id: &FieldId,
    ) -> Result<TurnStream, OrchestratorError> {
        if conversation.is_complete() {
            return Err(OrchestratorError::AlreadyComplete(conversation.id()));
        }
        let trimmed = answer_text.trim();
        if trimmed.is_empty() {
            return Err(OrchestratorError::EmptyAnswer);
        }
        let skips_extraction = conversation
            .field_by_id(field_id)
            .map(|f| f.configuration().skips_extraction())
            .ok_or_else(|| OrchestratorError::UnknownField(field_id.clone()))?;

        conversation.add_user_message(trimmed);
        conversation.set_current_field(field_id.clone());

        let extraction = if skips_extraction {
            ExtractionResult::accepted_verbatim(trimmed)
        } else {
            let field = conversation
                .field_by_id(field_id)
                .ok_or_else(|| OrchestratorError::UnknownField(field_id.clone()))?;
            self.extractor
                .extract(ExtractionInput {
                    form_overview: conversation.form_overview(),
                    transcript: conversation.transcript(),
                    current_field: field,
                })
                .await?
        };
        debug!(
            conversation_id = %conversation.id(),
            field_id = %field_id,
            is_valid = extraction.is_valid,
            confidence = extraction.confidence,
            "extraction verdict"
        );

        let accepted_answer = if extraction.is_valid {
            extraction.answer
        } else {
            None
        };

        match accepted_answer {
            None => {
                // Rejected: ask about the same field again, nothing committed.
                let tokens = {
                    let field = conversation
                        .field_by_id(field_id)
                        .ok_or_else(|| OrchestratorError::UnknownField(field_id.clone()))?;
                    self.generator
                        .generate_question(QuestionPrompt {
                            form_overview: conversation.form_overview(),
                            fields: conversation.fields(),
                            transcript: conversation.transcript(),
                            current_field: field,
                            is_first_question: false,
                        })
                        .await?
                };
                info!(conversation_id = %conversation.id(), field_id = %field_id, "re-ask turn started");
                Ok(self.spawn_turn(conversation, tokens, TurnKind::ReAsk))
            }
            Some(answer) => {
                conversation
                    .save_field_answer(field_id, answer)
                    .map_err(|_| OrchestratorError::UnknownField(field_id.clone()))?;

                let next_id = conversation.next_empty_field().map(|f| f.id().clone());
                match next_id {
                    Some(next_id) => {
                        let tokens = {
                            let next_field = conversation
                                .field_by_id(&next_id)
                                .ok_or_else(|| OrchestratorError::UnknownField(next_id.clone()))?;
                            self.generator
                                .generate_question(QuestionPrompt {
                                    form_overview: conversation.form_overview(),
                                    fields: conversation.fields(),
                                    transcript: conversation.transcript(),
                                    current_field: next_field,
                                    is_first_question: false,
                                })
                                .await?
                        };
                        conversation.set_current_field(next_id.clone());
                        info!(
                            conversation_id = %conversation.id(),
                            next_field_id = %next_id,
                            "advance turn started"
                        );
                        Ok(self.spawn_turn(conversation, tokens, TurnKind::Advance))
                    }
                    None => {
                        // Last field committed: no model call, the configured
                        // completion message streams as a single fragment.
                        conversation
                            .mark_complete()
                            .map_err(|_| OrchestratorError::AlreadyComplete(conversation.id()))?;
                        let message = self.completion_message.clone();
                        let tokens: QuestionTokenStream =
                            Box::pin(futures::stream::iter([Ok(message)]));
                        info!(conversation_id = %conversation.id(), "completion turn started");
                        Ok(self.spawn_turn(conversation, tokens, TurnKind::Complete))
                    }
                }
            }
        }
    }

    fn spawn_turn(
        &self,
        conversation: Conversation,
        tokens: QuestionTokenStream,
        kind: TurnKind,
    ) -> TurnStream {
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(run_turn(conversation, tokens, kind, store, tx));
        TurnStream {
            receiver: rx,
            handle,
        }
    }
}

/// Drives one turn to completion.
///
/// Owns the conversation for the duration of the turn. Send failures are
/// ignored so a dropped consumer never stops the turn; a token error
/// aborts the turn with durable state untouched. The completion hook
/// (assistant message + persist) runs after the last fragment, once.
async fn run_turn(
    mut conversation: Conversation,
    mut tokens: QuestionTokenStream,
    kind: TurnKind,
    store: Arc<dyn ConversationStore>,
    tx: mpsc::Sender<OutboundChunk>,
) -> Result<TurnOutcome, OrchestratorError> {
    let stream_id = StreamId::new();
    let _ = tx.send(OutboundChunk::TextStart { stream_id }).await;

    let mut message = String::new();
    while let Some(token) = tokens.next().await {
        let delta = token?;
        message.push_str(&delta);
        let _ = tx.send(OutboundChunk::TextDelta { stream_id, delta }).await;
    }
    let _ = tx.send(OutboundChunk::TextEnd { stream_id }).await;
    drop(tx);

    conversation.add_assistant_message(message.clone());

    // Persistence failures do not fail the turn; the respondent already
    // saw the message. The next turn re-reads durable state.
    match store.update(&conversation).await {
        Ok(()) => conversation.bump_revision(),
        Err(err) => warn!(
            conversation_id = %conversation.id(),
            error = %err,
            "failed to persist conversation after turn"
        ),
    }

    Ok(TurnOutcome {
        conversation,
        message,
        kind,
    })
}
