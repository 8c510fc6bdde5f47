//! HTTP handlers for interview endpoints.
//!
//! Turns stream to the client as Server-Sent Events: one `chunk` event per
//! outbound fragment, then a closing `done` event (or `error` if the turn
//! aborted mid-stream). Failures before streaming map to plain JSON error
//! responses.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream, StreamExt};
use tracing::error;
use uuid::Uuid;

use crate::application::handlers::{
    AnswerFieldCommand, AnswerFieldError, AnswerFieldHandler, StartInterviewCommand,
    StartInterviewError, StartInterviewHandler,
};
use crate::domain::foundation::{ConversationId, FieldId};
use crate::domain::interview::{OrchestratorError, TurnStream};

use super::dto::{
    AnswerRequest, ConversationCreatedEvent, CreateConversationRequest, ErrorResponse,
    TurnDoneEvent, TurnErrorEvent,
};

/// Shared application state for interview handlers.
#[derive(Clone)]
pub struct InterviewAppState {
    pub start_handler: Arc<StartInterviewHandler>,
    pub answer_handler: Arc<AnswerFieldHandler>,
}

impl InterviewAppState {
    pub fn new(
        start_handler: Arc<StartInterviewHandler>,
        answer_handler: Arc<AnswerFieldHandler>,
    ) -> Self {
        Self {
            start_handler,
            answer_handler,
        }
    }
}

/// API error with an HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::AlreadyComplete(_) => ApiError::Conflict(err.to_string()),
            OrchestratorError::EmptyAnswer
            | OrchestratorError::UnknownField(_)
            | OrchestratorError::TranscriptNotEmpty
            | OrchestratorError::NoEmptyFields => ApiError::BadRequest(err.to_string()),
            OrchestratorError::Ai(_) => ApiError::Upstream(err.to_string()),
            OrchestratorError::TurnAborted(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StartInterviewError> for ApiError {
    fn from(err: StartInterviewError) -> Self {
        match err {
            StartInterviewError::Validation(e) => ApiError::BadRequest(e.to_string()),
            StartInterviewError::Store(e) => ApiError::Internal(e.to_string()),
            StartInterviewError::Orchestrator(e) => e.into(),
        }
    }
}

impl From<AnswerFieldError> for ApiError {
    fn from(err: AnswerFieldError) -> Self {
        match err {
            AnswerFieldError::ConversationNotFound(id) => {
                ApiError::NotFound(format!("conversation {} not found", id))
            }
            AnswerFieldError::Store(e) => ApiError::Internal(e.to_string()),
            AnswerFieldError::Orchestrator(e) => e.into(),
        }
    }
}

/// POST /api/conversations - create a conversation and stream the opening
/// question.
///
/// The SSE stream opens with a `conversation` event carrying the new id.
pub async fn create_conversation(
    State(state): State<InterviewAppState>,
    Json(request): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form_id = request.form_id();
    let mut fields = Vec::with_capacity(request.fields.len());
    for dto in request.fields {
        fields.push(dto.into_field().map_err(|e| ApiError::BadRequest(e.to_string()))?);
    }

    let (conversation_id, turn) = state
        .start_handler
        .handle(StartInterviewCommand {
            form_id,
            form_overview: request.form_overview,
            fields,
        })
        .await?;

    let created = json_event(
        "conversation",
        &ConversationCreatedEvent {
            conversation_id: conversation_id.as_uuid(),
        },
    );
    let events = stream::once(async move { Ok(created) }).chain(turn_events(turn));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// POST /api/conversations/{id}/messages - submit an answer and stream the
/// assistant's reply.
pub async fn answer_conversation(
    State(state): State<InterviewAppState>,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let field_id =
        FieldId::new(request.field_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let turn = state
        .answer_handler
        .handle(AnswerFieldCommand {
            conversation_id: ConversationId::from_uuid(conversation_id),
            field_id,
            answer_text: request.answer_text,
        })
        .await?;

    Ok(Sse::new(turn_events(turn).boxed()).keep_alive(KeepAlive::default()))
}

/// Adapts a turn into SSE events: `chunk`* then `done`, or `error` if the
/// turn aborted mid-stream.
fn turn_events(turn: TurnStream) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    enum Phase {
        Streaming(TurnStream),
        Finished,
    }

    stream::unfold(Phase::Streaming(turn), |phase| async move {
        match phase {
            Phase::Streaming(mut turn) => match turn.next_chunk().await {
                Some(chunk) => {
                    let event = json_event("chunk", &chunk);
                    Some((Ok(event), Phase::Streaming(turn)))
                }
                None => {
                    let event = match turn.finish().await {
                        Ok(outcome) => json_event(
                            "done",
                            &TurnDoneEvent {
                                kind: outcome.kind,
                                conversation_complete: outcome.conversation.is_complete(),
                            },
                        ),
                        Err(err) => {
                            error!(error = %err, "turn aborted mid-stream");
                            json_event(
                                "error",
                                &TurnErrorEvent {
                                    message: err.to_string(),
                                },
                            )
                        }
                    };
                    Some((Ok(event), Phase::Finished))
                }
            },
            Phase::Finished => None,
        }
    })
}

fn json_event<T: serde::Serialize>(name: &str, payload: &T) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}
