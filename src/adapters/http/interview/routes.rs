//! Axum routes for interview endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{answer_conversation, create_conversation, InterviewAppState};

/// Creates routes for interview endpoints.
///
/// - POST /conversations - create a conversation, stream the opening question
/// - POST /conversations/:conversation_id/messages - submit an answer, stream the reply
pub fn interview_routes() -> Router<InterviewAppState> {
    Router::new()
        .route("/conversations", post(create_conversation))
        .route(
            "/conversations/:conversation_id/messages",
            post(answer_conversation),
        )
}

/// Combined router with all interview routes under /api.
pub fn interview_router() -> Router<InterviewAppState> {
    Router::new().nest("/api", interview_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::adapters::ai::{MockAiProvider, ModelAnswerExtractor, ModelQuestionGenerator};
    use crate::adapters::http::app_router;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::application::handlers::{AnswerFieldHandler, StartInterviewHandler};
    use crate::domain::interview::InterviewOrchestrator;
    use crate::ports::{AnswerExtractor, ConversationStore, QuestionGenerator};

    fn test_state(provider: MockAiProvider) -> InterviewAppState {
        let provider = Arc::new(provider);
        let store =
            Arc::new(InMemoryConversationStore::new()) as Arc<dyn ConversationStore>;
        let orchestrator = Arc::new(InterviewOrchestrator::new(
            Arc::new(ModelAnswerExtractor::new(provider.clone())) as Arc<dyn AnswerExtractor>,
            Arc::new(ModelQuestionGenerator::new(provider)) as Arc<dyn QuestionGenerator>,
            store.clone(),
        ));
        InterviewAppState::new(
            Arc::new(StartInterviewHandler::new(store.clone(), orchestrator.clone())),
            Arc::new(AnswerFieldHandler::new(store, orchestrator)),
        )
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = app_router(test_state(MockAiProvider::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_conversation_opens_an_event_stream() {
        let app = app_router(test_state(
            MockAiProvider::new().with_response("What is your name?"),
        ));

        let body = serde_json::json!({
            "form_id": Uuid::new_v4(),
            "form_overview": "Contact form",
            "fields": [
                {"id": "f-name", "name": "Name", "description": "Full name", "input_type": "text"}
            ]
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/conversations")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/event-stream"));
    }

    #[tokio::test]
    async fn answering_an_unknown_conversation_returns_not_found() {
        let app = app_router(test_state(MockAiProvider::new()));

        let body = serde_json::json!({
            "field_id": "f-name",
            "answer_text": "John"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/conversations/{}/messages", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
