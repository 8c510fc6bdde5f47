//! End-to-end interview flow against the mock provider.
//!
//! Exercises a whole conversation through the real orchestrator, the
//! model-backed extractor and generator, and the in-memory store: opening
//! question, valid answer, rejected answer, re-ask, bypassed choice field,
//! and completion.

use std::sync::Arc;

use formflow::adapters::ai::{
    mock_provider::MockError, MockAiProvider, ModelAnswerExtractor, ModelQuestionGenerator,
};
use formflow::adapters::storage::InMemoryConversationStore;
use formflow::domain::foundation::{ConversationId, FieldId, FormId};
use formflow::domain::interview::{
    Conversation, Field, FieldConfiguration, InterviewOrchestrator, OrchestratorError, TurnKind,
};
use formflow::ports::{AnswerExtractor, ConversationStore, QuestionGenerator};

fn contact_form_fields() -> Vec<Field> {
    vec![
        Field::new(
            FieldId::new("f-name").unwrap(),
            "Name",
            "The respondent's full name",
            FieldConfiguration::Text,
        ),
        Field::new(
            FieldId::new("f-age").unwrap(),
            "Age",
            "The respondent's age in years",
            FieldConfiguration::Text,
        ),
        Field::new(
            FieldId::new("f-color").unwrap(),
            "Favorite color",
            "Preferred color for the product",
            FieldConfiguration::MultipleChoice {
                options: vec!["Red".to_string(), "Blue".to_string()],
                allow_multiple: false,
            },
        ),
    ]
}

fn build_engine(
    provider: MockAiProvider,
) -> (
    InterviewOrchestrator,
    Arc<MockAiProvider>,
    Arc<InMemoryConversationStore>,
) {
    let provider = Arc::new(provider);
    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = InterviewOrchestrator::new(
        Arc::new(ModelAnswerExtractor::new(provider.clone())) as Arc<dyn AnswerExtractor>,
        Arc::new(ModelQuestionGenerator::new(provider.clone())) as Arc<dyn QuestionGenerator>,
        store.clone() as Arc<dyn ConversationStore>,
    )
    .with_completion_message("Thanks, that's everything we needed!");
    (orchestrator, provider, store)
}

#[tokio::test]
async fn full_interview_runs_to_completion() {
    let provider = MockAiProvider::new()
        // opening question
        .with_response("Hi! What's your name?")
        // name extraction, then next question
        .with_response(r#"{"answer": "John", "is_valid": true, "confidence": 0.95, "reasoning": "stated name"}"#)
        .with_response("Thanks John! How old are you?")
        // off-topic age answer, then re-ask
        .with_response(r#"{"answer": null, "is_valid": false, "confidence": 0.2, "reasoning": "no age given"}"#)
        .with_response("Could you give me your age as a number?")
        // valid age, then next question
        .with_response(r#"{"answer": "30", "is_valid": true, "confidence": 0.9, "reasoning": "numeric age"}"#)
        .with_response("Great! What's your favorite color, Red or Blue?");

    let (orchestrator, provider, store) = build_engine(provider);

    let conversation = Conversation::new(
        ConversationId::new(),
        FormId::new(),
        "A short contact form collecting name, age, and color preference",
        contact_form_fields(),
    )
    .unwrap();
    let id = conversation.id();
    store.create(&conversation).await.unwrap();

    // Turn 1: opening.
    let mut turn = orchestrator.initialize(conversation).await.unwrap();
    let text = turn.collect_text().await;
    let outcome = turn.finish().await.unwrap();
    assert_eq!(text, "Hi! What's your name?");
    assert_eq!(outcome.kind, TurnKind::Opening);

    // Turn 2: valid name answer advances to age.
    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let name_id = FieldId::new("f-name").unwrap();
    let turn = orchestrator
        .process(conversation, "My name is John", &name_id)
        .await
        .unwrap();
    let outcome = turn.finish().await.unwrap();
    assert_eq!(outcome.kind, TurnKind::Advance);
    assert_eq!(outcome.message, "Thanks John! How old are you?");
    assert_eq!(
        outcome.conversation.field_by_id(&name_id).unwrap().value(),
        Some("John")
    );

    // Turn 3: off-topic answer re-asks the age field.
    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let age_id = FieldId::new("f-age").unwrap();
    let turn = orchestrator
        .process(conversation, "old enough, haha", &age_id)
        .await
        .unwrap();
    let outcome = turn.finish().await.unwrap();
    assert_eq!(outcome.kind, TurnKind::ReAsk);
    assert!(!outcome.conversation.field_by_id(&age_id).unwrap().is_filled());

    // Turn 4: valid age advances to the choice field.
    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let turn = orchestrator
        .process(conversation, "I'm 30", &age_id)
        .await
        .unwrap();
    let outcome = turn.finish().await.unwrap();
    assert_eq!(outcome.kind, TurnKind::Advance);
    assert_eq!(
        outcome.conversation.field_by_id(&age_id).unwrap().value(),
        Some("30")
    );

    // Turn 5: single-choice bypasses extraction and completes the form.
    let calls_before = provider.call_count();
    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let color_id = FieldId::new("f-color").unwrap();
    let mut turn = orchestrator
        .process(conversation, "Blue", &color_id)
        .await
        .unwrap();
    let text = turn.collect_text().await;
    let outcome = turn.finish().await.unwrap();

    assert_eq!(text, "Thanks, that's everything we needed!");
    assert_eq!(outcome.kind, TurnKind::Complete);
    assert!(outcome.conversation.is_complete());
    // No extraction and no generation for the final bypassed answer.
    assert_eq!(provider.call_count(), calls_before);

    // Durable state reflects the finished interview.
    let stored = store.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.is_complete());
    assert!(stored.fields().iter().all(|f| f.is_filled()));
    assert_eq!(
        stored.field_by_id(&color_id).unwrap().value(),
        Some("Blue")
    );
    // One assistant + one user message per answer turn, plus the opening
    // and completion messages.
    assert_eq!(stored.transcript().len(), 9);
    assert_eq!(stored.user_message_count(), 4);
    assert_eq!(stored.revision(), 5);
}

#[tokio::test]
async fn provider_outage_fails_the_turn_without_mutating_state() {
    let provider = MockAiProvider::new()
        .with_response("Hi! What's your name?")
        .with_error(MockError::Unavailable {
            message: "provider down".to_string(),
        });
    let (orchestrator, _provider, store) = build_engine(provider);

    let conversation = Conversation::new(
        ConversationId::new(),
        FormId::new(),
        "A short contact form",
        contact_form_fields(),
    )
    .unwrap();
    let id = conversation.id();
    store.create(&conversation).await.unwrap();

    let turn = orchestrator.initialize(conversation).await.unwrap();
    turn.finish().await.unwrap();

    // Extraction fails before any streaming; the durable snapshot keeps
    // its previous transcript.
    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let name_id = FieldId::new("f-name").unwrap();
    let result = orchestrator
        .process(conversation, "My name is John", &name_id)
        .await;
    assert!(matches!(result, Err(OrchestratorError::Ai(_))));

    let stored = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.transcript().len(), 1);
    assert!(!stored.field_by_id(&name_id).unwrap().is_filled());
}

#[tokio::test]
async fn completed_conversations_reject_further_answers() {
    let provider = MockAiProvider::new().with_response("Hi! Pick a color?");
    let (orchestrator, _provider, store) = build_engine(provider);

    let conversation = Conversation::new(
        ConversationId::new(),
        FormId::new(),
        "Single-field form",
        vec![Field::new(
            FieldId::new("f-color").unwrap(),
            "Favorite color",
            "Preferred color",
            FieldConfiguration::MultipleChoice {
                options: vec!["Red".to_string(), "Blue".to_string()],
                allow_multiple: false,
            },
        )],
    )
    .unwrap();
    let id = conversation.id();
    store.create(&conversation).await.unwrap();

    let turn = orchestrator.initialize(conversation).await.unwrap();
    turn.finish().await.unwrap();

    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let color_id = FieldId::new("f-color").unwrap();
    let turn = orchestrator
        .process(conversation, "Blue", &color_id)
        .await
        .unwrap();
    let outcome = turn.finish().await.unwrap();
    assert_eq!(outcome.kind, TurnKind::Complete);

    let conversation = store.find_by_id(id).await.unwrap().unwrap();
    let result = orchestrator.process(conversation, "Red", &color_id).await;
    assert!(matches!(result, Err(OrchestratorError::AlreadyComplete(_))));
}
