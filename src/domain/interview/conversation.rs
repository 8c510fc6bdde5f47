//! Conversation aggregate - the authoritative in-memory snapshot for one turn.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ConversationId, FieldId, FormId, Timestamp, ValidationError};

use super::field::Field;
use super::transcript::{MessageRole, TranscriptMessage};

/// Errors raised by conversation state mutations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversationError {
    #[error("Unknown field id '{0}'")]
    UnknownField(FieldId),

    #[error("Conversation {0} is already complete")]
    AlreadyComplete(ConversationId),
}

/// Aggregate root for one respondent filling one form.
///
/// The orchestrator exclusively owns and mutates the in-memory copy during
/// a turn; the conversation store owns the durable copy across turns. The
/// lifecycle has exactly two states: active (`is_in_progress == true`,
/// `finished_at == None`) and complete (`is_in_progress == false`,
/// `finished_at` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    form_id: FormId,
    form_overview: String,
    fields: Vec<Field>,
    transcript: Vec<TranscriptMessage>,
    is_in_progress: bool,
    finished_at: Option<Timestamp>,
    current_field_id: Option<FieldId>,
    revision: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Creates a fresh conversation with all fields unfilled and an empty
    /// transcript. Field order is the interview order and never changes.
    pub fn new(
        id: ConversationId,
        form_id: FormId,
        form_overview: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Self, ValidationError> {
        if fields.is_empty() {
            return Err(ValidationError::empty_field("fields"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id,
            form_id,
            form_overview: form_overview.into(),
            fields,
            transcript: Vec::new(),
            is_in_progress: true,
            finished_at: None,
            current_field_id: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn form_id(&self) -> FormId {
        self.form_id
    }

    /// Static text describing the form's purpose; read-only input to both
    /// AI collaborators.
    pub fn form_overview(&self) -> &str {
        &self.form_overview
    }

    /// Fields in fixed interview order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The append-only message log.
    pub fn transcript(&self) -> &[TranscriptMessage] {
        &self.transcript
    }

    /// The field recorded as under discussion in the latest turn.
    pub fn current_field_id(&self) -> Option<&FieldId> {
        self.current_field_id.as_ref()
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    /// Revision of the durable copy this snapshot was loaded from; the
    /// store uses it for optimistic concurrency.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// First field in stored order with no committed value.
    ///
    /// Deterministic: always the stored order, never the field most
    /// recently discussed.
    pub fn next_empty_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| !f.is_filled())
    }

    /// Looks up a field by id.
    pub fn field_by_id(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Commits an accepted answer. A committed value is never cleared;
    /// corrections happen by re-asking before acceptance.
    pub fn save_field_answer(
        &mut self,
        id: &FieldId,
        value: String,
    ) -> Result<(), ConversationError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or_else(|| ConversationError::UnknownField(id.clone()))?;
        field.set_value(value);
        self.touch();
        Ok(())
    }

    /// Appends a respondent message to the transcript.
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.transcript.push(TranscriptMessage::user(content));
        self.touch();
    }

    /// Appends an assistant message to the transcript.
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.transcript.push(TranscriptMessage::assistant(content));
        self.touch();
    }

    /// Records which field the latest turn is answering, so a resumed or
    /// retried turn knows what was under discussion.
    pub fn set_current_field(&mut self, id: FieldId) {
        self.current_field_id = Some(id);
        self.touch();
    }

    /// Transitions to the terminal state. Calling this on an already
    /// complete conversation is a logic error, not a supported no-op.
    pub fn mark_complete(&mut self) -> Result<(), ConversationError> {
        if !self.is_in_progress {
            return Err(ConversationError::AlreadyComplete(self.id));
        }
        self.is_in_progress = false;
        self.finished_at = Some(Timestamp::now());
        self.touch();
        Ok(())
    }

    /// True iff the conversation reached the terminal state.
    pub fn is_complete(&self) -> bool {
        !self.is_in_progress
    }

    /// Count of user messages in the transcript.
    pub fn user_message_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// Called by the store after a successful durable write.
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
