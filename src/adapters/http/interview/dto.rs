//! Request/response DTOs for the interview endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{FieldId, FormId, ValidationError};
use crate::domain::interview::{Field, FieldConfiguration, TurnKind};

/// POST /api/conversations request body.
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub form_id: Uuid,
    pub form_overview: String,
    pub fields: Vec<FieldDto>,
}

/// One field definition in a create request.
#[derive(Debug, Deserialize)]
pub struct FieldDto {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub configuration: FieldConfiguration,
}

impl FieldDto {
    /// Converts into a domain field, validating the id.
    pub fn into_field(self) -> Result<Field, ValidationError> {
        let id = FieldId::new(self.id)?;
        Ok(Field::new(id, self.name, self.description, self.configuration))
    }
}

impl CreateConversationRequest {
    pub fn form_id(&self) -> FormId {
        FormId::from_uuid(self.form_id)
    }
}

/// POST /api/conversations/{id}/messages request body.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub field_id: String,
    pub answer_text: String,
}

/// SSE event payload announcing the created conversation.
#[derive(Debug, Serialize)]
pub struct ConversationCreatedEvent {
    pub conversation_id: Uuid,
}

/// SSE event payload closing a turn.
#[derive(Debug, Serialize)]
pub struct TurnDoneEvent {
    pub kind: TurnKind,
    pub conversation_complete: bool,
}

/// SSE event payload for a failed turn.
#[derive(Debug, Serialize)]
pub struct TurnErrorEvent {
    pub message: String,
}

/// Generic JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_dto_flattens_configuration() {
        let json = r#"{
            "id": "f-color",
            "name": "Favorite color",
            "description": "Pick one",
            "input_type": "multiple_choice",
            "options": ["Red", "Blue"]
        }"#;
        let dto: FieldDto = serde_json::from_str(json).unwrap();
        let field = dto.into_field().unwrap();
        assert_eq!(field.name(), "Favorite color");
        assert!(field.configuration().skips_extraction());
    }

    #[test]
    fn blank_field_id_is_rejected() {
        let dto = FieldDto {
            id: "  ".to_string(),
            name: "Name".to_string(),
            description: "d".to_string(),
            configuration: FieldConfiguration::Text,
        };
        assert!(dto.into_field().is_err());
    }

    #[test]
    fn create_request_deserializes() {
        let json = r#"{
            "form_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            "form_overview": "Contact form",
            "fields": [
                {"id": "f-name", "name": "Name", "description": "Full name", "input_type": "text"}
            ]
        }"#;
        let request: CreateConversationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.fields.len(), 1);
        assert_eq!(request.form_overview, "Contact form");
    }
}
