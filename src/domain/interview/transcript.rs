//! Transcript messages - the append-only conversation log.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Role of a transcript message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The respondent filling the form.
    User,
    /// The interviewing assistant.
    Assistant,
}

/// One entry in a conversation's transcript.
///
/// Messages are immutable once appended; the transcript only grows through
/// the conversation aggregate's `add_user_message`/`add_assistant_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: Timestamp,
}

impl TranscriptMessage {
    /// Creates a respondent message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_constructor_sets_role() {
        let msg = TranscriptMessage::user("30");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "30");
    }

    #[test]
    fn assistant_constructor_sets_role() {
        let msg = TranscriptMessage::assistant("What is your age?");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "What is your age?");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageRole::User).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
