//! Conversation store port.
//!
//! Contract for persisting and retrieving Conversation aggregates.
//! Implementations handle the actual storage; the orchestrator persists
//! exactly once per turn, after all in-memory mutations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ConversationId;
use crate::domain::interview::Conversation;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation {0} not found")]
    NotFound(ConversationId),

    /// The durable copy moved past the snapshot's revision.
    #[error("conversation revision conflict")]
    Conflict,

    #[error("database error: {0}")]
    Database(String),
}

/// Store port for Conversation aggregate persistence.
///
/// Updates use optimistic concurrency: the write succeeds only if the
/// durable revision still matches the snapshot's revision, and bumps the
/// durable revision by one.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persists a new conversation.
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Loads a conversation by id. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Overwrites the durable copy with this snapshot.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation was never created
    /// - `Conflict` if another writer advanced the revision first
    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ConversationStore) {}
    }
}
