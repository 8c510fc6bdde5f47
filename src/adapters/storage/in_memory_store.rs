//! In-memory implementation of ConversationStore.
//!
//! Mirrors the Postgres store's revision semantics so tests exercise the
//! same optimistic-concurrency behavior without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::ConversationId;
use crate::domain::interview::Conversation;
use crate::ports::{ConversationStore, StoreError};

/// Thread-safe in-memory conversation store.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: Mutex<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, Conversation>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.lock().insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut map = self.lock();
        let durable = map
            .get(&conversation.id())
            .ok_or(StoreError::NotFound(conversation.id()))?;

        if durable.revision() != conversation.revision() {
            return Err(StoreError::Conflict);
        }

        let mut next = conversation.clone();
        next.bump_revision();
        map.insert(conversation.id(), next);
        Ok(())
    }
}
