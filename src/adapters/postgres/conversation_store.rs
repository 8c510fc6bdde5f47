//! PostgreSQL implementation of ConversationStore.
//!
//! The aggregate is stored as a JSONB snapshot alongside a revision
//! counter. Updates lock the row (`SELECT ... FOR UPDATE`) and compare
//! revisions, so two turns racing on the same conversation cannot
//! silently overwrite each other.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::ConversationId;
use crate::domain::interview::Conversation;
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL-backed conversation store.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let snapshot = serde_json::to_value(conversation)
            .map_err(|e| StoreError::Database(format!("failed to serialize snapshot: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, form_id, revision, snapshot, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.form_id().as_uuid())
        .bind(conversation.revision())
        .bind(&snapshot)
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("failed to insert conversation: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT snapshot FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to fetch conversation: {}", e)))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let snapshot: serde_json::Value = row.get("snapshot");
        let conversation: Conversation = serde_json::from_value(snapshot)
            .map_err(|e| StoreError::Database(format!("failed to deserialize snapshot: {}", e)))?;

        Ok(Some(conversation))
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("failed to start transaction: {}", e)))?;

        let row = sqlx::query("SELECT revision FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(conversation.id().as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("failed to lock conversation: {}", e)))?;

        let durable_revision: i64 = match row {
            Some(row) => row.get("revision"),
            None => return Err(StoreError::NotFound(conversation.id())),
        };

        if durable_revision != conversation.revision() {
            return Err(StoreError::Conflict);
        }

        // The stored snapshot carries the post-write revision so a later
        // read starts from the revision the row now holds.
        let mut next = conversation.clone();
        next.bump_revision();
        let snapshot = serde_json::to_value(&next)
            .map_err(|e| StoreError::Database(format!("failed to serialize snapshot: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET snapshot = $2, revision = revision + 1, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(&snapshot)
        .bind(next.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Database(format!("failed to update conversation: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("failed to commit transaction: {}", e)))?;

        Ok(())
    }
}
