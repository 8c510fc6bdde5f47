//! PostgreSQL adapters.

pub mod conversation_store;

pub use conversation_store::PostgresConversationStore;
