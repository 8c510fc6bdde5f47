//! In-memory storage adapters for tests and local development.

pub mod in_memory_store;

pub use in_memory_store::InMemoryConversationStore;
