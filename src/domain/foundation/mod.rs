//! Shared value objects used across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConversationId, FieldId, FormId, StreamId};
pub use timestamp::Timestamp;
