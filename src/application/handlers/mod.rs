//! Use-case handlers.

pub mod answer_field;
pub mod start_interview;

pub use answer_field::{AnswerFieldCommand, AnswerFieldError, AnswerFieldHandler};
pub use start_interview::{StartInterviewCommand, StartInterviewError, StartInterviewHandler};
