//! Interview behavior configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::interview::DEFAULT_COMPLETION_MESSAGE;

/// Interview behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Message streamed when the last field is committed
    #[serde(default = "default_completion_message")]
    pub completion_message: String,

    /// Temperature for question generation
    #[serde(default = "default_generation_temperature")]
    pub generation_temperature: f32,

    /// Token budget per generated question
    #[serde(default = "default_generation_max_tokens")]
    pub generation_max_tokens: u32,
}

impl InterviewConfig {
    /// Validate interview configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.completion_message.trim().is_empty() {
            return Err(ValidationError::EmptyCompletionMessage);
        }
        if !(0.0..=2.0).contains(&self.generation_temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        Ok(())
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            completion_message: default_completion_message(),
            generation_temperature: default_generation_temperature(),
            generation_max_tokens: default_generation_max_tokens(),
        }
    }
}

fn default_completion_message() -> String {
    DEFAULT_COMPLETION_MESSAGE.to_string()
}

fn default_generation_temperature() -> f32 {
    0.7
}

fn default_generation_max_tokens() -> u32 {
    300
}
