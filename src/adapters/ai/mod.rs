//! AI adapters - provider clients and the model-backed collaborators.

pub mod mock_provider;
pub mod model_extractor;
pub mod model_question_generator;
pub mod openai_provider;

pub use mock_provider::MockAiProvider;
pub use model_extractor::ModelAnswerExtractor;
pub use model_question_generator::ModelQuestionGenerator;
pub use openai_provider::{OpenAiConfig, OpenAiProvider};
