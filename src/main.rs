//! Formflow server entry point.
//!
//! Loads configuration, wires the AI provider, store, orchestrator, and
//! use-case handlers, then serves the HTTP API.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use formflow::adapters::ai::{
    ModelAnswerExtractor, ModelQuestionGenerator, OpenAiConfig, OpenAiProvider,
};
use formflow::adapters::http::{app_router, interview::handlers::InterviewAppState};
use formflow::adapters::postgres::PostgresConversationStore;
use formflow::application::handlers::{AnswerFieldHandler, StartInterviewHandler};
use formflow::config::AppConfig;
use formflow::domain::interview::InterviewOrchestrator;
use formflow::ports::{AiProvider, AnswerExtractor, ConversationStore, QuestionGenerator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let api_key = config.ai.api_key.clone().unwrap_or_default();
    let provider: Arc<dyn AiProvider> = Arc::new(OpenAiProvider::new(
        OpenAiConfig::new(api_key)
            .with_model(&config.ai.model)
            .with_base_url(&config.ai.base_url)
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    )?);

    let store: Arc<dyn ConversationStore> = Arc::new(PostgresConversationStore::new(pool));

    let orchestrator = Arc::new(
        InterviewOrchestrator::new(
            Arc::new(ModelAnswerExtractor::new(provider.clone())) as Arc<dyn AnswerExtractor>,
            Arc::new(
                ModelQuestionGenerator::new(provider.clone())
                    .with_temperature(config.interview.generation_temperature)
                    .with_max_tokens(config.interview.generation_max_tokens),
            ) as Arc<dyn QuestionGenerator>,
            store.clone(),
        )
        .with_completion_message(&config.interview.completion_message),
    );

    let state = InterviewAppState::new(
        Arc::new(StartInterviewHandler::new(store.clone(), orchestrator.clone())),
        Arc::new(AnswerFieldHandler::new(store, orchestrator)),
    );

    let app = app_router(state);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        model = %config.ai.model,
        "formflow server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
