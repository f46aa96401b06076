use std::sync::Arc;

use tokio::net::TcpListener;

use debrief::application::services::{AnalysisService, FeedbackGenerator};
use debrief::infrastructure::audio::TranscriptionEngineFactory;
use debrief::infrastructure::llm::ChatCompletionClient;
use debrief::infrastructure::observability::{init_tracing, TracingConfig};
use debrief::infrastructure::storage::LocalStagingStore;
use debrief::infrastructure::text::PlainTextResumeLoader;
use debrief::presentation::{create_router, AppState, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Settings::load(environment)?;

    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            json_format: settings.logging.json_format,
        },
        settings.server.port,
    );

    let staging_store = Arc::new(LocalStagingStore::new(settings.staging.dir.clone())?);

    tracing::info!(
        provider = ?settings.transcription.provider,
        model = %settings.transcription.model,
        "Initializing transcription engine"
    );
    let transcription_engine = TranscriptionEngineFactory::create(&settings.transcription)?;

    let llm_client = Arc::new(ChatCompletionClient::new(&settings.llm)?);
    let resume_loader = Arc::new(PlainTextResumeLoader::new());

    let analysis_service = Arc::new(AnalysisService::new(
        staging_store,
        transcription_engine,
        FeedbackGenerator::new(llm_client),
        resume_loader,
    ));

    let state = AppState { analysis_service };
    let router = create_router(state, settings.server.max_upload_mb * 1024 * 1024);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, router).await?;

    Ok(())
}
