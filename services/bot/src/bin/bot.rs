//! services/bot/src/bin/bot.rs

use async_openai::{config::OpenAIConfig, Client};
use bot_lib::{
    adapters::{
        DbAdapter, FsAudioStorage, HttpBridgeTransport, OpenAiExtractionAdapter, OpenAiSstAdapter,
    },
    config::Config,
    error::BotError,
    web::{build_router, run_intake, AppState},
};
use site_report_core::{IntakePipeline, PipelinePorts, PipelineSettings, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BotError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting bot...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_client =
        Client::with_config(OpenAIConfig::new().with_api_key(config.openai_api_key.clone()));
    let sst_adapter = Arc::new(OpenAiSstAdapter::new(
        openai_client.clone(),
        config.transcription_model.clone(),
        config.transcription_language.clone(),
    ));
    let extraction_adapter = Arc::new(OpenAiExtractionAdapter::new(
        openai_client,
        config.extraction_model.clone(),
    ));
    let transport = Arc::new(HttpBridgeTransport::new(config.bridge_url.clone())?);
    let audio_storage = Arc::new(FsAudioStorage::open(&config.audio_dir).await?);
    info!(audio_dir = %config.audio_dir.display(), "Audio storage ready.");

    // --- 4. Build the Intake Pipeline ---
    if config.target_chat_id.is_empty() {
        warn!("TARGET_CHAT_ID is not set; reports are ignored until it is. Send !grupoid in the group to look it up.");
    } else if config.allowed_senders.is_empty() {
        warn!("ALLOWED_SENDERS is empty; every member of the target chat may submit reports.");
    }
    let pipeline = Arc::new(IntakePipeline::new(
        PipelineSettings {
            target_chat_id: config.target_chat_id.clone(),
            allowed_senders: config.allowed_senders.clone(),
            cooldown: config.cooldown,
            min_text_chars: config.min_text_report_chars,
        },
        PipelinePorts {
            transport,
            transcriber: sst_adapter,
            extractor: extraction_adapter,
            reports: db_adapter.clone(),
            media: audio_storage,
            clock: Arc::new(SystemClock),
        },
    ));

    let shutdown = CancellationToken::new();
    let (intake_tx, intake_rx) = mpsc::channel(config.intake_queue_capacity);
    let intake_worker = tokio::spawn(run_intake(intake_rx, pipeline, shutdown.clone()));

    // --- 5. Create the Web Router ---
    let app = build_router(Arc::new(AppState {
        reports: db_adapter.clone(),
        intake: intake_tx,
        webhook_secret: config.webhook_secret.clone(),
    }));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    tokio::spawn(watch_signals(shutdown.clone()));
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    // --- 7. Drain and Release Resources ---
    shutdown.cancel();
    if let Err(e) = intake_worker.await {
        error!("Intake worker failed: {:?}", e);
    }
    db_adapter.close().await;
    info!("Shutdown complete.");

    served?;
    Ok(())
}

/// Cancels `token` on Ctrl-C or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down."),
        _ = terminate => info!("Received SIGTERM, shutting down."),
        _ = token.cancelled() => return,
    }
    token.cancel();
}
