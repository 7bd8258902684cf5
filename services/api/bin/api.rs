//! Main Entrypoint for the RISE API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Selecting the progress store (Postgres when configured, otherwise memory).
//! 3. Building the generation client and the progress controller.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and recording any pending mastery on shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use rise_api::{
    config::{Config, Provider},
    db::PgStore,
    router::create_router,
    state::AppState,
};
use rise_core::{
    ControllerSettings, GenerationClient, KeyValueStore, MemoryStore, OpenAICompatibleClient,
    ProgressController, prompt::PromptTemplates, roster::LearnerRepository,
};
use sqlx::PgPool;
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompts from a directory.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in std::fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Connects to Postgres when a database URL is configured.
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PgStore::new(pool);
            store.run_migrations().await?;
            info!("Database connection established and migrations are up-to-date.");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set. Learner progress will be kept in memory only.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn generation_client(
    config: &Config,
    prompts: PromptTemplates,
) -> anyhow::Result<Arc<dyn GenerationClient>> {
    let openai_config = match &config.provider {
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            let api_key = config
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY must be set for 'openai' provider")?;
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://api.openai.com/v1/")
        }
        Provider::Gemini => {
            info!("Using Gemini provider.");
            let api_key = config
                .gemini_api_key
                .as_ref()
                .context("GEMINI_API_KEY must be set for 'gemini' provider")?;
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base("https://generativelanguage.googleapis.com/v1beta/openai")
        }
    };
    Ok(Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
        prompts,
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Storage ---
    let store = open_store(&config).await?;
    let roster = LearnerRepository::new(store);

    // --- 4. Initialize the Controller ---
    let prompts = load_prompts(&config.prompts_path)?;
    let templates = PromptTemplates::from_map(&prompts)?;
    let generator = generation_client(&config, templates)?;

    let controller = ProgressController::new(
        roster,
        generator,
        ControllerSettings {
            verification_code: config.verification_code.clone(),
            mastery_delay: config.mastery_delay,
        },
    );
    if let Some(learner) = controller.resume().await? {
        info!(learner_id = %learner.id, "Restored previous session");
    }

    let app_state = Arc::new(AppState {
        controller: controller.clone(),
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Err(e) = controller.shutdown().await {
        error!("Failed to record pending mastery during shutdown: {}", e);
    }
    info!("Server has shut down.");
    Ok(())
}
