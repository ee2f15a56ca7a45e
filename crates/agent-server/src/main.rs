//! Mail Assistant HTTP Server
//!
//! Axum-based server exposing the plan-execution engine over REST. Each
//! chat request gets one engine walk: classify, plan, execute, respond.

mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AdapterSet, Engine, EngineConfig, GenerationOptions, LlmProvider};
use agent_runtime::OpenAiProvider;
use mail_assistant::mailbox::MailboxClient;
use mail_assistant::store::{FileRecordStore, MemoryReminderStore, RecordStore, VectorStore};
use mail_assistant::toolkit::{
    ClassifyIntentAdapter, CreateReminderAdapter, ExtractRecordsAdapter, GenerateResponseAdapter,
    IndexDocumentAdapter, ParseDocumentAdapter, QueryRecordsAdapter, SaveRecordAdapter,
    ScanMailboxAdapter, ScanMailboxConfig, SearchStoreAdapter, WebSearchAdapter,
};
use mail_assistant::{GmailClient, MockMailboxClient};

use crate::handlers::{chat_handler, health_check, list_reminders};
use crate::state::AppState;

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize LLM provider
    let provider = Arc::new(OpenAiProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ LLM provider not reachable - requests will degrade");
            tracing::warn!("  Check OPENAI_API_KEY and OPENAI_BASE_URL");
        }
    }

    let options = GenerationOptions {
        model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1-nano".into()),
        ..Default::default()
    };

    // Mailbox backend: Gmail when a token is configured, mock otherwise
    let mailbox: Arc<dyn MailboxClient> = match GmailClient::from_env() {
        Ok(client) => {
            tracing::info!("✓ Gmail configured");
            Arc::new(client)
        }
        Err(_) => {
            tracing::warn!("⚠ GMAIL_ACCESS_TOKEN not set - using the mock mailbox");
            Arc::new(MockMailboxClient::new())
        }
    };
    let mailbox_name = mailbox.name().to_string();

    // Local stores
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
    std::fs::create_dir_all(&data_dir)?;

    let records: Arc<dyn RecordStore> =
        Arc::new(FileRecordStore::open(data_dir.join("records.json"))?);
    let reminders: Arc<MemoryReminderStore> = Arc::new(MemoryReminderStore::new());
    let vector = Arc::new(
        VectorStore::new(provider.clone(), env_or("VECTOR_MAX_ENTRIES", 5000))
            .with_persistence(data_dir.join("vector_index.json")),
    );

    // Engine bounds, overridable from the environment
    let config = EngineConfig {
        default_scan_window_days: env_or("SCAN_WINDOW_DAYS", 30),
        max_scan_results: env_or("EMAIL_SCAN_MAX_RESULTS", 50),
        ..Default::default()
    };

    let scan_config = ScanMailboxConfig {
        download_dir: data_dir.join("raw/attachments"),
        ..Default::default()
    };

    // Register adapters
    let scan_llm: Arc<dyn LlmProvider> = provider.clone();
    let mut adapters = AdapterSet::new();
    adapters.register(ClassifyIntentAdapter::new(provider.clone(), options.clone()));
    adapters.register(ScanMailboxAdapter::new(
        mailbox,
        Some(scan_llm),
        options.clone(),
        scan_config,
    ));
    adapters.register(ParseDocumentAdapter::new());
    adapters.register(ExtractRecordsAdapter::new(provider.clone(), options.clone()));
    adapters.register(SaveRecordAdapter::new(records.clone()));
    adapters.register(IndexDocumentAdapter::new(vector.clone()));
    adapters.register(SearchStoreAdapter::new(vector));
    adapters.register(QueryRecordsAdapter::new(records));
    adapters.register(CreateReminderAdapter::new(reminders.clone()));
    adapters.register(WebSearchAdapter::from_env());
    adapters.register(GenerateResponseAdapter::new(provider.clone(), options));

    tracing::info!("Registered {} adapters:", adapters.len());
    for name in adapters.names() {
        tracing::info!("  • {}", name);
    }

    let engine = Arc::new(Engine::new(Arc::new(adapters), config));

    // Build application state
    let app_state = AppState {
        engine,
        provider,
        reminders,
        mailbox_name,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/reminders", get(list_reminders))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 mail-assistant server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health         - Health check");
    tracing::info!("  POST /api/chat       - Send a request to the assistant");
    tracing::info!("  GET  /api/reminders  - List created reminders");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
