mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod queue;
mod scrape;
mod search;
mod store;
mod suggest;
mod worker;

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::PipelineDeps;
use crate::queue::JobQueue;
use crate::scrape::HtmlExtractor;
use crate::search::BraveSearcher;
use crate::store::PgJobStore;
use crate::suggest::GeminiSuggester;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job-search worker v{}", env!("CARGO_PKG_VERSION"));

    // Connect the durable queue
    let redis = redis::Client::open(config.redis_url.clone())?;
    let queue = JobQueue::connect(&redis).await?;

    // Producer mode: `worker enqueue '<json payload>'` publishes one request
    // and exits, mirroring what the API layer does in production.
    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        if command != "enqueue" {
            bail!("Unknown command '{command}' (supported: enqueue <json>)");
        }
        let Some(payload) = args.next() else {
            bail!("Usage: worker enqueue <json payload>");
        };
        queue.enqueue(&payload).await?;
        info!("Request enqueued");
        return Ok(());
    }

    // Initialize PostgreSQL (service-role access — see store.rs)
    let pool = create_pool(&config.database_url).await?;

    // External collaborators, constructed once and injected into the
    // orchestrator. Provider keys are optional; absence puts the matching
    // stage into fallback mode.
    if config.brave_api_key.is_none() {
        info!("BRAVE_API_KEY not set; link discovery will return fallback data");
    }
    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set; suggestions will return fallback data");
    }

    let deps = PipelineDeps {
        searcher: Arc::new(BraveSearcher::new(config.brave_api_key.clone())),
        extractor: Arc::new(HtmlExtractor::new()),
        suggester: Arc::new(GeminiSuggester::new(config.gemini_api_key.clone())),
        store: Arc::new(PgJobStore::new(pool)),
    };

    worker::run(&queue, &deps).await
}
