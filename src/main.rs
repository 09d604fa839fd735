use actix_web::web;
use clap::Parser;
use greenmatch::{
    AppState, CachedTranslator, HashEmbedder, IdentityTranslator, MatchConfig, MatchContext,
    RestApi, StorageBackend, StorageConfig, StorageManager, SuggestionCatalog, TracingNotifier,
};
use greenmatch_core::engine::{
    DEFAULT_LOW_CONFIDENCE_THRESHOLD, DEFAULT_MAX_PHRASE_CHARS, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TOP_K,
};
use greenmatch_core::translate::DEFAULT_TRANSLATION_CACHE_SIZE;
use greenmatch_core::DEFAULT_EMBEDDING_DIM;
use greenmatch_storage::lmdb_store::DEFAULT_MAP_SIZE;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Semantic job matching for green-economy skills
#[derive(Parser, Debug)]
#[command(name = "greenmatch")]
#[command(about = "Match skills to green jobs by embedding similarity", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, env = "GREENMATCH_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Storage backend: memory, dump or lmdb
    #[arg(long, env = "GREENMATCH_BACKEND", default_value = "dump")]
    backend: StorageBackend,

    /// HTTP API port
    #[arg(short, long, env = "GREENMATCH_PORT", default_value_t = 8000)]
    port: u16,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Embedding dimension
    #[arg(long, env = "GREENMATCH_VECTOR_DIM", default_value_t = DEFAULT_EMBEDDING_DIM)]
    vector_dim: usize,

    /// Number of matches returned
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Results are low-confidence when every score is below this
    #[arg(long, default_value_t = DEFAULT_LOW_CONFIDENCE_THRESHOLD)]
    low_confidence_threshold: f32,

    /// Longest accepted skill phrase, in characters
    #[arg(long, default_value_t = DEFAULT_MAX_PHRASE_CHARS)]
    max_phrase_chars: usize,

    /// Number of cached translations
    #[arg(long, default_value_t = DEFAULT_TRANSLATION_CACHE_SIZE)]
    translation_cache: usize,

    /// Seconds between background dumps, 0 to disable
    #[arg(long, default_value_t = 300)]
    save_interval: u64,

    /// Recompute every job embedding before serving
    #[arg(long)]
    reembed_on_start: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting greenmatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Storage backend: {}", args.backend);
    info!("HTTP API port: {}", args.port);

    let storage = Arc::new(StorageManager::new(StorageConfig {
        data_dir: args.data_dir.clone(),
        backend: args.backend,
        vector_dim: args.vector_dim,
        save_interval: (args.save_interval > 0).then(|| Duration::from_secs(args.save_interval)),
        lmdb_map_size: DEFAULT_MAP_SIZE,
    })?);
    info!("Storage initialized");

    let ctx = Arc::new(
        MatchContext::new(Arc::new(HashEmbedder::new(args.vector_dim)))
            .with_translator(Arc::new(CachedTranslator::with_capacity(
                IdentityTranslator,
                args.translation_cache,
            )))
            .with_notifier(Arc::new(TracingNotifier)),
    );

    let config = MatchConfig {
        top_k: args.top_k,
        low_confidence_threshold: args.low_confidence_threshold,
        max_phrase_chars: args.max_phrase_chars,
        parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
    };
    let state = web::Data::new(AppState::new(
        ctx,
        storage.job_store(),
        storage.skill_store(),
        config,
        SuggestionCatalog::default(),
    )?);

    if args.reembed_on_start || storage.needs_reembed() {
        if !args.reembed_on_start {
            warn!("Stored embeddings are stale, re-embedding all jobs");
        }
        let report = state.ingestor.reembed_all()?;
        info!(updated = report.updated, "Startup re-embedding done");
    }

    let state_http = state.clone();
    let http_port = args.port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state_http, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("greenmatch started successfully");
    info!("HTTP API: http://localhost:{}/", args.port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    if let Err(e) = storage.save() {
        error!("Final save failed: {}", e);
    }
    Ok(())
}
