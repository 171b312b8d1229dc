//! Moon API server binary.
//!
//! Connects to PostgreSQL, runs migrations and serves the account API until
//! Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use moon_api::config::ApiConfig;
use moon_core::cache::{DEFAULT_EVICTION_INTERVAL, KvCache, MemoryCache, RedisCache};
use moon_core::users::PgUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Where session records live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CacheBackend {
    /// In-process map. Sessions are lost on restart and not shared.
    Memory,
    /// Redis server at `--redis-url`.
    Redis,
}

/// CLI arguments for the API server. Anything not given here falls back to
/// the environment (see [`ApiConfig::from_env`]).
#[derive(Parser, Debug)]
#[command(name = "moon_api_server", about = "Moon account API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/moon"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Session cache backend.
    #[arg(long, env = "SESSION_CACHE", value_enum, default_value_t = CacheBackend::Memory)]
    session_cache: CacheBackend,

    /// Redis connection URL, used with `--session-cache redis`.
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    redis_url: String,

    /// Per-request deadline in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = moon_api::config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,moon_api=debug,moon_core=debug"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let args = Args::parse();

    info!(bind = %args.bind, max_connections = args.max_connections, "starting moon_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    let users = PgUserRepository::new(pool);
    info!("running database migrations");
    users.migrate().await?;

    let mut eviction = None;
    let cache: Arc<dyn KvCache> = match args.session_cache {
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryCache::new());
            eviction = Some(cache.spawn_cleanup_task(DEFAULT_EVICTION_INTERVAL));
            cache
        }
        CacheBackend::Redis => Arc::new(RedisCache::connect(&args.redis_url).await?),
    };
    info!(backend = ?args.session_cache, "session cache ready");

    let config = ApiConfig {
        bind_addr: args.bind,
        pg_connection_url: args.database_url,
        request_timeout_secs: args.request_timeout_secs,
        ..ApiConfig::from_env()
    };

    let state = moon_api::AppState::new(config.clone(), Arc::new(users), cache)?;
    let app = moon_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {e}");
                return;
            }
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    if let Some(task) = eviction {
        task.abort();
    }
    info!("server stopped");
    Ok(())
}
