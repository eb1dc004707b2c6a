use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crescent_eats::cache::{ListingCache, MemoryCache, RedisCache};
use crescent_eats::geocode::Geocoder;
use crescent_eats::server::{self, AppState};
use crescent_eats::store::JsonStore;

/// Crescent Eats halal restaurant directory server.
///
/// Serves the restaurant listing API backed by a JSON directory file,
/// with a Redis read-through cache for plain listings and live
/// proximity search.
///
/// Examples:
///   crescent
///   crescent --port 9090 --data ./directory.json
///   crescent --memory-cache --offline
#[derive(Parser)]
#[command(name = "crescent", version, about, long_about = None)]
struct Cli {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Redis connection URL for the listing cache.
    #[arg(long, default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Use an in-process cache instead of Redis.
    #[arg(long)]
    memory_cache: bool,

    /// Path to the directory data file. Defaults to ~/.crescent/directory.json.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Offline mode: skip geocoding network calls on writes.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    let data_path = cli.data.clone().unwrap_or_else(JsonStore::default_path);
    let store = match JsonStore::open(data_path.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: cannot open directory file {}: {e}", data_path.display());
            std::process::exit(1);
        }
    };

    let cache: Arc<dyn ListingCache> = if cli.memory_cache {
        info!("using in-process listing cache");
        Arc::new(MemoryCache::new())
    } else {
        match RedisCache::connect(&cli.redis_url).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                // keep serving; listings just lose cross-process caching
                warn!(error = %e, "redis unavailable, falling back to in-process cache");
                Arc::new(MemoryCache::new())
            }
        }
    };

    let state = Arc::new(AppState {
        store,
        cache,
        geocoder: Arc::new(Geocoder::new(cli.offline)),
    });

    info!(data = %data_path.display(), "directory loaded");
    server::start(&cli.host, cli.port, state).await;
}
