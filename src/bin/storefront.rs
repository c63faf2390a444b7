use std::env;
use std::sync::Arc;
use std::time::Duration;

use storefront_feed::{http, CatalogCache, HttpCatalog, StorefrontConfig};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("STOREFRONT_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let config = StorefrontConfig::from_env().map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;
    info!(
        catalog = %config.catalog_url,
        page_size = config.page_size,
        "storefront config loaded"
    );

    let catalog = HttpCatalog::from_config(&config).map_err(|e| e.to_string())?;
    let cache = Arc::new(CatalogCache::from_config(catalog, &config));

    let sweeper = Arc::clone(&cache);
    let sweep_every = config.gc_time.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let evicted = sweeper.evict_idle();
            if evicted > 0 {
                debug!(evicted, "evicted idle cache entries");
            }
        }
    });

    if let Err(e) = http::serve(cache, &config.bind_addr).await {
        error!(error = %e, "storefront server stopped");
        return Err(e.to_string());
    }
    Ok(())
}
