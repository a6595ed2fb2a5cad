//! Tiered cache walkthrough
//!
//! Builds a two-tier stack from JSON, then drives a shared store with its
//! retirement worker. Run with `RUST_LOG=tiered_cache=debug` to see
//! retirement passes.

use std::time::Duration;

use tiered_cache::{
    cache::size_of, spawn_retirement_task, SharedStore, StoreConfig, TieredCache, Value,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A small, short-lived front tier over a larger, longer-lived one
    let mut stack: TieredCache<Value> = TieredCache::from_json(
        r#"[
            {"adapter": "lru", "adapterOptions": {"maxAge": 50, "maxSize": 64}},
            {"adapter": "lru", "adapterOptions": {"maxSize": 4096}}
        ]"#,
    )?;

    let profile = Value::map([
        ("name", Value::from("ada")),
        ("langs", Value::list(["en", "fr"])),
        ("admin", Value::from(true)),
    ]);
    info!("profile costs {} bytes", size_of(&profile));

    stack.put("user:1", profile)?;
    stack.run_pending_retirements();
    info!("user:1 present in front tier: {}", stack.tiers()[0].has("user:1"));

    tokio::time::sleep(Duration::from_millis(60)).await;
    info!(
        "after 60ms, front tier: {}, stack: {}",
        stack.tiers()[0].has("user:1"),
        stack.has("user:1")
    );
    stack.destroy()?;

    // Shared store with the background retirement worker
    let shared: SharedStore<String> =
        SharedStore::from_config(StoreConfig::from_env().with_max_size(6));
    let worker = spawn_retirement_task(shared.clone());

    for i in 0..10 {
        shared.put(&format!("str{}", i), "a".to_string(), None).await?;
    }
    while shared.pending_retirements().await > 0 {
        tokio::task::yield_now().await;
    }
    info!(
        "shared store holds {} entries, {} bytes: {:?}",
        shared.len().await,
        shared.size().await,
        shared.stats().await
    );

    worker.abort();
    Ok(())
}
