//! Two-session anchor persistence walkthrough
//!
//! Run with: cargo run --example session

use std::sync::Arc;

use mooring::{
    ObjectHandle, Pose, PrefabSelector, RegistryBuilder, SimulatedAnchorProvider, SimulatedSpawner,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> mooring::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store_path = std::env::temp_dir().join(format!("mooring-demo-{}.json", std::process::id()));
    // The provider stands in for the platform; it outlives both sessions.
    let provider = Arc::new(SimulatedAnchorProvider::new());
    let prefabs = ["cube", "sphere", "cone"];

    // --- Session one: spawn, anchor, and persist some objects ---
    let registry = RegistryBuilder::new()
        .with_store_path(&store_path)
        .with_shared_provider(provider.clone())
        .with_spawner(SimulatedSpawner::new(prefabs))
        .build()?;

    println!("{}", registry.start().await);

    registry.set_selection(PrefabSelector::Prefab(0));
    registry
        .record_spawned(ObjectHandle::new(1), Pose::at(0.0, 1.0, -0.5))
        .await;
    registry.set_selection(PrefabSelector::Random);
    registry
        .record_spawned(ObjectHandle::new(2), Pose::at(0.4, 1.2, -0.8))
        .await;

    println!("{}", registry.save_all().await);
    registry.destroy_all().await;
    drop(registry);

    // --- Session two: restore everything from the store on start ---
    let registry = RegistryBuilder::new()
        .with_store_path(&store_path)
        .with_shared_provider(provider)
        .with_spawner(SimulatedSpawner::new(prefabs))
        .with_load_on_start(true)
        .build()?;

    println!("{}", registry.start().await);
    println!(
        "restored {} object(s) from {}",
        registry.records().await.len(),
        store_path.display()
    );

    // Clean up: erase the persisted anchors and the backing file.
    println!("{}", registry.delete_all().await);
    let _ = tokio::fs::remove_file(&store_path).await;
    Ok(())
}
