use std::{env, fs, sync::Arc};
use terraforming_server::{
    config::settings,
    events::EventBus,
    game::{cards::CardCatalog, registry::SessionRegistry},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Card catalog (optional JSON file)
    let catalog = match env::var("CARD_CATALOG") {
        Ok(path) => CardCatalog::from_json(&fs::read_to_string(&path)?)?,
        Err(_) => CardCatalog::new(),
    };
    log::info!("Loaded {} card definitions", catalog.len());

    let bus = Arc::new(EventBus::new());

    // Stand-in broadcaster: log every event as JSON
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        while let Some(envelope) = events.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(json) => log::debug!("event {json}"),
                Err(e) => log::warn!("event serialization failed: {e}"),
            }
        }
    });

    let registry = SessionRegistry::new(settings().clone(), Arc::new(catalog), bus);
    log::info!(
        "Rules engine ready (max {} players per match)",
        settings().max_players
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down with {} live session(s)", registry.len());
    Ok(())
}
