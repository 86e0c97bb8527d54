#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::{net::SocketAddr, sync::Arc};

    use fleet_calendar::{JsonFileStore, LedgerConfig, LedgerStore, http_api, logging};

    logging::init(tracing::Level::INFO);

    let config = LedgerConfig::from_env()?;
    let addr: SocketAddr = config.http_addr.parse()?;
    let store = JsonFileStore::from_config(&config);
    let ledger = store.load_ledger()?.with_rule(config.weekend_rule());

    tracing::info!(%addr, data_dir = %config.data_dir.display(), "fleet-calendar HTTP API listening");
    let state = http_api::AppState::with_store(ledger, Arc::new(store));
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
