use domain::chat::ChatStore;
use log::*;
use migration::{Migrator, MigratorTrait};
use relay::Relay;
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting the Krowka relay in the {} environment",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(db.as_ref(), None).await {
        error!("Failed to apply database migrations: {e}");
        std::process::exit(1);
    }

    let chat_store = match ChatStore::init(Arc::clone(&db)).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to prepare the chat store: {e}");
            std::process::exit(1);
        }
    };

    let (relay, router) = Relay::new(chat_store, config.relay_queue_capacity);
    let relay = relay.with_connection_buffer(config.connection_buffer_capacity);
    let router_task = router.spawn();

    let app_state = web::AppState::new(AppState::new(config, &db), relay);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        router_task.abort();
        std::process::exit(1);
    }
}
