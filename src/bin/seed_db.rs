use log::{error, info};
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to apply database migrations: {e}");
        std::process::exit(1);
    }

    entity_api::seed_database(&db).await;
}
