use log::*;
use sea_orm::DatabaseConnection;

pub use entity::{chats, contacts, users, EpochSeconds, UserId};

pub mod chat;
pub mod contact;
pub mod error;
pub mod user;

/// Identities created by the `seed_db` binary for local development.
pub const SEED_IDENTITIES: [&str; 3] = ["alice", "bob", "charlie"];

pub async fn seed_database(db: &DatabaseConnection) {
    for username in SEED_IDENTITIES {
        match user::create(db, username).await {
            Ok(_) => info!("Seeded identity {username}"),
            Err(e) => error!("Failed to seed identity {username}: {e}"),
        }
    }
}
