//! Contact lists, ranked by most recent chat.

use crate::error::Error;
use crate::user::ensure_known;
use entity_api::EpochSeconds;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use utoipa::ToSchema;

pub use entity_api::contact::touch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactEntry {
    pub peer: String,
    pub last_contact_at: EpochSeconds,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub entries: Vec<ContactEntry>,
    pub count: usize,
}

pub async fn contacts(db: &impl ConnectionTrait, username: &str) -> Result<ContactList, Error> {
    ensure_known(db, &[username]).await?;

    let entries: Vec<ContactEntry> = entity_api::contact::list(db, username)
        .await?
        .into_iter()
        .map(|contact| ContactEntry {
            peer: contact.peer,
            last_contact_at: contact.last_contact_at,
        })
        .collect();

    Ok(ContactList {
        count: entries.len(),
        entries,
    })
}
