use crate::error::Error;
use sea_orm::ConnectionTrait;

pub use entity_api::user::{create, exists};

/// Succeeds when `username` is a known identity.
pub async fn verify_contact(db: &impl ConnectionTrait, username: &str) -> Result<(), Error> {
    ensure_known(db, &[username]).await
}

/// Fails with an unknown-participant error for the first identity in
/// `usernames` that is not known. Store failures stay store failures.
pub(crate) async fn ensure_known(
    db: &impl ConnectionTrait,
    usernames: &[&str],
) -> Result<(), Error> {
    for username in usernames {
        if !exists(db, username).await? {
            return Err(Error::unknown_participant(username));
        }
    }
    Ok(())
}
