//! Recency-ranked contact lists, one ranked set per owner.

use super::error::Error;
use entity::contacts::{ActiveModel, Column, Entity, Model};
use entity::EpochSeconds;
use log::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

/// Records that `owner` was in contact with `peer` at `at`, creating the entry
/// on first contact and overwriting `last_contact_at` afterwards.
pub async fn touch(
    db: &impl ConnectionTrait,
    owner: &str,
    peer: &str,
    at: EpochSeconds,
) -> Result<(), Error> {
    let active_model = ActiveModel {
        owner: Set(owner.to_string()),
        peer: Set(peer.to_string()),
        last_contact_at: Set(at),
    };

    Entity::insert(active_model)
        .on_conflict(
            OnConflict::columns([Column::Owner, Column::Peer])
                .update_column(Column::LastContactAt)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    trace!("Touched contact {owner} -> {peer} at {at}");
    Ok(())
}

/// All of `owner`'s peers, most recently contacted first.
pub async fn list(db: &impl ConnectionTrait, owner: &str) -> Result<Vec<Model>, Error> {
    let contacts = Entity::find()
        .filter(Column::Owner.eq(owner))
        .order_by_desc(Column::LastContactAt)
        .order_by_asc(Column::Peer)
        .all(db)
        .await?;

    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::testing::memory_database;

    fn peers(contacts: &[Model]) -> Vec<(&str, EpochSeconds)> {
        contacts
            .iter()
            .map(|c| (c.peer.as_str(), c.last_contact_at))
            .collect()
    }

    #[tokio::test]
    async fn touch_upserts_instead_of_duplicating() -> Result<(), Error> {
        let db = memory_database().await?;

        touch(&db, "alice", "bob", 1).await?;
        touch(&db, "alice", "bob", 2).await?;

        assert_eq!(peers(&list(&db, "alice").await?), vec![("bob", 2)]);
        Ok(())
    }

    #[tokio::test]
    async fn list_ranks_by_most_recent_contact() -> Result<(), Error> {
        let db = memory_database().await?;

        touch(&db, "alice", "bob", 10).await?;
        touch(&db, "alice", "charlie", 20).await?;
        touch(&db, "alice", "dave", 15).await?;
        touch(&db, "alice", "bob", 30).await?;
        touch(&db, "bob", "alice", 30).await?;

        assert_eq!(
            peers(&list(&db, "alice").await?),
            vec![("bob", 30), ("charlie", 20), ("dave", 15)]
        );
        assert_eq!(peers(&list(&db, "bob").await?), vec![("alice", 30)]);
        Ok(())
    }

    #[tokio::test]
    async fn list_of_an_owner_without_contacts_is_empty() -> Result<(), Error> {
        let db = memory_database().await?;
        assert!(list(&db, "nobody").await?.is_empty());
        Ok(())
    }
}
