use super::error::Error;
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use log::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

/// Adds `username` to the set of known identities and returns the stored
/// record. Adding an existing identity leaves it untouched.
pub async fn create(db: &impl ConnectionTrait, username: &str) -> Result<Model, Error> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation());
    }

    debug!("Adding identity {username}");

    let inserted = Entity::insert(ActiveModel {
        username: Set(username.to_string()),
        created_at: Set(Utc::now().timestamp()),
    })
    .on_conflict(OnConflict::column(Column::Username).do_nothing().to_owned())
    .exec_without_returning(db)
    .await;

    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    Entity::find_by_id(username.to_string())
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(username.to_string()).into())
}

pub async fn exists(db: &impl ConnectionTrait, username: &str) -> Result<bool, Error> {
    let count = Entity::find()
        .filter(Column::Username.eq(username))
        .count(db)
        .await?;

    Ok(count > 0)
}
