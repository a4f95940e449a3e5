//! SeaORM Entity for the contacts table, one row per (owner, peer) pair.

use crate::EpochSeconds;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::contacts::Model)]
#[sea_orm(table_name = "contacts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(skip_serializing)]
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub peer: String,
    pub last_contact_at: EpochSeconds,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
