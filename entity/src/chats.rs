//! SeaORM Entity for the chats table.
//!
//! A row is one persisted chat message. The JSON form of [`Model`] is exactly
//! what gets broadcast to live connections and returned from history queries.

use crate::EpochSeconds;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::chats::Model)]
#[sea_orm(table_name = "chats")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Store-assigned ordering key, `chat#<epoch millis>-<sequence>`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[serde(rename = "from")]
    pub from_user: String,
    #[serde(rename = "to")]
    pub to_user: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Receipt time on the relay, never the client's clock.
    pub created_at: EpochSeconds,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_field_names() {
        let chat = Model {
            id: "chat#0000000001000-000000".to_string(),
            from_user: "alice".to_string(),
            to_user: "bob".to_string(),
            message: "hello".to_string(),
            created_at: 1,
        };

        let value = serde_json::to_value(&chat).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "chat#0000000001000-000000",
                "from": "alice",
                "to": "bob",
                "message": "hello",
                "createdAt": 1
            })
        );
    }
}
