use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // The participant/time index over chats is owned by the chat store, which
        // creates it on startup, so only the table is defined here.
        manager
            .create_table(
                Table::create()
                    .table(Chats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chats::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Chats::FromUser).string().not_null())
                    .col(ColumnDef::new(Chats::ToUser).string().not_null())
                    .col(ColumnDef::new(Chats::Message).text().not_null())
                    .col(ColumnDef::new(Chats::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contacts::Owner).string().not_null())
                    .col(ColumnDef::new(Contacts::Peer).string().not_null())
                    .col(
                        ColumnDef::new(Contacts::LastContactAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Contacts::Owner)
                            .col(Contacts::Peer),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("contacts_owner_last_contact_at")
                    .table(Contacts::Table)
                    .col(Contacts::Owner)
                    .col(Contacts::LastContactAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contacts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chats::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Username,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Chats {
    Table,
    Id,
    FromUser,
    ToUser,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Owner,
    Peer,
    LastContactAt,
}
