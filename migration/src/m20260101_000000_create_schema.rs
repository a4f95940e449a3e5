use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Only Postgres gets a dedicated schema; the connection's search_path points at it.
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS krowka;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO krowka, public;")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS krowka CASCADE;")
            .await?;

        Ok(())
    }
}
