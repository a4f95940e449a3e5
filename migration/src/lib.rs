pub use sea_orm_migration::prelude::*;

mod m20260101_000000_create_schema;
mod m20260101_000001_create_chat_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000000_create_schema::Migration),
            Box::new(m20260101_000001_create_chat_tables::Migration),
        ]
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::{Migrator, MigratorTrait};
    use sea_orm_migration::sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

    /// Connects to a fresh in-memory SQLite database and applies every migration.
    /// The pool holds a single connection since each one would see its own database.
    pub async fn memory_database() -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await?;
        Migrator::up(&db, None).await?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn migrations_apply_and_roll_back_on_sqlite() -> Result<(), DbErr> {
        let db = testing::memory_database().await?;

        let backend = db.get_database_backend();
        let tables = db
            .query_all(Statement::from_string(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            ))
            .await?
            .iter()
            .map(|row| row.try_get::<String>("", "name"))
            .collect::<Result<Vec<_>, _>>()?;

        for table in ["chats", "contacts", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        Migrator::down(&db, None).await?;
        Ok(())
    }
}
