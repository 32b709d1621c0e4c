use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{DatabaseConfig, DatabaseKind};
use crate::entity::{event, event_attendance, group, group_membership, image, user, venue};
use crate::store::{InMemoryStore, SeaOrmStore, Store};

/// Build the entity store selected by `database.type`
pub async fn init_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DbErr> {
    match config.kind {
        DatabaseKind::Memory => {
            info!("Using in-memory entity store, data is not persisted");
            Ok(Arc::new(InMemoryStore::new()))
        }
        DatabaseKind::Postgres => {
            let db = init_database(config).await?;
            Ok(Arc::new(SeaOrmStore::new(db)))
        }
    }
}

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .set_schema_search_path("public");

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create missing tables and uniqueness indexes
async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(group::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(group_membership::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(venue::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(event::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(event_attendance::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(image::Entity)).await?;

    // One row per (user, group) and per (user, event), even under concurrent requests
    for stmt in unique_pair_indexes() {
        create_index_if_not_exists(db, backend, stmt).await?;
    }

    info!("Auto-migration completed successfully");
    Ok(())
}

fn unique_pair_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("uq_group_membership_user_group")
            .table(group_membership::Entity)
            .col(group_membership::Column::UserId)
            .col(group_membership::Column::GroupId)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_event_attendance_user_event")
            .table(event_attendance::Entity)
            .col(event_attendance::Column::UserId)
            .col(event_attendance::Column::EventId)
            .unique()
            .to_owned(),
    ]
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: IndexCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
