//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the schema
//! always matches the entity definitions, foreign keys and cascades included.

use crate::entities::{Contract, Message, Payment, Property, PropertyImage, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Default database used when neither the settings file nor `DATABASE_URL` name one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/rentdesk.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    if let Some(dir) = sqlite_parent_dir(database_url) {
        tokio::fs::create_dir_all(dir).await?;
    }
    Database::connect(database_url).await.map_err(Into::into)
}

/// Directory holding the database file of a `sqlite://` URL, if any.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(':') {
        return None;
    }
    Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so that foreign keys resolve in
/// backends that check them eagerly.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Property),
        schema.create_table_from_entity(PropertyImage),
        schema.create_table_from_entity(Contract),
        schema.create_table_from_entity(Payment),
        schema.create_table_from_entity(Message),
    ];

    for mut statement in statements {
        statement.if_not_exists();
        db.execute(builder.build(&statement)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}
