//! Database configuration module.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Creation is idempotent (`IF NOT EXISTS`), which lets the service
//! call [`create_tables`] on every start.

use crate::config::SeedConfig;
use crate::entities::{
    AdminSession, AdminUser, Chain, Event, Feedback, Notice, Payout, Price, PriceLog, Product,
    ProductOption, SearchLog, Staff, admin_user, chain, price,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
    prelude::*,
};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/price_king.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables plus the unique (product, chain) index on price snapshots.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Chain).await?;
    create_table(db, &schema, Price).await?;
    create_table(db, &schema, PriceLog).await?;
    create_table(db, &schema, Staff).await?;
    create_table(db, &schema, SearchLog).await?;
    create_table(db, &schema, AdminUser).await?;
    create_table(db, &schema, AdminSession).await?;
    create_table(db, &schema, ProductOption).await?;
    create_table(db, &schema, Payout).await?;
    create_table(db, &schema, Event).await?;
    create_table(db, &schema, Notice).await?;
    create_table(db, &schema, Feedback).await?;

    let snapshot_index = Index::create()
        .name("idx_prices_product_chain")
        .table(Price)
        .col(price::Column::ProductId)
        .col(price::Column::ChainId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&snapshot_index)).await?;

    Ok(())
}

/// Inserts the bootstrap admin account and seed chains when their tables are empty.
pub async fn seed_defaults(db: &DatabaseConnection, seed: &SeedConfig) -> Result<()> {
    if AdminUser::find().count(db).await? == 0 {
        admin_user::ActiveModel {
            username: Set(seed.admin_username.clone()),
            password: Set(seed.admin_password.clone()),
            audit_code: Set(seed.audit_code.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        tracing::info!(username = %seed.admin_username, "Created bootstrap admin account");
    }

    if Chain::find().count(db).await? == 0 {
        for name in &seed.chains {
            chain::ActiveModel {
                name: Set(name.clone()),
                logo_url: Set(None),
                is_active: Set(true),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        tracing::info!(count = seed.chains.len(), "Seeded chains");
    }

    Ok(())
}
